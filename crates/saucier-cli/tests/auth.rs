//! Integration tests for `saucier login`, `logout` and `status`.


use std::fs;

use fixtures::{DB, can_bind_localhost, saucier, temp_home};
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_status_and_logout() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_home();
    let server = MockServer::start().await;
    let session_path = home.path().join("session.json");

    saucier(&home, &server)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Not signed in."));

    fs::write(&session_path, r#"{"ckWebAuthToken": "0123456789abcdefXYZ"}"#).unwrap();

    saucier(&home, &server)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Signed in (token 0123...fXYZ)"));

    saucier(&home, &server)
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Signed out."));
    assert!(!session_path.exists());

    saucier(&home, &server)
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Not signed in."));
}

#[tokio::test]
async fn test_login_saves_token_from_pasted_redirect() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_home();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{DB}/private/users/current")))
        .and(query_param("ckAPIToken", "api-key"))
        .respond_with(ResponseTemplate::new(421).set_body_json(json!({
            "serverErrorCode": "AUTHENTICATION_REQUIRED",
            "redirectURL": "https://signin.test/auth?oauth=1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    saucier(&home, &server)
        .arg("login")
        .write_stdin("https://www.saucier-app.com/?ckWebAuthToken=fresh-token&ckSession=abc\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("https://signin.test/auth?oauth=1"))
        .stdout(predicate::str::contains("Signed in."));

    let stored = fs::read_to_string(home.path().join("session.json")).unwrap();
    assert!(stored.contains("fresh-token"), "{stored}");
}

#[tokio::test]
async fn test_login_rejects_url_without_token() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_home();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{DB}/private/users/current")))
        .respond_with(ResponseTemplate::new(421).set_body_json(json!({
            "redirectURL": "https://signin.test/auth"
        })))
        .mount(&server)
        .await;

    saucier(&home, &server)
        .arg("login")
        .write_stdin("https://www.saucier-app.com/\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("has no ckWebAuthToken parameter"));
    assert!(!home.path().join("session.json").exists());
}
