//! Integration tests for `saucier recipes`.


use fixtures::{can_bind_localhost, mount_recipes, recipe, saucier, temp_home};
use predicates::prelude::*;
use wiremock::MockServer;

#[tokio::test]
async fn test_lists_public_recipes_when_signed_out() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_home();
    let server = MockServer::start().await;
    mount_recipes(
        &server,
        "public",
        vec![recipe("r1", "Tomato soup"), recipe("r2", "Flatbread")],
        None,
    )
    .await;

    saucier(&home, &server)
        .arg("recipes")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("[Public Recipes]"))
        .stdout(predicate::str::contains("My Recipes").not())
        .stdout(predicate::str::contains("1. Tomato soup  (r1)"))
        .stdout(predicate::str::contains("2. Flatbread  (r2)"))
        .stdout(predicate::str::contains("Showing 1 to 2 of 2 results"));
}

#[tokio::test]
async fn test_search_and_page() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_home();
    let server = MockServer::start().await;
    let records = (0..100)
        .map(|i| {
            let name = if i % 4 == 0 {
                format!("Lemon bar {i}")
            } else {
                format!("Curry {i}")
            };
            recipe(&format!("r{i:03}"), &name)
        })
        .collect();
    mount_recipes(&server, "public", records, None).await;

    saucier(&home, &server)
        .args(["recipes", "--search", "lemon", "--page", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Search: lemon"))
        .stdout(predicate::str::contains("Showing 21 to 25 of 25 results"))
        .stdout(predicate::str::contains("Pages: 1 [2]"))
        .stdout(predicate::str::contains("Curry").not());
}

#[tokio::test]
async fn test_out_of_range_page_falls_back() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_home();
    let server = MockServer::start().await;
    mount_recipes(&server, "public", vec![recipe("r1", "Soup")], None).await;

    saucier(&home, &server)
        .args(["recipes", "--page", "9"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Page 9 is out of range"))
        .stdout(predicate::str::contains("1. Soup"));
}

#[tokio::test]
async fn test_private_partition_requires_sign_in() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_home();
    let server = MockServer::start().await;
    mount_recipes(&server, "public", vec![], None).await;

    saucier(&home, &server)
        .args(["recipes", "--database", "private"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Sign in to see your recipes"));
}

#[tokio::test]
async fn test_signed_in_defaults_to_private_and_rotates_token() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_home();
    std::fs::write(
        home.path().join("session.json"),
        r#"{"ckWebAuthToken": "stored-token"}"#,
    )
    .unwrap();

    let server = MockServer::start().await;
    mount_recipes(&server, "public", vec![recipe("p1", "Public pie")], Some("rotated")).await;
    mount_recipes(&server, "private", vec![recipe("m1", "Grandma's stew")], Some("rotated")).await;

    saucier(&home, &server)
        .arg("recipes")
        .assert()
        .success()
        .stdout(predicate::str::contains("[My Recipes]  Public Recipes"))
        .stdout(predicate::str::contains("Grandma's stew"))
        .stdout(predicate::str::contains("Public pie").not());

    let stored = std::fs::read_to_string(home.path().join("session.json")).unwrap();
    let stored: serde_json::Value = serde_json::from_str(&stored).unwrap();
    assert_eq!(stored["ckWebAuthToken"], "rotated");
}

#[tokio::test]
async fn test_failed_load_shows_empty_state() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_home();
    let server = MockServer::start().await;
    wiremock::Mock::given(wiremock::matchers::method("POST"))
        .respond_with(wiremock::ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    saucier(&home, &server)
        .arg("recipes")
        .assert()
        .success()
        .stdout(predicate::str::contains("Couldn't load Public Recipes"));
}
