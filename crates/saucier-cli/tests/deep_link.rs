//! Integration tests for `saucier open` and `saucier show`.


use fixtures::{
    can_bind_localhost, mount_lookup, mount_query, mount_recipes, recipe, saucier, temp_home,
};
use predicates::prelude::*;
use serde_json::json;
use wiremock::MockServer;

#[tokio::test]
async fn test_missing_deep_link_is_removed_from_location() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_home();
    let server = MockServer::start().await;
    mount_recipes(&server, "public", vec![], None).await;
    mount_lookup(
        &server,
        "public",
        json!({ "records": [{ "recordName": "abc123", "serverErrorCode": "NOT_FOUND" }] }),
    )
    .await;

    saucier(&home, &server)
        .args([
            "open",
            "https://www.saucier-app.com/?recipeId=abc123&database=public&lang=en",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("No recipe open."))
        .stdout(predicate::str::contains(
            "Location: https://www.saucier-app.com/?lang=en",
        ));
}

#[tokio::test]
async fn test_show_prints_ingredients_and_ordered_steps() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_home();
    let server = MockServer::start().await;
    mount_recipes(&server, "public", vec![], None).await;
    mount_lookup(&server, "public", json!({ "records": [recipe("r1", "Pancakes")] })).await;
    mount_query(
        &server,
        "public",
        "CD_Ingredient",
        vec![json!({ "recordName": "i1", "fields": { "CD_unparsedString": { "value": "2 eggs" } } })],
        None,
    )
    .await;
    mount_query(
        &server,
        "public",
        "CD_Instruction",
        vec![
            json!({ "recordName": "s2", "fields": { "CD_instruction": { "value": "Flip" }, "CD_index": { "value": 2 } } }),
            json!({ "recordName": "s0", "fields": { "CD_instruction": { "value": "Whisk" }, "CD_index": { "value": 0 } } }),
            json!({ "recordName": "s1", "fields": { "CD_instruction": { "value": "Pour" }, "CD_index": { "value": 1 } } }),
        ],
        None,
    )
    .await;
    mount_query(&server, "public", "CD_RecipeImage", vec![], None).await;

    saucier(&home, &server)
        .args(["show", "r1"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Pancakes"))
        .stdout(predicate::str::contains("  - 2 eggs"))
        .stdout(predicate::str::contains("  1. Whisk\n  2. Pour\n  3. Flip"));
}

#[tokio::test]
async fn test_show_missing_recipe_fails() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_home();
    let server = MockServer::start().await;
    mount_recipes(&server, "public", vec![], None).await;
    mount_lookup(&server, "public", json!({ "records": [] })).await;

    saucier(&home, &server)
        .args(["show", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Recipe nope not found in Public Recipes"));
}

#[tokio::test]
async fn test_sign_in_redirect_is_consumed_and_stripped() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_home();
    let server = MockServer::start().await;
    mount_recipes(&server, "public", vec![], Some("t2")).await;
    mount_recipes(&server, "private", vec![], Some("t2")).await;

    saucier(&home, &server)
        .args([
            "open",
            "https://www.saucier-app.com/?ckWebAuthToken=t1&ckSession=s",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Location: https://www.saucier-app.com/\n"))
        .stdout(predicate::str::contains("ckWebAuthToken").not());

    let stored = std::fs::read_to_string(home.path().join("session.json")).unwrap();
    assert!(stored.contains("\"t2\""), "{stored}");
}
