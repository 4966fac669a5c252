use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::tempdir;

#[test]
fn test_config_path_command() {
    let dir = tempdir().unwrap();

    cargo_bin_cmd!("saucier")
        .env("SAUCIER_HOME", dir.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_init_creates_file() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("config.toml");

    assert!(!config_path.exists());

    cargo_bin_cmd!("saucier")
        .env("SAUCIER_HOME", dir.path())
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created config at"));

    let contents = fs::read_to_string(&config_path).unwrap();
    assert!(contents.contains("[cloudkit]"));
    assert!(contents.contains("environment = \"development\""));
    assert!(contents.contains("# api_token ="));
}

#[test]
fn test_config_init_fails_if_exists() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("config.toml");

    fs::write(&config_path, "# existing config").unwrap();

    cargo_bin_cmd!("saucier")
        .env("SAUCIER_HOME", dir.path())
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_help_lists_commands() {
    cargo_bin_cmd!("saucier")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("recipes"))
        .stdout(predicate::str::contains("open"))
        .stdout(predicate::str::contains("login"));
}

#[test]
fn test_missing_api_token_is_reported() {
    let dir = tempdir().unwrap();

    cargo_bin_cmd!("saucier")
        .env("SAUCIER_HOME", dir.path())
        .env_remove("SAUCIER_CLOUDKIT_API_TOKEN")
        .env("SAUCIER_CONTAINER_IDENTIFIER", "iCloud.test")
        .arg("recipes")
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "cloudkit.api_token or SAUCIER_CLOUDKIT_API_TOKEN is required",
        ));
}
