use assert_cmd::Command;
use predicates::prelude::*;
use wiremock::MockServer;

#[tokio::test]
async fn missing_api_key_fails_before_any_request() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Command::cargo_bin("quiz")
        .unwrap()
        .current_dir(dir.path())
        .env_remove("API_KEY")
        .args(["--base-url", &server.uri(), "evaluate", "--answer", "warm", "--reference", "temperate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("API_KEY environment variable not set"));

    assert!(server.received_requests().await.unwrap().is_empty());
}

#[test]
fn missing_api_key_fails_with_default_endpoint() {
    let dir = tempfile::tempdir().unwrap();

    Command::cargo_bin("quiz")
        .unwrap()
        .current_dir(dir.path())
        .env_remove("API_KEY")
        .args(["evaluate", "--answer", "warm", "--reference", "temperate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("configuration error: API_KEY environment variable not set"));
}

#[test]
fn unknown_mode_is_rejected_by_the_parser() {
    Command::cargo_bin("quiz")
        .unwrap()
        .args(["generate", "--name", "Ada", "--mode", "essay"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown quiz type"));
}
