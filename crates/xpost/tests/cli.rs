//! Binary-level behavior: exit codes and the stderr error document.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

/// `xpost` with an empty environment and a private home, so no real
/// credentials or token files can leak in.
fn xpost(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("xpost").unwrap();
    cmd.env_clear()
        .env("HOME", home.path())
        .env("XPOST_HOME", home.path())
        .env("XPOST_OPENCLAW_CONFIG", home.path().join("openclaw.json"))
        .env("XPOST_API_URL", "http://127.0.0.1:9")
        .env("RUST_LOG", "error");
    cmd
}

fn error_document(stderr: &[u8]) -> Value {
    let text = String::from_utf8_lossy(stderr);
    let line = text
        .lines()
        .rev()
        .find(|l| l.starts_with('{'))
        .expect("no JSON error on stderr");
    serde_json::from_str(line).unwrap()
}

#[test]
fn test_help_lists_commands() {
    let home = TempDir::new().unwrap();
    xpost(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("thread-chain"))
        .stdout(predicate::str::contains("stream-rules-add"));
}

#[test]
fn test_overlong_tweet_exits_with_validation_code() {
    let home = TempDir::new().unwrap();
    let output = xpost(&home).arg("tweet").arg("a".repeat(281)).assert().code(2).get_output().clone();

    assert!(output.stdout.is_empty());
    let doc = error_document(&output.stderr);
    assert_eq!(doc["error"]["kind"], "validation");
}

#[test]
fn test_zero_count_is_rejected() {
    let home = TempDir::new().unwrap();
    xpost(&home).args(["search", "rust", "-n", "0"]).assert().code(2);
}

#[test]
fn test_missing_credentials_exit_with_auth_code() {
    let home = TempDir::new().unwrap();
    let output = xpost(&home).arg("me").assert().code(3).get_output().clone();

    let doc = error_document(&output.stderr);
    assert_eq!(doc["error"]["kind"], "auth_unavailable");
    assert!(doc["error"]["hint"].as_str().unwrap().contains("X_CONSUMER_KEY"));
}

#[test]
fn test_bookmarks_without_token_point_at_auth() {
    let home = TempDir::new().unwrap();
    let output = xpost(&home).arg("bookmarks").assert().code(3).get_output().clone();

    let doc = error_document(&output.stderr);
    assert!(doc["error"]["hint"].as_str().unwrap().contains("xpost auth"));
}

#[test]
fn test_dotenv_credentials_are_picked_up() {
    let home = TempDir::new().unwrap();
    std::fs::write(home.path().join(".env"), "X_BEARER_TOKEN=from-dotenv\n").unwrap();

    // Credentials resolve, so the failure is the unreachable API rather
    // than missing auth.
    let output = xpost(&home)
        .env("XPOST_MAX_ATTEMPTS", "1")
        .args(["space", "1"])
        .assert()
        .code(8)
        .get_output()
        .clone();
    let doc = error_document(&output.stderr);
    assert_eq!(doc["error"]["kind"], "transient");
}
