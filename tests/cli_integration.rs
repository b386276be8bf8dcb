//! CLI Integration Tests
//!
//! End-to-end tests for CLI commands using assert_cmd.

mod common;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use wiremock::MockServer;

/// Get the wildguard binary for testing
fn wildguard_cmd() -> Command {
    let mut cmd = Command::cargo_bin("wildguard").unwrap();
    for var in [
        "WILDGUARD_BACKEND_URL",
        "WILDGUARD_LOG_LEVEL",
        "WILDGUARD_LOG_FORMAT",
        "WILDGUARD_REFRESH_INTERVAL",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn test_version_output() {
    wildguard_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("wildguard"));
}

#[test]
fn test_help_shows_all_commands() {
    wildguard_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("watch"))
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("record"))
        .stdout(predicate::str::contains("analyze"))
        .stdout(predicate::str::contains("config"))
        .stdout(predicate::str::contains("completions"));
}

#[test]
fn test_analyze_help() {
    wildguard_cmd()
        .args(["analyze", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--json"))
        .stdout(predicate::str::contains("--backend-url"));
}

#[test]
fn test_config_init_creates_file() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("wildguard.toml");

    wildguard_cmd()
        .args(["config", "init", "-o", config_path.to_str().unwrap()])
        .assert()
        .success();

    let content = std::fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("[backend]"));
}

#[test]
fn test_config_init_no_overwrite() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("wildguard.toml");
    std::fs::write(&config_path, "existing content").unwrap();

    wildguard_cmd()
        .args(["config", "init", "-o", config_path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("exists"));
}

#[test]
fn test_invalid_command() {
    wildguard_cmd()
        .arg("invalid-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_completions_bash() {
    wildguard_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("complete"));
}

#[test]
fn test_analyze_unsupported_file_fails_fast() {
    let temp_dir = TempDir::new().unwrap();
    let notes = temp_dir.path().join("notes.txt");
    std::fs::write(&notes, "not audio").unwrap();

    wildguard_cmd()
        .args(["analyze", notes.to_str().unwrap()])
        .args(["-b", "http://127.0.0.1:1"])
        .current_dir(temp_dir.path())
        .timeout(std::time::Duration::from_secs(10))
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported audio format"));
}

#[test]
fn test_invalid_backend_url_rejected() {
    let temp_dir = TempDir::new().unwrap();
    wildguard_cmd()
        .args(["status", "-b", "ftp://example.org"])
        .current_dir(temp_dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("backend.url"));
}

#[test]
fn test_status_unreachable_service_fails() {
    let temp_dir = TempDir::new().unwrap();
    wildguard_cmd()
        .args(["status", "-b", "http://127.0.0.1:1"])
        .current_dir(temp_dir.path())
        .timeout(std::time::Duration::from_secs(30))
        .assert()
        .failure()
        .stderr(predicate::str::contains("unavailable"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_status_json_against_mock_service() {
    let server = MockServer::start().await;
    common::mount_snapshot_endpoints(&server).await;
    let uri = server.uri();

    let output = tokio::task::spawn_blocking(move || {
        let temp_dir = TempDir::new().unwrap();
        wildguard_cmd()
            .args(["status", "--json", "-b", &uri])
            .current_dir(temp_dir.path())
            .timeout(std::time::Duration::from_secs(30))
            .output()
            .unwrap()
    })
    .await
    .unwrap();

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["stats"]["total_detections"], 12);
    assert_eq!(json["recent_detections"][0]["id"], 7);
    assert_eq!(json["animal_counts"][1]["name"], "Crow");
    assert_eq!(json["is_recording"], false);
}
