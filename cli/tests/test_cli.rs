//! Integration tests for the `strata` binary
//!
//! These tests validate:
//! - Help and version output
//! - Argument conflicts
//! - Error reporting and exit status without a reachable server

use assert_cmd::Command;
use predicates::prelude::*;

fn create_cli_command(home: &tempfile::TempDir) -> Command {
    let mut cmd = Command::cargo_bin("strata").unwrap();
    // Keep config, history and logs out of the real home directory
    cmd.env("HOME", home.path());
    cmd
}

#[test]
fn test_cli_help_command() {
    let home = tempfile::tempdir().unwrap();
    create_cli_command(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Interactive SQL terminal"))
        .stdout(predicate::str::contains("--url"))
        .stdout(predicate::str::contains("--max-results"))
        .stdout(predicate::str::contains("--refresh-interval-ms"));
}

#[test]
fn test_cli_version_flag() {
    let home = tempfile::tempdir().unwrap();
    create_cli_command(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")))
        .stdout(predicate::str::contains("Commit:"));
}

#[test]
fn test_file_and_command_conflict() {
    let home = tempfile::tempdir().unwrap();
    create_cli_command(&home)
        .args(["--file", "queries.sql", "--command", "SELECT 1;"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn test_missing_sql_file_is_reported() {
    let home = tempfile::tempdir().unwrap();
    let missing = home.path().join("missing.sql");
    create_cli_command(&home)
        .arg("--file")
        .arg(&missing)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to read"));
}

#[test]
fn test_invalid_config_is_reported() {
    let home = tempfile::tempdir().unwrap();
    let config = home.path().join("config.toml");
    std::fs::write(&config, "[server\nurl = ").unwrap();

    create_cli_command(&home)
        .arg("--config")
        .arg(&config)
        .args(["--command", "SELECT 1;"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Configuration error"));
}

#[test]
fn test_unreachable_server_fails_command() {
    let home = tempfile::tempdir().unwrap();
    create_cli_command(&home)
        .args(["--url", "http://127.0.0.1:1", "--timeout", "2"])
        .args(["--no-color", "--command", "SELECT 1;"])
        .timeout(std::time::Duration::from_secs(20))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("ERROR"));
}
