//! Binary-level tests for `sealbox`.
//!
//! These never reach a server: they cover argument parsing, the config file
//! and the checks that run before any request is made.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn sealbox(config: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("sealbox").unwrap();
    cmd.arg("--config").arg(config).env_remove("SEALBOX_PASSWORD");
    cmd
}

fn init(dir: &TempDir) -> std::path::PathBuf {
    let config = dir.path().join("config.toml");
    sealbox(&config)
        .args([
            "init",
            "--base-url",
            "http://127.0.0.1:9",
            "--entity",
            "me@example.com",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration written."));
    config
}

#[test]
fn help_lists_commands() {
    Command::cargo_bin("sealbox")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("upload"))
        .stdout(predicate::str::contains("download"))
        .stdout(predicate::str::contains("create-container"))
        .stdout(predicate::str::contains("remove-blob"));
}

#[test]
fn init_writes_toml() {
    let dir = TempDir::new().unwrap();
    let config = init(&dir);

    let contents = std::fs::read_to_string(&config).unwrap();
    assert!(contents.contains("base_url = \"http://127.0.0.1:9\""));
    assert!(contents.contains("entity = \"me@example.com\""));
    assert!(!contents.contains("password"));
}

#[test]
fn second_init_needs_force() {
    let dir = TempDir::new().unwrap();
    let config = init(&dir);

    sealbox(&config)
        .args(["init", "--base-url", "http://h", "--entity", "x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));
}

#[test]
fn commands_without_config_point_to_init() {
    let dir = TempDir::new().unwrap();
    sealbox(&dir.path().join("missing.toml"))
        .arg("ping")
        .assert()
        .failure()
        .stderr(predicate::str::contains("sealbox init"));
}

#[test]
fn no_prompt_without_password_fails() {
    let dir = TempDir::new().unwrap();
    let config = init(&dir);

    sealbox(&config)
        .args(["--no-prompt", "ping"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("SEALBOX_PASSWORD"));
}

#[test]
fn remove_container_requires_yes() {
    let dir = TempDir::new().unwrap();
    let config = init(&dir);

    sealbox(&config)
        .env("SEALBOX_PASSWORD", "pw")
        .args(["remove-container", "7"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--yes"));
}

#[test]
fn resolve_needs_exactly_one_key() {
    let dir = TempDir::new().unwrap();
    let config = init(&dir);

    sealbox(&config).arg("resolve").assert().failure();
    sealbox(&config)
        .args(["resolve", "--friendly-id", "SFT-1", "--name", "inbox"])
        .assert()
        .failure();
}

#[test]
fn list_rejects_unknown_state() {
    let dir = TempDir::new().unwrap();
    let config = init(&dir);

    sealbox(&config)
        .args(["list", "7", "--state", "shredded"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("shredded"));
}
