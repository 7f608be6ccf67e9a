//! CLI surface tests via assert_cmd.

#![allow(clippy::expect_used)]

use assert_cmd::Command;
use predicates::prelude::*;

fn nodemend() -> Command {
    let mut cmd = Command::cargo_bin("nodemend").expect("binary builds");
    // Keep ambient operator configuration out of the tests. Output is piped,
    // so colors are off without needing NO_COLOR.
    cmd.env_remove("NODEMEND_SERVER");
    cmd.env_remove("NODEMEND_CONFIG");
    cmd.env_remove("NO_COLOR");
    cmd
}

/// Scratch config steering every path into a temp directory, with a binary
/// path that cannot exist — guarantees `check` finds at least one issue.
fn scratch_config(dir: &tempfile::TempDir) -> std::path::PathBuf {
    let path = dir.path().join("config.yaml");
    let yaml = format!(
        "binary_path: {base}/missing/node-agent\n\
         unit_path: {base}/node-agent.service\n\
         token_path: {base}/token\n\
         service_name: nodemend-integration-test.service\n",
        base = dir.path().display()
    );
    std::fs::write(&path, yaml).expect("write scratch config");
    path
}

#[test]
fn test_help_lists_subcommands() {
    nodemend()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("repair"))
        .stdout(predicate::str::contains("check"));
}

#[test]
fn test_version_flag_prints_name() {
    nodemend()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("nodemend"));
}

#[test]
fn test_no_subcommand_shows_help_and_fails() {
    nodemend().assert().failure();
}

#[test]
fn test_unknown_flag_fails() {
    nodemend().args(["repair", "--no-such-flag"]).assert().failure();
}

#[test]
fn test_repair_with_empty_server_fails_noninteractively() {
    // Fails on the privilege check (unprivileged runner) or on the empty
    // address (root runner) — never gets anywhere near a mutation.
    let dir = tempfile::TempDir::new().expect("tempdir");
    let cfg = scratch_config(&dir);
    nodemend()
        .args(["repair", "--yes", "--server", ""])
        .arg("--config")
        .arg(&cfg)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn test_repair_with_explicit_missing_config_fails() {
    nodemend()
        .args(["repair", "--yes", "--server", "10.0.0.5"])
        .args(["--config", "/nonexistent/nodemend-test-config.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot read"));
}

#[test]
fn test_check_json_reports_issues_and_fails() {
    let dir = tempfile::TempDir::new().expect("tempdir");
    let cfg = scratch_config(&dir);
    nodemend()
        .args(["check", "--json"])
        .arg("--config")
        .arg(&cfg)
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"status\": \"unhealthy\""))
        .stdout(predicate::str::contains("\"issues\""));
}

#[test]
fn test_check_human_output_renders_check_lines() {
    let dir = tempfile::TempDir::new().expect("tempdir");
    let cfg = scratch_config(&dir);
    nodemend()
        .arg("check")
        .arg("--config")
        .arg(&cfg)
        .assert()
        .failure()
        .stdout(predicate::str::contains("Node Health Check"))
        .stderr(predicate::str::contains("issue(s) found"));
}

#[test]
fn test_check_json_output_is_parseable() {
    let dir = tempfile::TempDir::new().expect("tempdir");
    let cfg = scratch_config(&dir);
    let output = nodemend()
        .args(["check", "--json"])
        .arg("--config")
        .arg(&cfg)
        .output()
        .expect("binary runs");
    let parsed: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout must be valid JSON");
    assert_eq!(parsed["status"], "unhealthy");
    assert!(!parsed["issues"].as_array().expect("issues array").is_empty());
}
