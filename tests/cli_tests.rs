//! CLI tests for ntc-reboot
//!
//! This test suite covers:
//! - Validation failures and their exit codes
//! - Ansible-style arguments files (JSON and YAML)
//! - Check mode
//! - Output formats
//! - Config file errors
//!
//! Nothing here reaches a device: every successful run uses check mode.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::{tempdir, Builder, TempDir};

// Helper to get a command for testing
fn ntc_reboot_cmd(workdir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("ntc-reboot").unwrap();
    cmd.current_dir(workdir.path())
        .env("HOME", workdir.path())
        .env("NO_COLOR", "1")
        .env_remove("NTC_REBOOT_PASSWORD")
        .env_remove("NTC_REBOOT_SECRET")
        .env_remove("NTC_REBOOT_CONFIG")
        .env_remove("NTC_REBOOT_TIMEOUT")
        .env_remove("NTC_REBOOT_LOG_LEVEL")
        .env_remove("RUST_LOG");
    cmd
}

fn device_args(platform: &str) -> Vec<String> {
    [
        "--platform",
        platform,
        "--host",
        "192.0.2.10",
        "--username",
        "admin",
        "--password",
        "admin",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn stdout_json(output: &std::process::Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).unwrap()
}

// ============================================================================
// Help and version
// ============================================================================

#[test]
fn test_help() {
    let dir = tempdir().unwrap();
    ntc_reboot_cmd(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--platform"))
        .stdout(predicate::str::contains("--args-file"));
}

#[test]
fn test_version() {
    let dir = tempdir().unwrap();
    ntc_reboot_cmd(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("ntc-reboot"));
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn test_missing_confirm_fails() {
    let dir = tempdir().unwrap();
    let output = ntc_reboot_cmd(&dir)
        .args(device_args("cisco_nxos_nxapi"))
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let result = stdout_json(&output);
    assert_eq!(result["failed"], true);
    assert_eq!(result["changed"], false);
    assert_eq!(
        result["msg"],
        "confirm must be set to true for this module to work."
    );
}

#[test]
fn test_timer_on_eos_fails() {
    let dir = tempdir().unwrap();
    let output = ntc_reboot_cmd(&dir)
        .args(device_args("arista_eos_eapi"))
        .args(["--timer", "5", "--confirm"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(
        stdout_json(&output)["msg"],
        "Timer parameter not supported on platform arista_eos_eapi."
    );
}

#[test]
fn test_missing_arguments_fail() {
    let dir = tempdir().unwrap();
    ntc_reboot_cmd(&dir)
        .args(["--platform", "cisco_ios", "--confirm"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("missing required arguments"));
}

#[test]
fn test_invalid_platform_fails() {
    let dir = tempdir().unwrap();
    ntc_reboot_cmd(&dir)
        .args(device_args("cisco_asa"))
        .arg("--confirm")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("value of platform must be one of"));
}

#[test]
fn test_invalid_flag_is_usage_error() {
    let dir = tempdir().unwrap();
    ntc_reboot_cmd(&dir)
        .args(["--port", "not-a-port"])
        .assert()
        .code(2);
}

// ============================================================================
// Check mode
// ============================================================================

#[test]
fn test_check_mode_succeeds_without_device() {
    let dir = tempdir().unwrap();
    let output = ntc_reboot_cmd(&dir)
        .args(device_args("cisco_ios"))
        .args(["--timer", "10", "--confirm", "--check"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let result = stdout_json(&output);
    assert_eq!(result["changed"], true);
    assert_eq!(result["rebooted"], false);
}

#[test]
fn test_human_output() {
    let dir = tempdir().unwrap();
    ntc_reboot_cmd(&dir)
        .args(device_args("cisco_nxos_nxapi"))
        .args(["--confirm", "--check", "--output", "human"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("changed: [192.0.2.10]"));
}

// ============================================================================
// Arguments files
// ============================================================================

#[test]
fn test_json_args_file() {
    let dir = tempdir().unwrap();
    let mut file = Builder::new().suffix(".json").tempfile_in(dir.path()).unwrap();
    write!(
        file,
        r#"{{"platform": "arista_eos_eapi", "host": "eos1", "username": "admin",
            "password": "admin", "confirm": true, "transport": "https",
            "_ansible_check_mode": true}}"#
    )
    .unwrap();

    let output = ntc_reboot_cmd(&dir)
        .arg("--args-file")
        .arg(file.path())
        .output()
        .unwrap();

    assert!(output.status.success());
    assert_eq!(stdout_json(&output)["rebooted"], false);
}

#[test]
fn test_yaml_args_file_with_flag_override() {
    let dir = tempdir().unwrap();
    let mut file = Builder::new().suffix(".yml").tempfile_in(dir.path()).unwrap();
    writeln!(
        file,
        "platform: cisco_nxos_nxapi\nhost: nxos1\nusername: admin\npassword: admin\nconfirm: false"
    )
    .unwrap();

    // File alone fails on confirm
    ntc_reboot_cmd(&dir)
        .arg("--args-file")
        .arg(file.path())
        .assert()
        .code(1);

    // Flag overrides the file
    ntc_reboot_cmd(&dir)
        .arg("--args-file")
        .arg(file.path())
        .args(["--confirm", "--check"])
        .assert()
        .success();
}

#[test]
fn test_unknown_parameter_in_args_file() {
    let dir = tempdir().unwrap();
    let mut file = Builder::new().suffix(".json").tempfile_in(dir.path()).unwrap();
    write!(
        file,
        r#"{{"platform": "cisco_ios", "host": "r1", "username": "a", "password": "b",
            "confirm": true, "save_config": true}}"#
    )
    .unwrap();

    ntc_reboot_cmd(&dir)
        .arg("--args-file")
        .arg(file.path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Unsupported parameters: save_config"));
}

#[test]
fn test_missing_args_file_is_usage_error() {
    let dir = tempdir().unwrap();
    ntc_reboot_cmd(&dir)
        .args(["--args-file", "does-not-exist.json"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("Failed to load arguments file"));
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_broken_config_is_usage_error() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("broken.toml");
    std::fs::write(&config, "[defaults\ntimeout = ").unwrap();

    ntc_reboot_cmd(&dir)
        .args(device_args("cisco_ios"))
        .args(["--confirm", "--check", "--config"])
        .arg(&config)
        .assert()
        .code(2)
        .stdout(predicate::str::contains("Failed to parse config file"));
}

#[test]
fn test_project_config_is_picked_up() {
    let dir = tempdir().unwrap();
    std::fs::write(
        dir.path().join("ntc-reboot.toml"),
        "[defaults]\ntimeout = 5\n\n[logging]\nlevel = \"error\"\n",
    )
    .unwrap();

    ntc_reboot_cmd(&dir)
        .args(device_args("cisco_ios"))
        .args(["--confirm", "--check"])
        .assert()
        .success();
}
