//! Integration tests for the `ctlsnap` binary.
//!
//! These tests run the CLI via `assert_cmd`. Nothing here assumes sound
//! hardware: device-dependent commands are checked for their failure paths
//! or only for exit status.

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

fn cli() -> assert_cmd::Command {
    cargo_bin_cmd!("ctlsnap")
}

#[test]
fn cli_help_succeeds() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("ctlsnap"));
}

#[test]
fn cli_version_prints_version() {
    cli()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn cli_config_json_produces_valid_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");

    let output = cli()
        .arg("--config")
        .arg(&path)
        .args(["--json", "config"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json: serde_json::Value =
        serde_json::from_slice(&output).expect("config --json should produce valid JSON");
    assert!(json["settings"].is_object());
    assert_eq!(json["settings"]["device"], "default");
    assert_eq!(json["config_file_exists"], false);
}

#[test]
fn cli_config_save_then_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");

    cli()
        .arg("--config")
        .arg(&path)
        .args(["config", "--save"])
        .assert()
        .success();
    assert!(path.exists());

    cli()
        .arg("--config")
        .arg(&path)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("(loaded)"));
}

// ── --verbose flag ──

#[test]
fn cli_verbose_flag_accepted() {
    let dir = tempfile::tempdir().unwrap();
    cli()
        .arg("--config")
        .arg(dir.path().join("config.toml"))
        .args(["-v", "config"])
        .assert()
        .success();
}

// ── list ──

#[test]
fn cli_list_empty_device_fails() {
    cli()
        .args(["list", ""])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid argument"));
}

#[test]
fn cli_list_missing_device_fails_to_open() {
    cli()
        .args(["list", "ctlsnap_no_such_device"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot open device"));
}

#[test]
fn cli_list_json_missing_device_fails_to_open() {
    cli()
        .args(["--json", "list", "ctlsnap_no_such_device"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot open device"));
}

#[test]
fn cli_list_all_conflicts_with_device() {
    cli().args(["list", "--all", "hw:0"]).assert().failure();
}

#[test]
fn cli_list_all_json_is_object() {
    let output = cli()
        .args(["--json", "list", "--all"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert!(json.is_object());
}

// ── cards ──

#[test]
fn cli_cards_succeeds() {
    cli().arg("cards").assert().success();
}

#[test]
fn cli_cards_json_has_count() {
    let output = cli()
        .args(["--json", "cards"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(
        json["count"].as_u64().unwrap() as usize,
        json["cards"].as_array().unwrap().len()
    );
}
