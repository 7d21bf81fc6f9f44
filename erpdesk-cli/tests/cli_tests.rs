//! Integration tests for the erpdesk binary.

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::PredicateBooleanExt;
use tempfile::TempDir;

#[test]
fn test_help_lists_commands() {
    let mut cmd = cargo_bin_cmd!("erpdesk");
    cmd.arg("--help");

    cmd.assert()
        .success()
        .stdout(predicates::str::contains("login"))
        .stdout(predicates::str::contains("orders"))
        .stdout(predicates::str::contains("stock"))
        .stdout(predicates::str::contains("--base-url"));
}

#[test]
fn test_orders_create_help() {
    let mut cmd = cargo_bin_cmd!("erpdesk");
    cmd.args(["orders", "create", "--help"]);

    cmd.assert()
        .success()
        .stdout(predicates::str::contains("--product"))
        .stdout(predicates::str::contains("--manual"))
        .stdout(predicates::str::contains("--no-delivery"));
}

#[test]
fn test_orders_create_requires_delivery_mode() {
    let mut cmd = cargo_bin_cmd!("erpdesk");
    cmd.args([
        "orders",
        "create",
        "--product",
        "p-1:2",
        "--date",
        "2026-10-21",
    ]);

    cmd.assert().failure().stderr(predicates::str::contains(
        "the following required arguments were not provided",
    ));
}

#[test]
fn test_orders_create_rejects_both_delivery_flags() {
    let mut cmd = cargo_bin_cmd!("erpdesk");
    cmd.args([
        "orders",
        "create",
        "--product",
        "p-1:2",
        "--date",
        "2026-10-21",
        "--delivery",
        "--no-delivery",
    ]);

    cmd.assert()
        .failure()
        .stderr(predicates::str::contains("cannot be used with"));
}

#[test]
fn test_orders_create_rejects_malformed_product() {
    let mut cmd = cargo_bin_cmd!("erpdesk");
    cmd.args([
        "orders",
        "create",
        "--product",
        "p-1",
        "--date",
        "2026-10-21",
        "--delivery",
    ]);

    cmd.assert()
        .failure()
        .stderr(predicates::str::contains("invalid value"))
        .stderr(predicates::str::contains("ID:QTY"));
}

#[test]
fn test_orders_create_rejects_bad_date() {
    let mut cmd = cargo_bin_cmd!("erpdesk");
    cmd.args([
        "orders",
        "create",
        "--product",
        "p-1:2",
        "--date",
        "21.10.2026",
        "--delivery",
    ]);

    cmd.assert()
        .failure()
        .stderr(predicates::str::contains("invalid value"));
}

#[test]
fn test_completion_generates_script() {
    let mut cmd = cargo_bin_cmd!("erpdesk");
    cmd.args(["completion", "--shell", "bash"]);

    cmd.assert()
        .success()
        .stdout(predicates::str::contains("erpdesk"));
}

#[test]
fn test_config_generates_yaml() {
    let dir = TempDir::new().unwrap();
    let mut cmd = cargo_bin_cmd!("erpdesk");
    cmd.current_dir(dir.path()).arg("config");

    cmd.assert()
        .success()
        .stdout(predicates::str::contains("config.yaml"));

    let written = std::fs::read_to_string(dir.path().join("config.yaml")).unwrap();
    assert!(written.contains("base_url"));
}

#[test]
fn test_config_rejects_unknown_format() {
    let dir = TempDir::new().unwrap();
    let mut cmd = cargo_bin_cmd!("erpdesk");
    cmd.current_dir(dir.path()).args(["config", "--format", "toml"]);

    cmd.assert()
        .failure()
        .stderr(predicates::str::contains("Unsupported format"));
}

#[test]
fn test_whoami_without_session() {
    let dir = TempDir::new().unwrap();
    let session = dir.path().join("session.json");
    let mut cmd = cargo_bin_cmd!("erpdesk");
    cmd.env("ERPDESK_SESSION_PATH", &session).arg("whoami");

    cmd.assert()
        .success()
        .stdout(predicates::str::contains("Not logged in"));
    assert!(!session.exists());
}

#[test]
fn test_orders_list_without_session_fails_cleanly() {
    let dir = TempDir::new().unwrap();
    let mut cmd = cargo_bin_cmd!("erpdesk");
    cmd.env("ERPDESK_SESSION_PATH", dir.path().join("session.json"))
        .args(["--base-url", "http://127.0.0.1:9/crm/api/"])
        .args(["orders", "list"])
        .timeout(std::time::Duration::from_secs(10));

    cmd.assert().failure().stderr(
        predicates::str::contains("no location id")
            .or(predicates::str::contains("Pass a location id")),
    );
}
