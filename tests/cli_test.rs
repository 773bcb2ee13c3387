//! E2E tests for the quotabar binary.
//!
//! Tests the full CLI flow from invocation to output, verifying:
//! - Help and version output
//! - `--sample` and `--once` single-shot modes
//! - JSON line output shape and derived display fields
//! - Flag validation and config precedence via environment variables

use assert_cmd::Command;
use predicates::prelude::*;
use quotabar::test_utils::{TestDir, make_test_snapshot_json};

/// Get the quotabar binary command.
fn quotabar_cmd() -> Command {
    Command::cargo_bin("quotabar").expect("quotabar binary should be built")
}

/// A command with config-related environment cleared so host settings
/// cannot leak into the test.
fn isolated_cmd() -> Command {
    let mut cmd = quotabar_cmd();
    cmd.env_remove("QUOTABAR_SERVICE_COMMAND")
        .env_remove("QUOTABAR_REFRESH_SECONDS")
        .env_remove("QUOTABAR_THEME")
        .env("QUOTABAR_CONFIG", "/nonexistent/quotabar-test-config.toml");
    cmd
}

// =============================================================================
// Basic Invocation
// =============================================================================

#[test]
fn help_displays_options() {
    quotabar_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--service-command"))
        .stdout(predicate::str::contains("--refresh-seconds"))
        .stdout(predicate::str::contains("--theme"))
        .stdout(predicate::str::contains("--once"))
        .stdout(predicate::str::contains("--sample"))
        .stdout(predicate::str::contains("--action"));
}

#[test]
fn version_works() {
    quotabar_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"quotabar \d+\.\d+\.\d+").unwrap());
}

// =============================================================================
// Sample Mode
// =============================================================================

#[test]
fn sample_prints_valid_state_json() {
    let output = isolated_cmd()
        .arg("--sample")
        .output()
        .expect("failed to execute");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let json: serde_json::Value =
        serde_json::from_str(stdout.trim()).expect("output should be valid JSON");

    assert_eq!(
        json.pointer("/selectedProvider").and_then(|v| v.as_str()),
        Some("codex")
    );
    assert_eq!(
        json.pointer("/lastError").and_then(|v| v.as_str()),
        Some("")
    );
    assert_eq!(
        json.pointer("/display/provider").and_then(|v| v.as_str()),
        Some("codex")
    );
    // The sample's primary window is 300 minutes at 28% used.
    assert_eq!(
        json.pointer("/display/primaryLabel").and_then(|v| v.as_str()),
        Some("5h")
    );
    assert_eq!(
        json.pointer("/display/primaryColor").and_then(|v| v.as_str()),
        Some("#81c784")
    );
}

#[test]
fn sample_respects_light_theme() {
    let output = isolated_cmd()
        .arg("--sample")
        .arg("--theme")
        .arg("light")
        .output()
        .expect("failed to execute");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let json: serde_json::Value =
        serde_json::from_str(stdout.trim()).expect("output should be valid JSON");
    assert_eq!(
        json.pointer("/display/primaryColor").and_then(|v| v.as_str()),
        Some("#2e7d32")
    );
}

#[test]
fn invalid_theme_is_rejected() {
    isolated_cmd()
        .arg("--sample")
        .arg("--theme")
        .arg("sepia")
        .assert()
        .failure()
        .stderr(predicate::str::contains("theme"));
}

// =============================================================================
// Once Mode
// =============================================================================

#[test]
fn once_publishes_stub_snapshot() {
    let dir = TestDir::new();
    dir.create_file("snapshot.json", &make_test_snapshot_json(&["claude"]));

    let output = isolated_cmd()
        .arg("--once")
        .arg("--service-command")
        .arg(format!("cat {}", dir.file_path("snapshot.json").display()))
        .output()
        .expect("failed to execute");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let json: serde_json::Value =
        serde_json::from_str(stdout.trim()).expect("output should be valid JSON");
    assert_eq!(
        json.pointer("/selectedProvider").and_then(|v| v.as_str()),
        Some("claude")
    );
    assert_eq!(
        json.pointer("/snapshot/entries/0/provider")
            .and_then(|v| v.as_str()),
        Some("claude")
    );
}

#[test]
fn once_surfaces_stderr_as_last_error() {
    let output = isolated_cmd()
        .arg("--once")
        .arg("--service-command")
        .arg("printf 'boom\\n' >&2")
        .output()
        .expect("failed to execute");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let json: serde_json::Value =
        serde_json::from_str(stdout.trim()).expect("output should be valid JSON");
    assert_eq!(
        json.pointer("/lastError").and_then(|v| v.as_str()),
        Some("boom")
    );
}

#[test]
fn once_honors_env_service_command() {
    let dir = TestDir::new();
    dir.create_file("snapshot.json", &make_test_snapshot_json(&["gemini"]));

    let output = isolated_cmd()
        .arg("--once")
        .env(
            "QUOTABAR_SERVICE_COMMAND",
            format!("cat {}", dir.file_path("snapshot.json").display()),
        )
        .output()
        .expect("failed to execute");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let json: serde_json::Value =
        serde_json::from_str(stdout.trim()).expect("output should be valid JSON");
    assert_eq!(
        json.pointer("/selectedProvider").and_then(|v| v.as_str()),
        Some("gemini")
    );
}

#[test]
fn config_file_supplies_service_command() {
    let dir = TestDir::new();
    dir.create_file("snapshot.json", &make_test_snapshot_json(&["cursor"]));
    dir.create_file(
        "config.toml",
        &format!(
            "service_command = \"cat {}\"\nrefresh_seconds = 45\n",
            dir.file_path("snapshot.json").display()
        ),
    );

    let output = isolated_cmd()
        .arg("--once")
        .env("QUOTABAR_CONFIG", dir.file_path("config.toml"))
        .output()
        .expect("failed to execute");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let json: serde_json::Value =
        serde_json::from_str(stdout.trim()).expect("output should be valid JSON");
    assert_eq!(
        json.pointer("/selectedProvider").and_then(|v| v.as_str()),
        Some("cursor")
    );
}
