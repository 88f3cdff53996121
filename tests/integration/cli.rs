//! Integration tests for the command line binary

use assert_cmd::Command;
use tempfile::TempDir;

fn harvester(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("wordle-harvester").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("BEARER_TOKEN")
        .env_remove("HARVEST_MODE")
        .env_remove("HARVEST_DATA_DIR")
        .env_remove("HARVEST_METRICS_ADDR")
        .env_remove("SEARCH_API_BASE");
    cmd
}

#[test]
fn test_help_lists_flags() {
    let dir = TempDir::new().unwrap();
    let output = harvester(&dir).arg("--help").output().unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--unattended"));
    assert!(stdout.contains("--forward"));
    assert!(stdout.contains("--data-dir"));
}

#[test]
fn test_invalid_edition_is_rejected() {
    let dir = TempDir::new().unwrap();
    harvester(&dir).arg("two-fifty").assert().failure();
    harvester(&dir).assert().failure();
}

#[test]
fn test_missing_token_exits_with_error() {
    let dir = TempDir::new().unwrap();
    harvester(&dir).arg("250").assert().failure().code(1);

    // Nothing is written before the configuration is complete
    assert!(!dir.path().join("data").exists());
}

#[test]
fn test_invalid_mode_exits_with_error() {
    let dir = TempDir::new().unwrap();
    harvester(&dir)
        .arg("250")
        .env("BEARER_TOKEN", "token")
        .env("HARVEST_MODE", "sometimes")
        .assert()
        .failure()
        .code(1);
}
