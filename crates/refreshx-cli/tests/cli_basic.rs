//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own data directory.

use std::path::Path;
use std::process::Command;

/// Run a CLI command and return (code, stdout, stderr).
fn run_cli(data_dir: &Path, args: &[&str]) -> (i32, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_refreshx"))
        .env("REFRESHX_DATA_DIR", data_dir)
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (code, stdout, stderr)
}

fn parse_json(stdout: &str) -> serde_json::Value {
    serde_json::from_str(stdout).unwrap_or_else(|e| panic!("invalid JSON ({e}): {stdout}"))
}

#[test]
fn test_config_set_and_get() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli(dir.path(), &["config", "set", "work.breaks", "3"]);
    assert_eq!(code, 0, "config set failed: {stderr}");

    let (code, stdout, _) = run_cli(dir.path(), &["config", "get", "work.breaks"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "3");
    assert!(dir.path().join("config.toml").exists());
}

#[test]
fn test_config_rejects_invalid_value() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli(dir.path(), &["config", "set", "work.break_duration_min", "1"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));

    let (_, stdout, _) = run_cli(dir.path(), &["config", "get", "work.break_duration_min"]);
    assert_eq!(stdout.trim(), "15");
}

#[test]
fn test_config_unknown_key() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli(dir.path(), &["config", "get", "theme"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("unknown key"));
}

#[test]
fn test_config_list() {
    let dir = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(dir.path(), &["config", "list"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("[work]"));
    assert!(stdout.contains("start = \"09:00\""));
    assert!(stdout.contains("week_start = \"monday\""));
}

#[test]
fn test_schedule_today_is_json() {
    let dir = tempfile::tempdir().unwrap();
    let (code, stdout, stderr) = run_cli(dir.path(), &["schedule", "today"]);
    assert_eq!(code, 0, "schedule failed: {stderr}");
    assert!(parse_json(&stdout).is_array());
}

#[test]
fn test_catalog_filters_by_area() {
    let dir = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(dir.path(), &["catalog", "exercises", "--area", "eye", "--sort", "az"]);
    assert_eq!(code, 0);
    let list = parse_json(&stdout);
    let titles: Vec<&str> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["20-20-20 Rule", "Eye Rotations"]);
}

#[test]
fn test_catalog_rejects_unknown_area() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, _) = run_cli(dir.path(), &["catalog", "exercises", "--area", "knee"]);
    assert_ne!(code, 0);
}

#[test]
fn test_exercise_log_starts_streak() {
    let dir = tempfile::tempdir().unwrap();
    let (code, stdout, stderr) = run_cli(
        dir.path(),
        &["exercise", "log", "eye rotations", "--duration", "60"],
    );
    assert_eq!(code, 0, "exercise log failed: {stderr}");
    let logged = parse_json(&stdout);
    assert_eq!(logged["streak"], 1);
    assert_eq!(logged["session"]["exercise_title"], "Eye Rotations");

    // A second process sees the same user and history
    let (code, stdout, _) = run_cli(dir.path(), &["stats", "streak"]);
    assert_eq!(code, 0);
    assert_eq!(parse_json(&stdout)["current"], 1);
}

#[test]
fn test_exercise_log_unknown_title() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli(dir.path(), &["exercise", "log", "Jumping Jacks", "--duration", "30"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("no exercise matches"));
}

#[test]
fn test_skipped_break_keeps_streak_at_zero() {
    let dir = tempfile::tempdir().unwrap();
    let (code, stdout, stderr) = run_cli(dir.path(), &["break", "log", "--skipped"]);
    assert_eq!(code, 0, "break log failed: {stderr}");
    let logged = parse_json(&stdout);
    assert_eq!(logged["events"][0]["type"], "BreakSkipped");
    assert_eq!(logged["completed_breaks"], 0);

    let (_, stdout, _) = run_cli(dir.path(), &["stats", "streak"]);
    assert_eq!(parse_json(&stdout)["current"], 0);
}

#[test]
fn test_inbox_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let (code, stdout, stderr) = run_cli(dir.path(), &["inbox", "list", "--all"]);
    assert_eq!(code, 0, "inbox list failed: {stderr}");
    let inbox = parse_json(&stdout);
    assert_eq!(inbox["pending"].as_array().unwrap().len(), 0);
    assert_eq!(inbox["read"].as_array().unwrap().len(), 0);

    let (code, _, _) = run_cli(dir.path(), &["inbox", "read", "00000000-0000-0000-0000-000000000000"]);
    assert_eq!(code, 1);
}
