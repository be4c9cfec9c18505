//! Corruption recovery tests for stride.
//!
//! These tests verify the system can handle:
//! - Corrupted plan files
//! - Missing plan with a surviving start date
//! - Partial writes

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

fn cli(data_dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("stride"));
    cmd.env("XDG_CONFIG_HOME", data_dir.join("config"))
        .arg("--data-dir")
        .arg(data_dir);
    cmd
}

fn session_count(data_dir: &Path) -> usize {
    let content = fs::read_to_string(data_dir.join("sessions.json")).unwrap();
    serde_json::from_str::<Value>(&content)
        .unwrap()
        .as_array()
        .unwrap()
        .len()
}

#[test]
fn test_corrupted_sessions_file() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    fs::write(data_dir.join("sessions.json"), "{ invalid json }}}}").unwrap();

    cli(data_dir)
        .arg("plan")
        .assert()
        .success()
        .stdout(predicate::str::contains("No training plan yet"));

    // A new plan overwrites the corrupted file
    cli(data_dir)
        .arg("init")
        .arg("--start")
        .arg("2025-05-05")
        .assert()
        .success();
    assert_eq!(session_count(data_dir), 27);
}

#[test]
fn test_partial_sessions_write() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    // Simulates a non-atomic writer dying mid-save
    fs::write(
        data_dir.join("sessions.json"),
        r#"[{"id":"8f2c7c1e-6d43-4a55-9a7e-6d3f0b0d1a11","week":1,"day":1,"interv"#,
    )
    .unwrap();

    cli(data_dir).arg("plan").assert().success();
}

#[test]
fn test_missing_plan_regenerated_from_start_date() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    fs::write(
        data_dir.join("start_date.json"),
        r#"{"start_date":"2025-05-05"}"#,
    )
    .unwrap();

    cli(data_dir)
        .arg("plan")
        .assert()
        .success()
        .stdout(predicate::str::contains("Week 1"));

    assert_eq!(session_count(data_dir), 27);
}

#[test]
fn test_corrupted_start_date_ignored() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    fs::write(data_dir.join("start_date.json"), "not a date").unwrap();

    cli(data_dir)
        .arg("plan")
        .assert()
        .success()
        .stdout(predicate::str::contains("No training plan yet"));
}

#[test]
fn test_corrupted_config_is_reported() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    let config_dir = data_dir.join("config").join("stride");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(config_dir.join("config.toml"), "[timer\ntick_millis = ").unwrap();

    cli(data_dir).arg("plan").assert().failure();
}

#[test]
fn test_empty_files() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    fs::write(data_dir.join("sessions.json"), "").unwrap();
    fs::write(data_dir.join("start_date.json"), "").unwrap();

    cli(data_dir)
        .arg("plan")
        .assert()
        .success()
        .stdout(predicate::str::contains("No training plan yet"));
}
