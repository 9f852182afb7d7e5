//! Smoke tests for the headless-harness CLI

#![allow(deprecated)] // Command::cargo_bin
#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn headless_harness() -> Command {
    Command::cargo_bin("headless-harness").expect("headless-harness binary should exist")
}

const DUMP: &str = r#"{"/src/app.js": {
    "path": "/src/app.js",
    "s": {"1": 3},
    "b": {},
    "f": {},
    "fnMap": {},
    "statementMap": {"1": {"start": {"line": 1, "column": 0}, "end": {"line": 1, "column": 5}}},
    "branchMap": {}
}}"#;

fn write_config(dir: &TempDir, body: &str) -> std::path::PathBuf {
    let path = dir.path().join("run.yaml");
    fs::write(&path, body).unwrap();
    path
}

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_version_flag() {
    headless_harness()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("0.3.0"));
}

#[test]
fn test_help_lists_subcommands() {
    headless_harness()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("plan"))
        .stdout(predicate::str::contains("report"))
        .stdout(predicate::str::contains("clean"));
}

#[test]
fn test_no_args_fails() {
    headless_harness().assert().failure();
}

// ============================================================================
// plan
// ============================================================================

#[test]
fn test_plan_prints_script_order() {
    let dir = TempDir::new().unwrap();
    let config = write_config(
        &dir,
        "buildDir: build\nappSource:\n  prefix: ['var lib = {};']\n  app:\n    main: 'main();'\ntestFiles: [test/a.js]\n",
    );

    headless_harness()
        .args(["plan", config.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("1. prefix[0]"))
        .stdout(predicate::str::contains("2. app:main"))
        .stdout(predicate::str::contains(".temp.aff"));
}

#[test]
fn test_plan_missing_config_fails() {
    headless_harness()
        .args(["plan", "/nonexistent/run.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::starts_with("Error: "));
}

// ============================================================================
// report
// ============================================================================

#[test]
fn test_report_writes_lcov_and_done_message() {
    let dir = TempDir::new().unwrap();
    let config = write_config(
        &dir,
        "buildDir: build\ncodeCoverage:\n  active: true\n  reportType: [lcovonly]\ndoneMessage:\n  lcovonly: LCOV done\n",
    );
    let dump = dir.path().join("coverage.json");
    fs::write(&dump, DUMP).unwrap();

    headless_harness()
        .args(["report", config.to_str().unwrap(), dump.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("LCOV done"));

    let lcov = fs::read_to_string(dir.path().join("build").join("lcov.info")).unwrap();
    assert!(lcov.contains("DA:1,3"));
}

#[test]
fn test_report_unknown_format_fails() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, "buildDir: build\n");
    let dump = dir.path().join("coverage.json");
    fs::write(&dump, DUMP).unwrap();

    headless_harness()
        .args([
            "report",
            config.to_str().unwrap(),
            dump.to_str().unwrap(),
            "--format",
            "pdf",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("pdf"));
}

// ============================================================================
// clean
// ============================================================================

#[test]
fn test_clean_reports_count() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, "buildDir: build\ntestFiles: [test/a.js]\n");

    headless_harness()
        .args(["clean", config.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 0 of 1"));
}
