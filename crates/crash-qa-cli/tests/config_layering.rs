//! Integration tests for configuration layering.
//!
//! Tests the full priority chain: hardcoded defaults < XDG config < project config < CLI args

#![allow(clippy::unwrap_used)] // Test code uses unwrap for brevity
#![allow(deprecated)] // cargo_bin deprecation warning

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

fn crash_qa(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("crash-qa").unwrap();
    cmd.current_dir(dir).env("XDG_CONFIG_HOME", dir.join("xdg"));
    cmd
}

fn write_xdg_config(dir: &Path, contents: &str) {
    let config_dir = dir.join("xdg").join("crash-qa");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(config_dir.join("config.toml"), contents).unwrap();
}

fn write_project_config(dir: &Path, contents: &str) {
    fs::write(dir.join(".crash-qa.toml"), contents).unwrap();
}

fn project() -> tempfile::TempDir {
    let temp_dir = tempfile::tempdir().unwrap();
    fs::write(temp_dir.path().join("app.log"), "boot\npanicked at 'oops'\n").unwrap();
    temp_dir
}

#[test]
fn test_project_config_applies_format() {
    let temp_dir = project();
    write_project_config(temp_dir.path(), "[output]\nformat = 'json'\n");

    crash_qa(temp_dir.path())
        .arg("app.log")
        .assert()
        .code(0)
        .stdout(predicate::str::starts_with("{"))
        .stdout(predicate::str::contains("\"summary\""));
}

#[test]
fn test_cli_overrides_project_config() {
    let temp_dir = project();
    write_project_config(temp_dir.path(), "[output]\nformat = 'json'\n");

    let output = crash_qa(temp_dir.path())
        .arg("--format")
        .arg("jsonl")
        .arg("app.log")
        .output()
        .unwrap();

    let stdout = String::from_utf8_lossy(&output.stdout);
    // JSONL: one object per result, no summary document
    assert_eq!(stdout.lines().count(), 2);
    assert!(!stdout.contains("\"summary\""));
}

#[test]
fn test_project_config_found_in_parent() {
    let temp_dir = project();
    write_project_config(temp_dir.path(), "[output]\nformat = 'json'\n");
    let nested = temp_dir.path().join("sub").join("dir");
    fs::create_dir_all(&nested).unwrap();

    let mut cmd = Command::cargo_bin("crash-qa").unwrap();
    cmd.current_dir(&nested)
        .env("XDG_CONFIG_HOME", temp_dir.path().join("xdg"))
        .arg(temp_dir.path().join("app.log"))
        .assert()
        .stdout(predicate::str::starts_with("{"));
}

#[test]
fn test_xdg_config_defines_analyzer() {
    let temp_dir = project();
    write_xdg_config(
        temp_dir.path(),
        r"
[[analyzers]]
name = 'rust-panics'
description = 'Rust panics'
rules = [{ id = 'panic', pattern = 'panicked at', message = 'Rust panic', severity = 'error' }]
",
    );

    crash_qa(temp_dir.path())
        .arg("-a")
        .arg("rust-panics")
        .arg("app.log")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("\"rule\":\"panic\""))
        .stdout(predicate::str::contains("\"severity\":\"error\""));
}

#[test]
fn test_project_config_overrides_xdg() {
    let temp_dir = project();
    write_xdg_config(temp_dir.path(), "[scan]\nanalyzers = ['memory']\n");
    write_project_config(temp_dir.path(), "[scan]\nanalyzers = ['crash-signatures']\n");

    crash_qa(temp_dir.path())
        .arg("app.log")
        .assert()
        .stdout(predicate::str::contains("\"analyzer\":\"crash-signatures\""))
        .stdout(predicate::str::contains("\"analyzer\":\"memory\"").not());
}

#[test]
fn test_cli_analyzer_overrides_config_selection() {
    let temp_dir = project();
    write_project_config(temp_dir.path(), "[scan]\nanalyzers = ['crash-signatures']\n");

    crash_qa(temp_dir.path())
        .arg("-a")
        .arg("memory")
        .arg("app.log")
        .assert()
        .stdout(predicate::str::contains("\"analyzer\":\"memory\""))
        .stdout(predicate::str::contains("\"analyzer\":\"crash-signatures\"").not());
}

#[test]
fn test_invalid_config_value_warns() {
    let temp_dir = project();
    write_project_config(temp_dir.path(), "[scan]\njobs = 0\n");

    crash_qa(temp_dir.path())
        .arg("app.log")
        .assert()
        .code(0)
        .stderr(predicate::str::contains("warning: scan.jobs must be at least 1"));
}

#[test]
fn test_invalid_custom_pattern_is_an_error() {
    let temp_dir = project();
    write_project_config(
        temp_dir.path(),
        "[[analyzers]]\nname = 'broken'\nrules = [{ id = 'r', pattern = '(unclosed' }]\n",
    );

    crash_qa(temp_dir.path())
        .arg("app.log")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid analyzer 'broken'"));
}

#[test]
fn test_recursive_from_config() {
    let temp_dir = tempfile::tempdir().unwrap();
    let nested = temp_dir.path().join("logs").join("old");
    fs::create_dir_all(&nested).unwrap();
    fs::write(nested.join("deep.log"), "std::bad_alloc\n").unwrap();
    write_project_config(temp_dir.path(), "[general]\nrecursive = true\n");

    crash_qa(temp_dir.path())
        .arg("-a")
        .arg("memory")
        .arg("logs")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("deep.log"));
}
