//! Output format validation tests.
//!
//! Tests JSON/JSONL output format correctness and required field presence.

#![allow(clippy::unwrap_used)]
#![allow(deprecated)] // cargo_bin deprecation

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use serde_json::Value;

fn crash_qa(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("crash-qa").unwrap();
    cmd.current_dir(dir).env("XDG_CONFIG_HOME", dir.join("xdg"));
    cmd
}

fn logs_dir() -> tempfile::TempDir {
    let temp_dir = tempfile::tempdir().unwrap();
    fs::write(
        temp_dir.path().join("crash.log"),
        "boot\nProgram received signal SIGSEGV, Segmentation fault.\n",
    )
    .unwrap();
    fs::write(temp_dir.path().join("clean.log"), "boot\nshutdown\n").unwrap();
    temp_dir
}

// === JSONL Format Tests ===

#[test]
fn test_jsonl_one_object_per_result() {
    let temp_dir = logs_dir();
    let output = crash_qa(temp_dir.path())
        .arg("--format")
        .arg("jsonl")
        .arg(".")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let values: Vec<Value> = stdout
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();

    // 2 logs x 2 built-in analyzers
    assert_eq!(values.len(), 4);
    assert!(values.iter().all(Value::is_object));
}

#[test]
fn test_jsonl_required_fields() {
    let temp_dir = logs_dir();
    let output = crash_qa(temp_dir.path()).arg(".").output().unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);

    for line in stdout.lines().filter(|l| !l.trim().is_empty()) {
        let value: Value = serde_json::from_str(line).unwrap();
        assert!(value["input"].is_string(), "missing input: {line}");
        assert!(value["analyzer"].is_string(), "missing analyzer: {line}");
        assert!(value["success"].is_boolean(), "missing success: {line}");
        assert!(value["has_findings"].is_boolean(), "missing has_findings: {line}");
        assert!(value["duration_ms"].is_u64(), "missing duration_ms: {line}");
        assert!(value["fragment"]["findings"].is_array(), "missing fragment: {line}");
    }
}

#[test]
fn test_jsonl_finding_fields() {
    let temp_dir = logs_dir();
    let output = crash_qa(temp_dir.path())
        .arg("-a")
        .arg("crash-signatures")
        .arg("crash.log")
        .output()
        .unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    let value: Value = serde_json::from_str(stdout.trim()).unwrap();

    let finding = &value["fragment"]["findings"][0];
    assert_eq!(finding["rule"], "access-violation");
    assert_eq!(finding["severity"], "critical");
    assert_eq!(finding["line"], 2);
}

// === JSON Format Tests ===

#[test]
fn test_json_single_document() {
    let temp_dir = logs_dir();
    let output = crash_qa(temp_dir.path())
        .arg("--format")
        .arg("json")
        .arg(".")
        .output()
        .unwrap();

    let stdout = String::from_utf8_lossy(&output.stdout);
    let doc: Value = serde_json::from_str(stdout.trim()).unwrap();

    assert_eq!(doc["summary"]["total"], 4);
    assert_eq!(doc["summary"]["succeeded"], 4);
    assert_eq!(doc["summary"]["failed"], 0);
    assert_eq!(doc["summary"]["with_findings"], 1);
    assert_eq!(doc["results"].as_array().unwrap().len(), 4);
    assert!(doc["generated_at"].is_string());
}

#[test]
fn test_json_pretty_spans_lines() {
    let temp_dir = logs_dir();
    let output = crash_qa(temp_dir.path())
        .arg("--format")
        .arg("json")
        .arg("--pretty")
        .arg(".")
        .output()
        .unwrap();

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.lines().count() > 1);
    let doc: Value = serde_json::from_str(&stdout).unwrap();
    assert!(doc.is_object());
}

#[test]
fn test_pretty_ignored_for_jsonl() {
    let temp_dir = logs_dir();
    let output = crash_qa(temp_dir.path())
        .arg("--pretty")
        .arg("-a")
        .arg("memory")
        .arg("clean.log")
        .output()
        .unwrap();

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.lines().count(), 1);
}
