//! Pipeline integration tests using synthetic crash logs.
//!
//! Tests the full scan pipeline end to end through the binary.

#![allow(
    clippy::unwrap_used,
    clippy::uninlined_format_args,
    clippy::missing_panics_doc,
    deprecated
)]

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use crash_qa_test_support::CrashLogBuilder;
use predicates::prelude::*;
use serde_json::Value;

fn crash_qa(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("crash-qa").unwrap();
    cmd.current_dir(dir).env("XDG_CONFIG_HOME", dir.join("xdg"));
    cmd
}

/// Create a temporary directory with the given crash logs.
fn create_logs(logs: Vec<CrashLogBuilder>) -> tempfile::TempDir {
    let temp_dir = tempfile::tempdir().unwrap();
    for (index, log) in logs.into_iter().enumerate() {
        fs::write(temp_dir.path().join(format!("{index:02}.log")), log.text()).unwrap();
    }
    temp_dir
}

fn parse_jsonl(stdout: &[u8]) -> Vec<Value> {
    String::from_utf8_lossy(stdout)
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

// === Detection ===

#[test]
fn test_clean_logs_exit_zero() {
    let temp_dir = create_logs(vec![
        CrashLogBuilder::new("a").info("start").info("stop"),
        CrashLogBuilder::new("b").noise(500),
    ]);

    let output = crash_qa(temp_dir.path()).arg(".").output().unwrap();
    assert_eq!(output.status.code(), Some(0));

    let results = parse_jsonl(&output.stdout);
    assert_eq!(results.len(), 4);
    assert!(results.iter().all(|r| r["has_findings"] == false));
}

#[test]
fn test_each_signature_detected_by_its_analyzer() {
    let temp_dir = create_logs(vec![
        CrashLogBuilder::new("segv").segfault(),
        CrashLogBuilder::new("stack").stack_overflow(),
        CrashLogBuilder::new("exc").unhandled_exception(),
        CrashLogBuilder::new("oom").out_of_memory(),
    ]);

    let output = crash_qa(temp_dir.path()).arg(".").output().unwrap();
    assert_eq!(output.status.code(), Some(1));

    let mut flagged: Vec<(String, String)> = parse_jsonl(&output.stdout)
        .into_iter()
        .filter(|r| r["has_findings"] == true)
        .map(|r| {
            let input = r["input"].as_str().unwrap();
            let file = Path::new(input).file_name().unwrap().to_string_lossy().into_owned();
            (file, r["analyzer"].as_str().unwrap().to_string())
        })
        .collect();
    flagged.sort();

    assert_eq!(
        flagged,
        vec![
            ("00.log".to_string(), "crash-signatures".to_string()),
            ("01.log".to_string(), "crash-signatures".to_string()),
            ("02.log".to_string(), "crash-signatures".to_string()),
            ("03.log".to_string(), "memory".to_string()),
        ]
    );
}

#[test]
fn test_finding_line_numbers_follow_noise() {
    let temp_dir = create_logs(vec![CrashLogBuilder::new("late").noise(1000).bad_alloc()]);

    let output = crash_qa(temp_dir.path())
        .arg("-a")
        .arg("memory")
        .arg("00.log")
        .output()
        .unwrap();
    let results = parse_jsonl(&output.stdout);
    assert_eq!(results[0]["fragment"]["findings"][0]["line"], 1001);
}

// === Concurrency ===

#[test]
fn test_many_logs_single_job() {
    let logs: Vec<CrashLogBuilder> = (0..20)
        .map(|i| {
            let log = CrashLogBuilder::new(format!("log-{i}")).info("start");
            if i % 4 == 0 {
                log.segfault()
            } else {
                log
            }
        })
        .collect();
    let temp_dir = create_logs(logs);

    for jobs in ["1", "8"] {
        let output = crash_qa(temp_dir.path())
            .arg("-j")
            .arg(jobs)
            .arg("--format")
            .arg("json")
            .arg(".")
            .output()
            .unwrap();
        let doc: Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(doc["summary"]["total"], 40, "jobs={}", jobs);
        assert_eq!(doc["summary"]["with_findings"], 5, "jobs={}", jobs);
    }
}

// === Summary ===

#[test]
fn test_summary_on_stderr() {
    let temp_dir = create_logs(vec![CrashLogBuilder::new("x").segfault()]);

    crash_qa(temp_dir.path())
        .arg(".")
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "Scanned 1 log(s): 2 result(s), 1 with findings, 0 failed",
        ));
}

#[test]
fn test_quiet_suppresses_summary() {
    let temp_dir = create_logs(vec![CrashLogBuilder::new("x").segfault()]);

    crash_qa(temp_dir.path())
        .arg("-q")
        .arg(".")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Scanned").not());
}

#[test]
fn test_progress_flag_does_not_touch_stdout() {
    let temp_dir = create_logs(vec![
        CrashLogBuilder::new("a").segfault(),
        CrashLogBuilder::new("b").info("fine"),
    ]);

    let output = crash_qa(temp_dir.path())
        .arg("--progress")
        .arg(".")
        .output()
        .unwrap();
    assert_eq!(parse_jsonl(&output.stdout).len(), 4);
}
