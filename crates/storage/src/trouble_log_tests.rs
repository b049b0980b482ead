// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;
use tempfile::tempdir;

#[test]
fn append_and_read_round_trip() {
    let dir = tempdir().unwrap();
    let log = TroubleshootingLog::new(dir.path().join("troubleshooting.log"));

    log.append(
        LogLevel::Error,
        "Web App",
        "Port 5173 in use",
        Some(&json!({"port": 5173})),
    );
    log.append(LogLevel::Info, "Web App", "Started", None);

    let entries = log.read_all();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].level, LogLevel::Error);
    assert_eq!(entries[0].app, "Web App");
    assert_eq!(entries[0].message, "Port 5173 in use");
    assert_eq!(entries[0].details.as_ref().unwrap()["port"], 5173);
    assert_eq!(entries[1].level, LogLevel::Info);
    assert!(entries[1].details.is_none());
}

#[test]
fn normal_termination_detail_is_detected() {
    let dir = tempdir().unwrap();
    let log = TroubleshootingLog::new(dir.path().join("t.log"));
    log.append(
        LogLevel::Info,
        "Web App",
        "exited with code 3221225786",
        Some(&json!({"exitCode": 3221225786u64, "normalTermination": true})),
    );
    log.append(
        LogLevel::Error,
        "Web App",
        "exited with code 1",
        Some(&json!({"exitCode": 1, "normalTermination": false})),
    );

    let entries = log.read_all();
    assert!(entries[0].is_normal_termination());
    assert!(!entries[1].is_normal_termination());
}

#[test]
fn message_with_braces_still_splits_details() {
    let dir = tempdir().unwrap();
    let log = TroubleshootingLog::new(dir.path().join("t.log"));
    log.append(
        LogLevel::Warn,
        "A",
        "template {name} failed",
        Some(&json!({"x": 1})),
    );
    let entries = log.read_all();
    assert_eq!(entries[0].message, "template {name} failed");
    assert_eq!(entries[0].details.as_ref().unwrap()["x"], 1);
}

#[test]
fn unparseable_lines_are_skipped() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("t.log");
    std::fs::write(
        &path,
        "garbage line\n[2026-08-01T09:00:00.000Z] [ERROR] [A] boom\n",
    )
    .unwrap();
    let log = TroubleshootingLog::new(&path);
    let entries = log.read_all();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].message, "boom");
}

#[test]
fn entries_for_app_filters_by_label() {
    let dir = tempdir().unwrap();
    let log = TroubleshootingLog::new(dir.path().join("t.log"));
    log.append(LogLevel::Error, "A", "one", None);
    log.append(LogLevel::Error, "B", "two", None);
    log.append(LogLevel::Warn, "A", "three", None);

    let entries = log.entries_for_app("A");
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|e| e.app == "A"));
}

#[test]
fn missing_file_reads_empty() {
    let dir = tempdir().unwrap();
    let log = TroubleshootingLog::new(dir.path().join("nope.log"));
    assert!(log.read_all().is_empty());
}

#[yare::parameterized(
    info  = { LogLevel::Info, false },
    warn  = { LogLevel::Warn, true },
    error = { LogLevel::Error, true },
)]
fn failure_levels(level: LogLevel, expected: bool) {
    assert_eq!(level.is_failure_level(), expected);
}
