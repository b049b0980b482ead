// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;
use tempfile::tempdir;

#[test]
fn missing_file_starts_empty() {
    let dir = tempdir().unwrap();
    let store = ScheduleStateStore::open(dir.path().join("schedule-state.json")).unwrap();
    assert!(store.get("a").is_none());
    assert!(store.snapshot().is_empty());
}

#[test]
fn record_run_persists_across_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("schedule-state.json");
    let completed = Utc.with_ymd_and_hms(2026, 8, 1, 2, 30, 0).unwrap();
    {
        let store = ScheduleStateStore::open(&path).unwrap();
        store.record_run("nightly", completed, Some(0), false).unwrap();
    }
    let store = ScheduleStateStore::open(&path).unwrap();
    let record = store.get("nightly").unwrap();
    assert_eq!(record.last_run, Some(completed));
    assert_eq!(record.last_exit_code, Some(0));
    assert!(!record.was_manual);
}

#[test]
fn record_run_overwrites_previous() {
    let dir = tempdir().unwrap();
    let store = ScheduleStateStore::open(dir.path().join("s.json")).unwrap();
    let first = Utc.with_ymd_and_hms(2026, 7, 31, 2, 30, 0).unwrap();
    let second = Utc.with_ymd_and_hms(2026, 8, 1, 2, 30, 0).unwrap();

    store.record_run("nightly", first, Some(1), false).unwrap();
    store.record_run("nightly", second, Some(0), true).unwrap();

    let record = store.get("nightly").unwrap();
    assert_eq!(record.last_run, Some(second));
    assert_eq!(record.last_exit_code, Some(0));
    assert!(record.was_manual);
}

#[test]
fn forget_removes_record() {
    let dir = tempdir().unwrap();
    let store = ScheduleStateStore::open(dir.path().join("s.json")).unwrap();
    store
        .record_run("nightly", Utc::now(), Some(0), false)
        .unwrap();
    store.forget("nightly").unwrap();
    assert!(store.get("nightly").is_none());
}

#[test]
fn corrupt_file_moves_to_bak_and_starts_empty() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("s.json");
    std::fs::write(&path, "{{nope").unwrap();
    let store = ScheduleStateStore::open(&path).unwrap();
    assert!(store.snapshot().is_empty());
    assert!(dir.path().join("s.bak").exists());
}

#[test]
fn wire_shape_is_camel_case() {
    let record = ScheduleRecord {
        last_run: Some(Utc.with_ymd_and_hms(2026, 8, 1, 2, 30, 0).unwrap()),
        last_exit_code: Some(0),
        was_manual: false,
    };
    let json = serde_json::to_value(&record).unwrap();
    assert!(json.get("lastRun").is_some());
    assert_eq!(json["lastExitCode"], 0);
    assert_eq!(json["wasManual"], false);
}
