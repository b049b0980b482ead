// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use ql_core::{AppConfig, ProcessKey};
use ql_storage::{ConfigStore, ResolutionsLog, ScheduleStateStore, TroubleshootingLog};
use std::sync::Arc;
use tempfile::TempDir;

fn test_supervisor(dir: &TempDir) -> Arc<Supervisor> {
    let config_store = Arc::new(ConfigStore::open(dir.path().join("config.json")).unwrap());
    let schedule_state =
        Arc::new(ScheduleStateStore::open(dir.path().join("schedule-state.json")).unwrap());
    Supervisor::new(
        config_store,
        schedule_state,
        TroubleshootingLog::new(dir.path().join("troubleshooting.log")),
        ResolutionsLog::new(dir.path().join("resolutions.log")),
        dir.path().join("TODO.md"),
    )
}

fn app(id: &str, dir: &TempDir, overrides: serde_json::Value) -> AppConfig {
    let mut base = serde_json::json!({
        "id": id,
        "name": format!("{} app", id),
        "port": 0,
        "path": dir.path().join("app"),
        "command": "true",
        "scheduleEnabled": true,
        "schedule": "02:30",
    });
    if let (Some(base_map), Some(over)) = (base.as_object_mut(), overrides.as_object()) {
        for (k, v) in over {
            base_map.insert(k.clone(), v.clone());
        }
    }
    std::fs::create_dir_all(dir.path().join("app")).unwrap();
    serde_json::from_value(base).unwrap()
}

#[tokio::test]
async fn stop_of_unknown_key_is_a_client_error() {
    let dir = TempDir::new().unwrap();
    let sup = test_supervisor(&dir);
    let err = sup.stop(&ProcessKey::app("ghost")).unwrap_err();
    assert!(matches!(err, SupervisorError::NotRunning(_)));
}

#[tokio::test]
async fn manual_run_requires_enabled_schedule() {
    let dir = TempDir::new().unwrap();
    let sup = test_supervisor(&dir);
    let app = app("sync", &dir, serde_json::json!({ "scheduleEnabled": false }));

    let err = sup.run_scheduled(&app, true).await.unwrap_err();
    assert!(matches!(err, SupervisorError::ScheduleDisabled(_)));
}

#[tokio::test]
async fn scheduled_run_records_schedule_state() {
    let dir = TempDir::new().unwrap();
    let sup = test_supervisor(&dir);
    let app = app("sync", &dir, serde_json::json!({}));

    let key = sup.run_scheduled(&app, true).await.unwrap();
    assert_eq!(key, ProcessKey::app("sync"));

    // `true` exits immediately; wait for the observer to record the run.
    let mut record = None;
    for _ in 0..100 {
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        if let Some(r) = sup.schedule_state().get("sync") {
            record = Some(r);
            break;
        }
    }
    let record = record.expect("schedule state recorded");
    assert_eq!(record.last_exit_code, Some(0));
    assert!(record.was_manual);
    assert!(record.last_run.is_some());

    let entry = sup.table().get(&key).expect("entry retained");
    assert_eq!(entry.status, ql_core::ProcessStatus::Completed);
}

#[tokio::test]
async fn hybrid_app_runs_under_sync_key() {
    let dir = TempDir::new().unwrap();
    let sup = test_supervisor(&dir);
    let app = app(
        "web",
        &dir,
        serde_json::json!({ "scheduleCommand": "true", "port": 5999 }),
    );

    let key = sup.run_scheduled(&app, true).await.unwrap();
    assert_eq!(key, ProcessKey::sync("web"));
    assert_eq!(sup.table().get(&key).unwrap().port, 0);
}

#[tokio::test]
async fn failed_scheduled_run_marks_failed() {
    let dir = TempDir::new().unwrap();
    let sup = test_supervisor(&dir);
    let app = app("sync", &dir, serde_json::json!({ "command": "false" }));

    let key = sup.run_scheduled(&app, true).await.unwrap();

    let mut status = None;
    for _ in 0..100 {
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        let entry = sup.table().get(&key).unwrap();
        if entry.status.is_terminal() {
            status = Some(entry.status);
            break;
        }
    }
    assert_eq!(status, Some(ql_core::ProcessStatus::Failed));
    assert_eq!(
        sup.schedule_state().get("sync").unwrap().last_exit_code,
        Some(1)
    );
}

#[tokio::test]
async fn duplicate_start_is_rejected() {
    let dir = TempDir::new().unwrap();
    let sup = test_supervisor(&dir);
    let app = app("sleepy", &dir, serde_json::json!({ "command": "sleep 30" }));

    let key = sup.run_scheduled(&app, true).await.unwrap();
    assert!(sup.table().is_active(&key));

    let err = sup.run_scheduled(&app, true).await.unwrap_err();
    assert!(matches!(err, SupervisorError::AlreadyRunning(_)));

    sup.stop(&key).unwrap();
}
