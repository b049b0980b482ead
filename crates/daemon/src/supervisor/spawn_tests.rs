// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use ql_storage::{ConfigStore, ResolutionsLog, ScheduleStateStore, TroubleshootingLog};
use std::time::{Duration, Instant};
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

/// An entry that has been resident for `ran_for` already, so exit
/// classification sees a realistic run time.
fn resident_entry(
    dir: &TempDir,
    id: &str,
    auto_restart: bool,
    ran_for: Duration,
) -> ProcessEntry {
    let config: AppConfig = serde_json::from_value(serde_json::json!({
        "id": id,
        "name": format!("{} app", id),
        "port": 0,
        "path": dir.path(),
        "command": "sleep 30",
        "autoRestart": auto_restart,
        "maxRestartAttempts": 3,
    }))
    .unwrap();
    let mut entry = ProcessEntry::new(ProcessKey::app(id), config, 0, 4242, 1_000);
    entry.status = ProcessStatus::Running;
    entry.started = Instant::now() - ran_for;
    entry
}

fn trouble_messages(sup: &Supervisor) -> Vec<String> {
    sup.trouble()
        .read_all()
        .into_iter()
        .map(|e| e.message)
        .collect()
}

#[tokio::test]
async fn normal_exit_stops_without_restart() {
    let dir = TempDir::new().unwrap();
    let sup = test_supervisor(&dir);
    let key = ProcessKey::app("a");
    sup.table.insert(resident_entry(&dir, "a", true, Duration::from_secs(60)));

    sup.handle_exit(&key, Some(0)).await;

    let entry = sup.table.get(&key).unwrap();
    assert_eq!(entry.status, ProcessStatus::Stopped);
    assert_eq!(entry.exit_code, Some(0));
    assert!(sup.restarts.lock().is_empty());

    let log = sup.trouble().read_all();
    assert!(log.iter().any(|e| e.is_normal_termination()));
}

#[tokio::test]
async fn ctrl_c_code_is_a_normal_termination() {
    let dir = TempDir::new().unwrap();
    let sup = test_supervisor(&dir);
    let key = ProcessKey::app("a");
    sup.table.insert(resident_entry(&dir, "a", true, Duration::from_secs(60)));

    sup.handle_exit(&key, Some(0xC000_013A)).await;

    assert_eq!(sup.table.get(&key).unwrap().status, ProcessStatus::Stopped);
    assert!(sup.restarts.lock().is_empty());
}

#[tokio::test]
async fn early_crash_is_a_startup_crash_and_never_restarts() {
    let dir = TempDir::new().unwrap();
    let sup = test_supervisor(&dir);
    let key = ProcessKey::app("a");
    // Fresh entry: run time well inside the startup window.
    sup.table.insert(resident_entry(&dir, "a", true, Duration::from_millis(100)));

    sup.handle_exit(&key, Some(1)).await;

    assert_eq!(sup.table.get(&key).unwrap().status, ProcessStatus::Failed);
    assert!(sup.restarts.lock().is_empty());

    let (attempts, last_error) = sup.history_for("a");
    assert_eq!(attempts.len(), 1);
    assert_eq!(attempts[0].result, ql_core::AttemptResult::Failed);
    assert!(last_error.unwrap().contains("startup crash"));

    assert!(trouble_messages(&sup)
        .iter()
        .any(|m| m.contains("during startup")));
}

#[tokio::test]
async fn late_crash_without_auto_restart_just_fails() {
    let dir = TempDir::new().unwrap();
    let sup = test_supervisor(&dir);
    let key = ProcessKey::app("a");
    sup.table.insert(resident_entry(&dir, "a", false, Duration::from_secs(10)));

    sup.handle_exit(&key, Some(1)).await;

    assert_eq!(sup.table.get(&key).unwrap().status, ProcessStatus::Failed);
    assert!(sup.restarts.lock().is_empty());
}

#[tokio::test]
async fn late_crash_with_auto_restart_enters_restarting() {
    let dir = TempDir::new().unwrap();
    let sup = test_supervisor(&dir);
    let key = ProcessKey::app("a");
    sup.table.insert(resident_entry(&dir, "a", true, Duration::from_secs(10)));

    sup.handle_exit(&key, Some(1)).await;

    assert_eq!(
        sup.table.get(&key).unwrap().status,
        ProcessStatus::Restarting
    );
    let tracker = sup.restarts.lock().get("a").cloned().unwrap();
    assert_eq!(tracker.attempts, 1);
    assert!(trouble_messages(&sup)
        .iter()
        .any(|m| m.contains("Restarting after crash (attempt 1/3)")));

    // Abort the pending respawn by removing the entry, as a stop would.
    sup.table.remove(&key);
}

#[tokio::test]
async fn restart_respawns_with_the_snapshot_config() {
    let dir = TempDir::new().unwrap();
    let sup = test_supervisor(&dir);
    let key = ProcessKey::app("a");
    sup.table.insert(resident_entry(&dir, "a", true, Duration::from_secs(10)));

    sup.handle_exit(&key, Some(1)).await;

    // The replacement spawns after the restart delay and, with no port to
    // probe, transitions straight to running.
    let mut replacement = None;
    for _ in 0..100 {
        tokio::time::sleep(Duration::from_millis(100)).await;
        if let Some(entry) = sup.table.get(&key) {
            if entry.status == ProcessStatus::Running {
                replacement = Some(entry);
                break;
            }
        }
    }
    let replacement = replacement.expect("replacement never became running");
    assert_ne!(replacement.pid, Some(4242));
    assert_eq!(replacement.config.command, "sleep 30");

    sup.stop(&key).unwrap();
}

#[tokio::test]
async fn exhausted_budget_freezes_restarts_for_the_cooldown() {
    let dir = TempDir::new().unwrap();
    let sup = test_supervisor(&dir);
    let key = ProcessKey::app("a");
    sup.table.insert(resident_entry(&dir, "a", true, Duration::from_secs(10)));

    // Budget already spent: the blocking attempt started the cooldown.
    let now_ms = sup.now_ms();
    let mut tracker = RestartTracker::default();
    for _ in 0..3 {
        tracker.record_attempt(3, now_ms);
    }
    assert!(tracker.cooldown_remaining_ms(now_ms).is_some());
    sup.restarts.lock().insert("a".to_string(), tracker);

    sup.handle_exit(&key, Some(1)).await;

    assert_eq!(sup.table.get(&key).unwrap().status, ProcessStatus::Failed);
    // No fourth attempt was recorded.
    assert_eq!(sup.restarts.lock().get("a").unwrap().attempts, 3);
    assert!(trouble_messages(&sup)
        .iter()
        .any(|m| m.contains("Auto-restart budget exhausted")));
}

#[tokio::test]
async fn cooldown_blocks_restart_even_with_budget_left() {
    let dir = TempDir::new().unwrap();
    let sup = test_supervisor(&dir);
    let key = ProcessKey::app("a");
    sup.table.insert(resident_entry(&dir, "a", true, Duration::from_secs(10)));

    sup.restarts.lock().insert(
        "a".to_string(),
        RestartTracker {
            attempts: 1,
            last_attempt_ms: 0,
            cooldown_until_ms: sup.now_ms() + 60_000,
        },
    );

    sup.handle_exit(&key, Some(1)).await;

    assert_eq!(sup.table.get(&key).unwrap().status, ProcessStatus::Failed);
    assert_eq!(sup.restarts.lock().get("a").unwrap().attempts, 1);
}

#[tokio::test]
async fn stability_reset_clears_tracker_only_while_active() {
    let dir = TempDir::new().unwrap();
    let sup = test_supervisor(&dir);
    let key = ProcessKey::app("a");

    // Active replacement: the tracker is cleared.
    sup.table.insert(resident_entry(&dir, "a", true, Duration::from_secs(10)));
    sup.restarts
        .lock()
        .insert("a".to_string(), RestartTracker {
            attempts: 2,
            last_attempt_ms: 0,
            cooldown_until_ms: 0,
        });
    sup.reset_tracker_if_stable(&key);
    assert!(sup.restarts.lock().get("a").is_none());

    // Failed replacement: the tracker (and its dwindled budget) survives.
    sup.restarts
        .lock()
        .insert("a".to_string(), RestartTracker {
            attempts: 2,
            last_attempt_ms: 0,
            cooldown_until_ms: 0,
        });
    sup.table.transition(&key, ProcessStatus::Failed);
    sup.reset_tracker_if_stable(&key);
    assert_eq!(sup.restarts.lock().get("a").unwrap().attempts, 2);
}

#[tokio::test]
async fn exit_for_a_removed_key_is_a_no_op() {
    let dir = TempDir::new().unwrap();
    let sup = test_supervisor(&dir);

    sup.handle_exit(&ProcessKey::app("ghost"), Some(1)).await;

    assert!(sup.table.snapshot().is_empty());
    assert!(sup.trouble().read_all().is_empty());
    assert!(sup.restarts.lock().is_empty());
}
