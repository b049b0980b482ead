// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use ql_storage::{ConfigStore, ResolutionsLog, ScheduleStateStore, TroubleshootingLog};
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
        "command": "sleep 30",
    });
    if let (Some(base_map), Some(over)) = (base.as_object_mut(), overrides.as_object()) {
        for (k, v) in over {
            base_map.insert(k.clone(), v.clone());
        }
    }
    std::fs::create_dir_all(dir.path().join("app")).unwrap();
    serde_json::from_value(base).unwrap()
}

fn failure_of(err: StartError) -> Box<StartFailure> {
    match err {
        StartError::Failure(failure) => failure,
        other => panic!("expected failure, got {:?}", other),
    }
}

#[tokio::test]
async fn missing_path_fails_preflight() {
    let dir = TempDir::new().unwrap();
    let sup = test_supervisor(&dir);
    let mut app = app("web", &dir, serde_json::json!({}));
    app.path = dir.path().join("missing");

    let err = sup.start_app(app, StartOptions::default()).await.unwrap_err();
    let failure = failure_of(err);
    assert_eq!(failure.support_code, SupportCode::PathMissing);
    assert_eq!(failure.kind, FailureKind::PathNotFound);
    assert!(!failure.troubleshooting.is_empty());

    let (attempts, _) = sup.history_for("web");
    assert_eq!(attempts[0].result, AttemptResult::Failed);
}

#[tokio::test]
async fn missing_manifest_fails_preflight() {
    let dir = TempDir::new().unwrap();
    let sup = test_supervisor(&dir);
    let app = app("web", &dir, serde_json::json!({ "command": "npm run dev" }));

    let err = sup.start_app(app, StartOptions::default()).await.unwrap_err();
    let failure = failure_of(err);
    assert_eq!(failure.support_code, SupportCode::ManifestMissing);
    assert_eq!(failure.kind, FailureKind::MissingManifest);
}

#[tokio::test]
async fn missing_node_modules_fails_with_install_hint() {
    let dir = TempDir::new().unwrap();
    let sup = test_supervisor(&dir);
    let app = app("web", &dir, serde_json::json!({ "command": "npm run dev" }));
    std::fs::write(dir.path().join("app/package.json"), "{}").unwrap();
    std::fs::write(dir.path().join("app/yarn.lock"), "").unwrap();

    let err = sup.start_app(app, StartOptions::default()).await.unwrap_err();
    let failure = failure_of(err);
    assert_eq!(failure.support_code, SupportCode::DependenciesMissing);
    assert_eq!(failure.needs_install, Some(true));
    assert_eq!(failure.package_manager.as_deref(), Some("yarn"));

    let (attempts, _) = sup.history_for("web");
    assert_eq!(attempts[0].result, AttemptResult::NeedsInstall);
}

#[tokio::test]
async fn non_node_commands_skip_the_manifest_check() {
    let dir = TempDir::new().unwrap();
    let sup = test_supervisor(&dir);
    // No package.json anywhere, but the command is not node-shaped.
    let app = app("web", &dir, serde_json::json!({ "command": "sleep 30" }));

    let result = sup.start_app(app, StartOptions::default()).await.unwrap();
    assert_eq!(result.status, ProcessStatus::Running);
    sup.stop(&ProcessKey::app("web")).unwrap();
}

#[tokio::test]
async fn occupied_port_fails_with_retry_and_alternative() {
    let dir = TempDir::new().unwrap();
    let sup = test_supervisor(&dir);

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let app = app("web", &dir, serde_json::json!({ "port": port }));
    let err = sup.start_app(app, StartOptions::default()).await.unwrap_err();
    let failure = failure_of(err);
    assert_eq!(failure.support_code, SupportCode::PortInUse);
    assert_eq!(failure.kind, FailureKind::PortInUse);
    assert!(failure.can_retry);
    assert_eq!(failure.can_use_alternative, Some(true));
    assert!(failure.alternative_port.is_some());
}

#[tokio::test]
async fn override_port_dodges_the_conflict() {
    let dir = TempDir::new().unwrap();
    let sup = test_supervisor(&dir);

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
    let taken = listener.local_addr().unwrap().port();
    let free = {
        let probe = tokio::net::TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
        probe.local_addr().unwrap().port()
    };

    let app = app(
        "web",
        &dir,
        serde_json::json!({ "port": taken, "startupTimeout": 800 }),
    );
    let opts = StartOptions {
        retry: false,
        override_port: Some(free),
    };
    // The declared port stays blocked, but the override goes through the
    // whole sequence (health times out on the silent port, which is not a
    // failure).
    let result = sup.start_app(app, opts).await.unwrap();
    assert_eq!(result.port, free);
    sup.stop(&ProcessKey::app("web")).unwrap();
}

#[tokio::test]
async fn unknown_binary_fails_spawn_with_file_code() {
    let dir = TempDir::new().unwrap();
    let sup = test_supervisor(&dir);
    let app = app(
        "web",
        &dir,
        serde_json::json!({ "command": "definitely-not-a-real-binary-qx7" }),
    );

    let err = sup.start_app(app, StartOptions::default()).await.unwrap_err();
    let failure = failure_of(err);
    assert_eq!(failure.support_code, SupportCode::FileMissing);
    assert_eq!(failure.kind, FailureKind::Exception);
}

#[tokio::test]
async fn immediate_crash_is_reported_as_startup_failure() {
    let dir = TempDir::new().unwrap();
    let sup = test_supervisor(&dir);
    let app = app("web", &dir, serde_json::json!({ "command": "false" }));

    let err = sup.start_app(app, StartOptions::default()).await.unwrap_err();
    let failure = failure_of(err);
    assert_eq!(failure.kind, FailureKind::StartupCrash);

    let entry = sup.table().get(&ProcessKey::app("web")).unwrap();
    assert_eq!(entry.status, ProcessStatus::Failed);
}

#[tokio::test]
async fn app_without_port_runs_after_the_crash_window() {
    let dir = TempDir::new().unwrap();
    let sup = test_supervisor(&dir);
    let app = app("web", &dir, serde_json::json!({}));

    let result = sup.start_app(app, StartOptions::default()).await.unwrap();
    assert_eq!(result.status, ProcessStatus::Running);
    assert!(result.pid.is_some());
    assert!(result.warning.is_none());

    let (attempts, _) = sup.history_for("web");
    assert_eq!(attempts[0].result, AttemptResult::Success);
    assert!(attempts[0].steps.iter().any(|s| s.contains("spawned pid")));

    sup.stop(&ProcessKey::app("web")).unwrap();
}

#[tokio::test]
async fn health_timeout_reports_success_with_starting_status() {
    let dir = TempDir::new().unwrap();
    let sup = test_supervisor(&dir);

    // A free port nobody will ever answer on.
    let port = {
        let probe = tokio::net::TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
        probe.local_addr().unwrap().port()
    };
    let app = app(
        "web",
        &dir,
        serde_json::json!({ "port": port, "startupTimeout": 900 }),
    );

    let result = sup.start_app(app, StartOptions::default()).await.unwrap();
    assert_eq!(result.status, ProcessStatus::Starting);
    assert!(result.warning.is_some());
    let health = result.health.unwrap();
    assert!(!health.healthy);
    assert_eq!(health.timed_out, Some(true));

    // The child was left alone.
    let entry = sup.table().get(&ProcessKey::app("web")).unwrap();
    assert_eq!(entry.status, ProcessStatus::Starting);

    let (attempts, _) = sup.history_for("web");
    assert_eq!(attempts[0].result, AttemptResult::Partial);

    sup.stop(&ProcessKey::app("web")).unwrap();
}

#[tokio::test]
async fn second_start_of_an_active_key_is_rejected() {
    let dir = TempDir::new().unwrap();
    let sup = test_supervisor(&dir);
    let first = app("web", &dir, serde_json::json!({}));
    sup.start_app(first.clone(), StartOptions::default()).await.unwrap();

    let err = sup.start_app(first, StartOptions::default()).await.unwrap_err();
    assert!(matches!(err, StartError::AlreadyRunning(_)));

    sup.stop(&ProcessKey::app("web")).unwrap();
}

#[tokio::test]
async fn a_terminal_leftover_is_replaced_on_restart() {
    let dir = TempDir::new().unwrap();
    let sup = test_supervisor(&dir);
    let crashy = app("web", &dir, serde_json::json!({ "command": "false" }));
    let _ = sup.start_app(crashy, StartOptions::default()).await;
    assert_eq!(
        sup.table().get(&ProcessKey::app("web")).unwrap().status,
        ProcessStatus::Failed
    );

    // Starting again drops the failed entry instead of rejecting.
    let healthy = app("web", &dir, serde_json::json!({}));
    let result = sup.start_app(healthy, StartOptions::default()).await.unwrap();
    assert_eq!(result.status, ProcessStatus::Running);
    sup.stop(&ProcessKey::app("web")).unwrap();
}
