// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The lifecycle manager: owns the process table and every mutation of it.

mod external;
mod install;
mod spawn;
mod start;
mod table;

pub use external::status_map;
pub use install::{check_deps, needs_node_modules};
pub use spawn::SpawnSpec;
pub use start::StartError;
pub use table::ProcessTable;

use chrono::Utc;
use parking_lot::Mutex;
use ql_core::{
    AppConfig, Clock, ProcessKey, ProcessStatus, RestartTracker, StartAttempt, StartupHistory,
    SystemClock,
};
use ql_diag::FailureAnalysis;
use ql_storage::{
    ConfigStore, LogLevel, ResolutionsLog, ScheduleStateStore, TroubleshootingLog,
};
use serde_json::json;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

pub(crate) use install::InstallJob;

/// Errors from stop and manual-run requests (client errors, not failures).
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("'{0}' is not running")]
    NotRunning(String),

    #[error("'{0}' is already running")]
    AlreadyRunning(String),

    #[error("schedule is not enabled for '{0}'")]
    ScheduleDisabled(String),

    #[error("failed to spawn: {0}")]
    Spawn(String),
}

/// Shared supervisor state. Everything mutable lives behind its own lock;
/// handlers and observers may run concurrently.
pub struct Supervisor {
    pub(crate) config_store: Arc<ConfigStore>,
    pub(crate) schedule_state: Arc<ScheduleStateStore>,
    pub(crate) table: ProcessTable,
    pub(crate) restarts: Mutex<HashMap<String, RestartTracker>>,
    pub(crate) history: Mutex<StartupHistory>,
    pub(crate) installs: Mutex<HashMap<String, InstallJob>>,
    pub(crate) trouble: TroubleshootingLog,
    pub(crate) resolutions: ResolutionsLog,
    pub(crate) todo_path: PathBuf,
    pub(crate) http: reqwest::Client,
    pub(crate) clock: SystemClock,
}

impl Supervisor {
    pub fn new(
        config_store: Arc<ConfigStore>,
        schedule_state: Arc<ScheduleStateStore>,
        trouble: TroubleshootingLog,
        resolutions: ResolutionsLog,
        todo_path: PathBuf,
    ) -> Arc<Self> {
        Arc::new(Self {
            config_store,
            schedule_state,
            table: ProcessTable::new(),
            restarts: Mutex::new(HashMap::new()),
            history: Mutex::new(StartupHistory::default()),
            installs: Mutex::new(HashMap::new()),
            trouble,
            resolutions,
            todo_path,
            http: reqwest::Client::new(),
            clock: SystemClock,
        })
    }

    /// Stop a managed process.
    ///
    /// The entry is removed from the table synchronously, then the tree
    /// kill runs in the background — a late exit observer finds no entry
    /// and no-ops, and a pending health poll notices the removal and gives
    /// up. Valid in any non-terminal state.
    pub fn stop(self: &Arc<Self>, key: &ProcessKey) -> Result<String, SupervisorError> {
        let entry = self
            .table
            .remove(key)
            .ok_or_else(|| SupervisorError::NotRunning(key.to_string()))?;
        if entry.status.is_terminal() {
            // The leftover entry is dropped, but there is nothing to kill.
            return Err(SupervisorError::NotRunning(key.to_string()));
        }

        info!(key = %key, pid = ?entry.pid, "stopping");
        if let Some(pid) = entry.pid {
            tokio::spawn(async move {
                crate::prockill::kill_tree(pid).await;
            });
        }
        self.trouble.append(
            LogLevel::Info,
            &entry.name,
            "Stopped by request",
            Some(&json!({ "pid": entry.pid })),
        );
        Ok(entry.name)
    }

    /// Execute a scheduled app (cron firing or manual run).
    ///
    /// Hybrid apps (with a `scheduleCommand`) run under the `:sync` key so
    /// the long-running server can keep its own. Non-manual npm sync runs
    /// get `-- --headless` appended to suppress a visible browser.
    pub async fn run_scheduled(
        self: &Arc<Self>,
        app: &AppConfig,
        is_manual: bool,
    ) -> Result<ProcessKey, SupervisorError> {
        if is_manual && !app.schedule_enabled {
            return Err(SupervisorError::ScheduleDisabled(app.id.clone()));
        }

        let key = if app.schedule_command.is_some() {
            ProcessKey::sync(&app.id)
        } else {
            ProcessKey::app(&app.id)
        };
        if self.table.is_active(&key) {
            return Err(SupervisorError::AlreadyRunning(key.to_string()));
        }
        // A terminal leftover from the previous run is replaced.
        self.table.remove(&key);

        let mut command = app.scheduled_command().to_string();
        if !is_manual && command.contains("npm run sync") {
            command.push_str(" -- --headless");
        }

        let spec = SpawnSpec {
            key: key.clone(),
            config: app.clone(),
            command,
            port: if key.is_sync() { 0 } else { app.port },
            initial_status: ProcessStatus::Running,
            is_scheduled: true,
            is_manual,
        };
        let pid = self
            .spawn_into_table(spec)
            .await
            .map_err(|e| SupervisorError::Spawn(e.to_string()))?;

        self.trouble.append(
            LogLevel::Info,
            &app.name,
            "Scheduled run started",
            Some(&json!({ "pid": pid, "manual": is_manual })),
        );
        Ok(key)
    }

    /// Failure analysis for an app, from the troubleshooting and
    /// resolutions logs.
    pub fn analysis_for(&self, app_name: &str) -> FailureAnalysis {
        let entries = self.trouble.entries_for_app(app_name);
        let resolved = self.resolutions.latest_resolved_by_type();
        ql_diag::analyze(app_name, &entries, &resolved, Utc::now())
    }

    /// Write the once-per-day auto-TODO entry when the analysis calls for
    /// it. Best-effort; TODO.md is human-edited and failures must not block
    /// a start.
    pub(crate) fn maybe_auto_todo(&self, app_name: &str, analysis: &FailureAnalysis) {
        let Some(rec) = analysis.recommendation.as_ref().filter(|r| r.should_auto_todo) else {
            return;
        };
        let content = std::fs::read_to_string(&self.todo_path).unwrap_or_default();
        let today = chrono::Local::now().date_naive();
        if let Some(updated) = ql_diag::insert_auto_todo(&content, app_name, today, rec) {
            match std::fs::write(&self.todo_path, updated) {
                Ok(()) => info!(app = app_name, "auto-TODO entry written"),
                Err(e) => warn!(app = app_name, error = %e, "failed to write TODO.md"),
            }
        }
    }

    /// Startup attempt history for an app.
    pub fn history_for(&self, app_id: &str) -> (Vec<StartAttempt>, Option<String>) {
        self.history.lock().for_app(app_id)
    }

    pub(crate) fn now_ms(&self) -> u64 {
        self.clock.epoch_ms()
    }

    pub fn config_store(&self) -> &Arc<ConfigStore> {
        &self.config_store
    }

    pub fn schedule_state(&self) -> &Arc<ScheduleStateStore> {
        &self.schedule_state
    }

    pub fn table(&self) -> &ProcessTable {
        &self.table
    }

    pub fn trouble(&self) -> &TroubleshootingLog {
        &self.trouble
    }

    pub fn resolutions(&self) -> &ResolutionsLog {
        &self.resolutions
    }

    pub fn todo_path(&self) -> &std::path::Path {
        &self.todo_path
    }

    /// Drop persisted schedule state for a removed app (best-effort).
    pub fn forget_schedule_state(&self, app_id: &str) {
        if let Err(e) = self.schedule_state.forget(app_id) {
            warn!(app_id, error = %e, "failed to drop schedule state");
        }
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
