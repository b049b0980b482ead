// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup, shutdown, missed-run recovery.

use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

use fs2::FileExt;
use ql_storage::{ConfigError, ConfigStore, ResolutionsLog, ScheduleStateStore, TroubleshootingLog};
use thiserror::Error;
use tokio::net::UnixListener;
use tracing::{info, warn};

use crate::env::state_dir;
use crate::sched::{self, Scheduler};
use crate::supervisor::Supervisor;

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Root state directory (e.g. ~/.local/state/quicklaunch)
    pub state_dir: PathBuf,
    /// Path to Unix socket
    pub socket_path: PathBuf,
    /// Path to lock/PID file
    pub lock_path: PathBuf,
    /// Path to version file
    pub version_path: PathBuf,
    /// Path to daemon log file
    pub log_path: PathBuf,
    /// Path to the config document
    pub config_path: PathBuf,
    /// Path to the schedule-state document
    pub schedule_state_path: PathBuf,
    /// Path to the troubleshooting log
    pub trouble_log_path: PathBuf,
    /// Path to the resolutions log
    pub resolutions_path: PathBuf,
    /// Path to TODO.md
    pub todo_path: PathBuf,
}

impl Config {
    /// Load configuration for the user-level daemon.
    ///
    /// Uses fixed paths under the state directory. One daemon serves all of
    /// a user's apps.
    pub fn load() -> Result<Self, LifecycleError> {
        let state_dir = state_dir()?;

        Ok(Self {
            socket_path: state_dir.join("daemon.sock"),
            lock_path: state_dir.join("daemon.pid"),
            version_path: state_dir.join("daemon.version"),
            log_path: state_dir.join("daemon.log"),
            config_path: state_dir.join("config.json"),
            schedule_state_path: state_dir.join("schedule-state.json"),
            trouble_log_path: state_dir.join("troubleshooting.log"),
            resolutions_path: state_dir.join("resolutions.log"),
            todo_path: state_dir.join("TODO.md"),
            state_dir,
        })
    }
}

/// Errors during daemon startup/shutdown.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not determine state directory")]
    NoStateDir,

    #[error("another daemon already holds the lock")]
    LockFailed(std::io::Error),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("storage error: {0}")]
    Storage(#[from] ql_storage::StorageError),
}

/// Everything main() needs after startup.
pub struct StartupResult {
    pub supervisor: Arc<Supervisor>,
    pub scheduler: Arc<Scheduler>,
    pub listener: UnixListener,
    /// Lock held for the daemon's lifetime.
    pub lock_file: File,
}

/// Start the daemon: acquire the single-instance lock, load the stores,
/// bind the socket, install schedules, and kick off missed runs.
pub async fn startup(config: &Config) -> Result<StartupResult, LifecycleError> {
    std::fs::create_dir_all(&config.state_dir)?;

    // Single instance: advisory lock on the pid file. Opened without
    // truncation so a losing contender does not clobber the winner's pid.
    let lock_file = std::fs::OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(&config.lock_path)?;
    lock_file
        .try_lock_exclusive()
        .map_err(LifecycleError::LockFailed)?;
    std::fs::write(&config.lock_path, format!("{}\n", std::process::id()))?;
    std::fs::write(
        &config.version_path,
        concat!(env!("CARGO_PKG_VERSION"), "\n"),
    )?;

    // A dead daemon leaves a stale socket behind; the lock proves it is
    // ours to remove.
    if config.socket_path.exists() {
        std::fs::remove_file(&config.socket_path)?;
    }
    let listener = UnixListener::bind(&config.socket_path)?;

    let config_store = Arc::new(ConfigStore::open(&config.config_path)?);
    let schedule_state = Arc::new(ScheduleStateStore::open(&config.schedule_state_path)?);
    let trouble = TroubleshootingLog::new(&config.trouble_log_path);
    let resolutions = ResolutionsLog::new(&config.resolutions_path);

    let supervisor = Supervisor::new(
        Arc::clone(&config_store),
        Arc::clone(&schedule_state),
        trouble,
        resolutions,
        config.todo_path.clone(),
    );

    let scheduler = Arc::new(Scheduler::new());
    let now = chrono::Local::now().naive_local();
    scheduler.reload(&config_store.snapshot(), now);

    // Missed-run recovery happens in the background so the daemon is
    // reachable immediately.
    let missed = sched::missed_apps(&config_store.snapshot(), &schedule_state.snapshot(), now);
    if !missed.is_empty() {
        info!(count = missed.len(), "running missed scheduled apps");
        let sup = Arc::clone(&supervisor);
        let store = Arc::clone(&config_store);
        tokio::spawn(async move {
            for app_id in missed {
                let doc = store.snapshot();
                let Some(app) = doc.app(&app_id).cloned() else {
                    continue;
                };
                match sup.run_scheduled(&app, false).await {
                    Ok(key) => info!(key = %key, "missed run started"),
                    Err(e) => warn!(app = %app_id, error = %e, "missed run failed to start"),
                }
            }
        });
    }

    Ok(StartupResult {
        supervisor,
        scheduler,
        listener,
        lock_file,
    })
}

/// Graceful shutdown: drop the socket so clients fail fast.
pub fn shutdown(config: &Config) {
    if let Err(e) = std::fs::remove_file(&config.socket_path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(error = %e, "failed to remove socket on shutdown");
        }
    }
}
