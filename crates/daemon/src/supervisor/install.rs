// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dependency preflight and install jobs.
//!
//! Install jobs run `<pm> install` with captured output; finished jobs stay
//! queryable for a short expiry window, then vanish from the map.

use super::Supervisor;
use crate::protocol::{DepsCheckResult, InstallState, InstallStatusEntry};
use ql_core::{LogRing, LogStream};
use ql_storage::LogLevel;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

/// Finished install jobs self-expire this long after exit.
pub const INSTALL_EXPIRY: Duration = Duration::from_secs(30);

/// Lines surfaced from an install job's log.
const INSTALL_LOG_TAIL: usize = 20;

/// Command tokens that imply a node package directory.
///
/// A pluggable predicate rather than a hard-wired `npm` comparison: anything
/// that resolves modules out of `node_modules` qualifies.
const NODE_COMMAND_TOKENS: &[&str] = &["npm", "npx", "yarn", "pnpm", "bun", "node"];

/// Whether the command's first token implies a `node_modules` preflight.
pub fn needs_node_modules(command: &str) -> bool {
    command
        .split_whitespace()
        .next()
        .is_some_and(|tok| NODE_COMMAND_TOKENS.contains(&tok))
}

/// Infer the package manager from lockfile presence.
pub fn detect_package_manager(path: &Path) -> &'static str {
    if path.join("yarn.lock").is_file() {
        "yarn"
    } else if path.join("pnpm-lock.yaml").is_file() {
        "pnpm"
    } else {
        "npm"
    }
}

/// Dependency preflight for a directory.
pub fn check_deps(path: &Path) -> DepsCheckResult {
    let has_package_json = path.join("package.json").is_file();
    let needs_install = has_package_json && !path.join("node_modules").is_dir();
    DepsCheckResult {
        needs_install,
        has_package_json,
        package_manager: detect_package_manager(path).to_string(),
    }
}

/// One running or recently finished install.
pub(crate) struct InstallJob {
    pub package_manager: String,
    pub state: InstallState,
    pub logs: LogRing,
    pub exit_code: Option<i64>,
    pub started_at_ms: u64,
    pub finished_at_ms: Option<u64>,
}

impl Supervisor {
    /// Start a dependency install for an app. Returns the package manager
    /// used, or an error message when one is already running.
    pub async fn start_install(
        self: &Arc<Self>,
        app_id: &str,
        path: &Path,
        app_name: &str,
    ) -> Result<String, String> {
        self.prune_installs();
        {
            let installs = self.installs.lock();
            if installs
                .get(app_id)
                .is_some_and(|j| j.state == InstallState::Running)
            {
                return Err(format!("install already running for '{}'", app_id));
            }
        }
        if !path.join("package.json").is_file() {
            return Err(format!("no package.json in {}", path.display()));
        }

        let pm = detect_package_manager(path).to_string();
        let mut cmd = tokio::process::Command::new(&pm);
        cmd.arg("install")
            .current_dir(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = cmd.spawn().map_err(|e| format!("failed to spawn {} install: {}", pm, e))?;
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        self.installs.lock().insert(
            app_id.to_string(),
            InstallJob {
                package_manager: pm.clone(),
                state: InstallState::Running,
                logs: LogRing::default(),
                exit_code: None,
                started_at_ms: self.now_ms(),
                finished_at_ms: None,
            },
        );
        info!(app_id, pm = %pm, "install started");
        self.trouble.append(
            LogLevel::Info,
            app_name,
            &format!("Dependency install started ({})", pm),
            None,
        );

        if let Some(out) = stdout {
            self.spawn_install_reader(app_id.to_string(), LogStream::Stdout, out);
        }
        if let Some(err) = stderr {
            self.spawn_install_reader(app_id.to_string(), LogStream::Stderr, err);
        }

        let sup = Arc::clone(self);
        let id = app_id.to_string();
        tokio::spawn(async move {
            let exit_code = match child.wait().await {
                Ok(status) => status.code().map(i64::from),
                Err(e) => {
                    warn!(app_id = %id, error = %e, "install wait() failed");
                    None
                }
            };
            let now = sup.now_ms();
            let mut installs = sup.installs.lock();
            if let Some(job) = installs.get_mut(&id) {
                job.exit_code = exit_code;
                job.finished_at_ms = Some(now);
                job.state = if exit_code == Some(0) {
                    InstallState::Completed
                } else {
                    InstallState::Failed
                };
            }
        });

        Ok(pm)
    }

    fn spawn_install_reader(
        self: &Arc<Self>,
        app_id: String,
        stream: LogStream,
        source: impl tokio::io::AsyncRead + Unpin + Send + 'static,
    ) {
        let sup = Arc::clone(self);
        tokio::spawn(async move {
            let mut lines = BufReader::new(source).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                let now = sup.now_ms();
                let mut installs = sup.installs.lock();
                if let Some(job) = installs.get_mut(&app_id) {
                    job.logs.push(now, stream, line);
                }
            }
        });
    }

    /// Status of an install job, if it exists and has not expired.
    pub fn install_status(&self, app_id: &str) -> Option<InstallStatusEntry> {
        self.prune_installs();
        let installs = self.installs.lock();
        let job = installs.get(app_id)?;
        Some(InstallStatusEntry {
            status: job.state,
            package_manager: job.package_manager.clone(),
            logs: job.logs.tail_formatted(INSTALL_LOG_TAIL),
            exit_code: job.exit_code,
            duration_ms: job
                .finished_at_ms
                .map(|f| f.saturating_sub(job.started_at_ms)),
        })
    }

    /// Drop finished jobs past their expiry window.
    fn prune_installs(&self) {
        let now = self.now_ms();
        self.installs.lock().retain(|_, job| {
            job.finished_at_ms.is_none_or(|finished| {
                now.saturating_sub(finished) < INSTALL_EXPIRY.as_millis() as u64
            })
        });
    }

}

#[cfg(test)]
#[path = "install_tests.rs"]
mod tests;
