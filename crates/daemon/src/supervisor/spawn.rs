// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Child spawning, output observers, exit classification, and the
//! auto-restart policy.
//!
//! Each spawned child gets two reader tasks (stdout/stderr into the entry's
//! log ring) and one exit waiter. All of them publish into the mutex-guarded
//! process table; none of them may revive a terminal entry.

use super::Supervisor;
use ql_core::{
    exit, AppConfig, ExitClass, LogStream, ProcessEntry, ProcessKey, ProcessStatus,
    RestartTracker, RESTART_DELAY, STABILITY_WINDOW,
};
use ql_storage::LogLevel;
use serde_json::json;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

/// Everything needed to spawn one managed child.
pub struct SpawnSpec {
    pub key: ProcessKey,
    /// Config snapshot stored on the entry; restarts read this, never the
    /// live document.
    pub config: AppConfig,
    /// Effective command line (may differ from `config.command` for
    /// scheduled runs).
    pub command: String,
    /// Effective port (0 for sync processes).
    pub port: u16,
    pub initial_status: ProcessStatus,
    pub is_scheduled: bool,
    pub is_manual: bool,
}

impl Supervisor {
    /// Spawn the child, insert its table entry, and wire up the observers.
    /// Returns the child's pid.
    pub(crate) async fn spawn_into_table(
        self: &Arc<Self>,
        spec: SpawnSpec,
    ) -> std::io::Result<u32> {
        let argv: Vec<String> = spec.command.split_whitespace().map(String::from).collect();
        if argv.is_empty() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "empty command",
            ));
        }

        // Windows needs a shell (npm and friends are .cmd shims) and a
        // hidden window; unix gets a direct exec in its own process group.
        #[cfg(unix)]
        let mut cmd = {
            let mut cmd = Command::new(&argv[0]);
            cmd.args(&argv[1..]).process_group(0);
            cmd
        };
        #[cfg(windows)]
        let mut cmd = {
            const CREATE_NO_WINDOW: u32 = 0x0800_0000;
            let mut cmd = Command::new("cmd");
            cmd.arg("/C").arg(&spec.command).creation_flags(CREATE_NO_WINDOW);
            cmd
        };
        cmd.current_dir(&spec.config.path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = cmd.spawn()?;
        let pid = child.id().unwrap_or_default();

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let mut entry = ProcessEntry::new(
            spec.key.clone(),
            spec.config,
            spec.port,
            pid,
            self.now_ms(),
        );
        entry.status = spec.initial_status;
        entry.is_scheduled = spec.is_scheduled;
        entry.is_manual = spec.is_manual;
        entry.is_sync = spec.key.is_sync();
        self.table.insert(entry);

        info!(key = %spec.key, pid, command = %spec.command, "spawned");

        if let Some(stdout) = stdout {
            self.spawn_reader(spec.key.clone(), LogStream::Stdout, stdout);
        }
        if let Some(stderr) = stderr {
            self.spawn_reader(spec.key.clone(), LogStream::Stderr, stderr);
        }
        self.spawn_exit_waiter(spec.key.clone(), child);

        Ok(pid)
    }

    fn spawn_reader(
        self: &Arc<Self>,
        key: ProcessKey,
        stream: LogStream,
        source: impl tokio::io::AsyncRead + Unpin + Send + 'static,
    ) {
        let sup = Arc::clone(self);
        tokio::spawn(async move {
            let mut lines = BufReader::new(source).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                sup.table.append_log(&key, sup.now_ms(), stream, &line);
            }
        });
    }

    fn spawn_exit_waiter(self: &Arc<Self>, key: ProcessKey, mut child: Child) {
        let sup = Arc::clone(self);
        tokio::spawn(async move {
            let exit_code: Option<i64> = match child.wait().await {
                Ok(status) => status.code().map(i64::from),
                Err(e) => {
                    warn!(key = %key, error = %e, "wait() failed");
                    None
                }
            };
            sup.handle_exit(&key, exit_code).await;
        });
    }

    /// Exit observer: classify the exit and drive the restart policy.
    ///
    /// Stop removes the entry before killing, so an exit for a missing key
    /// is a no-op by design.
    pub(crate) async fn handle_exit(self: &Arc<Self>, key: &ProcessKey, exit_code: Option<i64>) {
        let Some(entry) = self.table.get(key) else {
            debug!(key = %key, "exit for removed entry, ignoring");
            return;
        };
        let now_ms = self.now_ms();
        let run_time = entry.started.elapsed();
        self.table.set_exit(key, exit_code, now_ms);

        if entry.is_scheduled {
            self.finish_scheduled(key, &entry, exit_code).await;
            return;
        }

        let class = exit::classify(exit_code, run_time);
        let code_str = exit_code.map_or_else(|| "signal".to_string(), |c| c.to_string());

        match class {
            ExitClass::NormalTermination => {
                self.table.transition(key, ProcessStatus::Stopped);
                info!(key = %key, code = %code_str, "normal termination");
                self.trouble.append(
                    LogLevel::Info,
                    &entry.name,
                    &format!("{} exited with code {}", entry.name, code_str),
                    Some(&json!({ "exitCode": exit_code, "normalTermination": true })),
                );
            }
            ExitClass::StartupCrash => {
                self.table.transition(key, ProcessStatus::Failed);
                warn!(key = %key, code = %code_str, "startup crash");
                self.trouble.append(
                    LogLevel::Error,
                    &entry.name,
                    &format!("{} exited with code {} during startup", entry.name, code_str),
                    Some(&json!({
                        "exitCode": exit_code,
                        "normalTermination": false,
                        "startupCrash": true,
                    })),
                );
                let mut history = self.history.lock();
                history.record(
                    key.app_id(),
                    ql_core::StartAttempt {
                        timestamp_ms: now_ms,
                        steps: vec![
                            format!("spawned pid {}", entry.pid.unwrap_or_default()),
                            format!("crashed with code {} within the startup window", code_str),
                        ],
                        result: ql_core::AttemptResult::Failed,
                    },
                );
                history.set_last_error(key.app_id(), format!("startup crash (code {})", code_str));
            }
            ExitClass::RuntimeCrash => {
                self.trouble.append(
                    LogLevel::Error,
                    &entry.name,
                    &format!("{} exited with code {}", entry.name, code_str),
                    Some(&json!({ "exitCode": exit_code, "normalTermination": false })),
                );
                if entry.config.auto_restart {
                    self.attempt_restart(key, &entry, now_ms).await;
                } else {
                    self.table.transition(key, ProcessStatus::Failed);
                    warn!(key = %key, code = %code_str, "runtime crash, restart disabled");
                }
            }
        }
    }

    async fn finish_scheduled(self: &Arc<Self>, key: &ProcessKey, entry: &ProcessEntry, exit_code: Option<i64>) {
        let success = exit_code == Some(0);
        let status = if success {
            ProcessStatus::Completed
        } else {
            ProcessStatus::Failed
        };
        self.table.transition(key, status);

        let code_str = exit_code.map_or_else(|| "signal".to_string(), |c| c.to_string());
        if success {
            info!(key = %key, "scheduled run completed");
            self.trouble.append(
                LogLevel::Info,
                &entry.name,
                "Scheduled run completed",
                Some(&json!({ "exitCode": 0, "normalTermination": true })),
            );
        } else {
            warn!(key = %key, code = %code_str, "scheduled run failed");
            self.trouble.append(
                LogLevel::Error,
                &entry.name,
                &format!("Scheduled run exited with code {}", code_str),
                Some(&json!({ "exitCode": exit_code, "normalTermination": false })),
            );
        }

        if let Err(e) = self.schedule_state.record_run(
            key.app_id(),
            chrono::Utc::now(),
            exit_code,
            entry.is_manual,
        ) {
            warn!(key = %key, error = %e, "failed to persist schedule state");
        }
    }

    /// The restart policy: bounded attempts, cooldown once exhausted,
    /// stability reset after the replacement stays up.
    async fn attempt_restart(self: &Arc<Self>, key: &ProcessKey, entry: &ProcessEntry, now_ms: u64) {
        let app_id = key.app_id().to_string();
        let max = entry.config.max_restart_attempts;

        let allowed = {
            let mut restarts = self.restarts.lock();
            let tracker = restarts.entry(app_id.clone()).or_insert_with(RestartTracker::default);
            let allowed = tracker.can_restart(max, now_ms);
            if allowed {
                tracker.record_attempt(max, now_ms);
            }
            allowed
        };

        if !allowed {
            self.table.transition(key, ProcessStatus::Failed);
            warn!(key = %key, "auto-restart budget exhausted, cooling down");
            self.trouble.append(
                LogLevel::Warn,
                &entry.name,
                "Auto-restart budget exhausted, cooling down",
                Some(&json!({ "maxRestartAttempts": max })),
            );
            return;
        }

        let attempt = self.restarts.lock().get(&app_id).map_or(0, |t| t.attempts);
        self.table.transition(key, ProcessStatus::Restarting);
        info!(key = %key, attempt, max, "restarting after crash");
        self.trouble.append(
            LogLevel::Warn,
            &entry.name,
            &format!("Restarting after crash (attempt {}/{})", attempt, max),
            None,
        );

        let sup = Arc::clone(self);
        let key = key.clone();
        let snapshot = entry.config.clone();
        let port = entry.port;
        tokio::spawn(async move {
            tokio::time::sleep(RESTART_DELAY).await;

            // User may have stopped the app during the delay.
            if !sup.table.contains(&key) {
                debug!(key = %key, "entry removed during restart delay");
                return;
            }

            if port > 0 && crate::ports::is_port_in_use(port).await {
                warn!(key = %key, port, "port still held, trying to free it");
                crate::ports::free_port(port).await;
                tokio::time::sleep(std::time::Duration::from_millis(500)).await;
                if crate::ports::is_port_in_use(port).await {
                    sup.table.transition(&key, ProcessStatus::Failed);
                    sup.trouble.append(
                        LogLevel::Error,
                        &snapshot.name,
                        &format!("Port {} in use, restart aborted", port),
                        Some(&json!({ "port": port })),
                    );
                    return;
                }
            }

            let spec = super::SpawnSpec {
                key: key.clone(),
                config: snapshot.clone(),
                command: snapshot.command.clone(),
                port,
                initial_status: ProcessStatus::Starting,
                is_scheduled: false,
                is_manual: false,
            };
            if let Err(e) = sup.spawn_into_table(spec).await {
                sup.table.transition(&key, ProcessStatus::Failed);
                sup.trouble.append(
                    LogLevel::Error,
                    &snapshot.name,
                    &format!("Restart spawn failed: {}", e),
                    None,
                );
                return;
            }

            // Health-confirm the replacement in the background.
            if port > 0 {
                let sup2 = Arc::clone(&sup);
                let key2 = key.clone();
                let opts = crate::health::HealthOptions {
                    health_url: snapshot.health_path().to_string(),
                    startup_timeout: std::time::Duration::from_millis(snapshot.startup_timeout_ms),
                    ..Default::default()
                };
                tokio::spawn(async move {
                    let check = crate::health::wait_for_healthy(&sup2.http, port, &opts, || {
                        !sup2.table.contains(&key2)
                    })
                    .await;
                    if check.healthy {
                        sup2.table.transition(&key2, ProcessStatus::Running);
                    }
                });
            } else {
                sup.table.transition(&key, ProcessStatus::Running);
            }

            // Stability reset: a replacement that stays up restores the
            // full restart budget.
            let sup3 = Arc::clone(&sup);
            let key3 = key.clone();
            tokio::spawn(async move {
                tokio::time::sleep(STABILITY_WINDOW).await;
                sup3.reset_tracker_if_stable(&key3);
            });
        });
    }

    /// Clear the app's restart tracker when its replacement is still up.
    ///
    /// Fired by the stability timer; a replacement that crashed or was
    /// stopped in the meantime keeps its tracker (and its dwindled budget).
    pub(crate) fn reset_tracker_if_stable(&self, key: &ProcessKey) {
        if !self.table.is_active(key) {
            return;
        }
        if self.restarts.lock().remove(key.app_id()).is_some() {
            debug!(key = %key, "stable after restart, tracker cleared");
        }
    }
}

#[cfg(test)]
#[path = "spawn_tests.rs"]
mod tests;
