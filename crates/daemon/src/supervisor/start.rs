// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The interactive start sequence: preflight, spawn, early-crash window,
//! health poll.
//!
//! Preflight failures short-circuit with a structured [`StartFailure`]
//! carrying a support code and the troubleshooting trace. A health timeout
//! is not a failure: the response stays successful with status `starting`
//! and a warning, and the child is left alone.

use super::{Supervisor, SpawnSpec};
use crate::health::{self, HealthOptions};
use crate::ports;
use crate::protocol::StartSuccess;
use ql_core::{
    AppConfig, AttemptResult, FailureKind, ProcessKey, ProcessStatus, StartAttempt, StartFailure,
    StartOptions, StartupErrorKind, SupportCode,
};
use ql_storage::LogLevel;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Post-spawn delay before checking for an immediate crash.
const EARLY_CRASH_WINDOW: Duration = Duration::from_millis(500);

/// Delay after freeing a port before continuing.
const PORT_FREE_SETTLE: Duration = Duration::from_millis(500);

/// Outcome of a rejected start.
#[derive(Debug)]
pub enum StartError {
    /// Client error (409-ish): the key is already active.
    AlreadyRunning(String),
    /// Structured preflight/startup failure (400/500-ish).
    Failure(Box<StartFailure>),
}

impl Supervisor {
    /// Run the full start sequence for an interactive launch.
    pub async fn start_app(
        self: &Arc<Self>,
        app: AppConfig,
        opts: StartOptions,
    ) -> Result<StartSuccess, StartError> {
        let key = ProcessKey::app(&app.id);
        let mut steps: Vec<String> = Vec::new();
        let begun = std::time::Instant::now();

        // 1. Reject if already active; drop a terminal leftover.
        if let Some(existing) = self.table.get(&key) {
            if existing.status.is_active() {
                return Err(StartError::AlreadyRunning(format!(
                    "'{}' is already {}",
                    app.name, existing.status
                )));
            }
            self.table.remove(&key);
        }

        let port = opts.override_port.unwrap_or(app.port);
        let mut app = app;
        app.port = port;

        // 2. Port check.
        if port > 0 {
            if let Err(failure) = self.preflight_port(&app, port, &opts, &mut steps).await {
                self.record_failed_attempt(&app.id, &steps, AttemptResult::Failed);
                return Err(StartError::Failure(failure));
            }
        }

        // 3. Path check.
        if !app.path.is_dir() {
            let message = format!("Path not found: {}", app.path.display());
            steps.push(message.clone());
            self.trouble.append(
                LogLevel::Error,
                &app.name,
                &message,
                Some(&json!({ "path": app.path })),
            );
            self.record_failed_attempt(&app.id, &steps, AttemptResult::Failed);
            return Err(StartError::Failure(Box::new(
                StartFailure::new(FailureKind::PathNotFound, SupportCode::PathMissing, message)
                    .with_trace(steps)
                    .with_suggestion("Check that the app directory still exists and update the path in its config"),
            )));
        }
        steps.push("path exists".to_string());

        // 4. Package manifest / dependency preflight.
        if super::needs_node_modules(&app.command) {
            if let Err(failure) = self.preflight_node_deps(&app, &mut steps) {
                return Err(StartError::Failure(failure));
            }
        }

        // 5. Spawn.
        let spec = SpawnSpec {
            key: key.clone(),
            config: app.clone(),
            command: app.command.clone(),
            port,
            initial_status: ProcessStatus::Starting,
            is_scheduled: false,
            is_manual: true,
        };
        let pid = match self.spawn_into_table(spec).await {
            Ok(pid) => pid,
            Err(e) => {
                let message = format!("Failed to spawn '{}': {}", app.command, e);
                steps.push(message.clone());
                self.trouble.append(LogLevel::Error, &app.name, &message, None);
                self.record_failed_attempt(&app.id, &steps, AttemptResult::Failed);
                let code = if e.kind() == std::io::ErrorKind::NotFound {
                    SupportCode::FileMissing
                } else {
                    SupportCode::Unknown
                };
                return Err(StartError::Failure(Box::new(
                    StartFailure::new(FailureKind::Exception, code, message)
                        .with_trace(steps)
                        .with_suggestion("Check that the command's executable is installed and on PATH"),
                )));
            }
        };
        steps.push(format!("spawned pid {}", pid));
        self.trouble.append(
            LogLevel::Info,
            &app.name,
            "Started",
            Some(&json!({ "pid": pid, "port": port })),
        );

        // 6. Early-crash window.
        tokio::time::sleep(EARLY_CRASH_WINDOW).await;
        match self.table.get(&key) {
            None => {
                return Err(StartError::Failure(Box::new(
                    StartFailure::new(
                        FailureKind::Exception,
                        SupportCode::Unknown,
                        format!("'{}' was stopped before startup completed", app.name),
                    )
                    .with_trace(steps),
                )));
            }
            Some(entry) if entry.status == ProcessStatus::Failed => {
                return Err(StartError::Failure(self.startup_crash_failure(&app, &entry, steps)));
            }
            Some(_) => {}
        }

        // 7. Health poll; only this transitions starting -> running.
        if port > 0 {
            let health_opts = HealthOptions {
                health_url: app.health_path().to_string(),
                startup_timeout: Duration::from_millis(app.startup_timeout_ms),
                ..Default::default()
            };
            let sup = Arc::clone(self);
            let cancel_key = key.clone();
            let check =
                health::wait_for_healthy(&self.http, port, &health_opts, move || {
                    !sup.table.contains(&cancel_key)
                })
                .await;

            let Some(entry) = self.table.get(&key) else {
                return Err(StartError::Failure(Box::new(
                    StartFailure::new(
                        FailureKind::Exception,
                        SupportCode::Unknown,
                        format!("'{}' was stopped before startup completed", app.name),
                    )
                    .with_trace(steps),
                )));
            };
            if entry.status == ProcessStatus::Failed {
                return Err(StartError::Failure(self.startup_crash_failure(&app, &entry, steps)));
            }

            if check.healthy {
                self.table.transition(&key, ProcessStatus::Running);
                steps.push(format!(
                    "healthy in {}ms ({} attempts)",
                    check.elapsed_ms, check.attempts
                ));
                self.record_attempt(&app.id, &steps, AttemptResult::Success);
                info!(key = %key, elapsed_ms = check.elapsed_ms, "running");
                return Ok(StartSuccess {
                    id: app.id,
                    name: app.name,
                    port,
                    pid: Some(pid),
                    status: ProcessStatus::Running,
                    health: Some(check),
                    warning: None,
                    elapsed_ms: begun.elapsed().as_millis() as u64,
                });
            }

            // Timed out: keep the child, report starting with a warning.
            let warning = format!(
                "Health check did not pass within {}ms; the app may still become ready",
                app.startup_timeout_ms
            );
            steps.push("health check timed out".to_string());
            warn!(key = %key, "health poll timed out, leaving status starting");
            self.trouble.append(
                LogLevel::Warn,
                &app.name,
                &format!("Health check timed out after {}ms", app.startup_timeout_ms),
                Some(&json!({ "port": port, "startupTimeout": app.startup_timeout_ms })),
            );
            self.record_attempt(&app.id, &steps, AttemptResult::Partial);
            return Ok(StartSuccess {
                id: app.id,
                name: app.name,
                port,
                pid: Some(pid),
                status: ProcessStatus::Starting,
                health: Some(check),
                warning: Some(warning),
                elapsed_ms: begun.elapsed().as_millis() as u64,
            });
        }

        // No server port: nothing to probe.
        self.table.transition(&key, ProcessStatus::Running);
        steps.push("no server port, skipping health check".to_string());
        self.record_attempt(&app.id, &steps, AttemptResult::Success);
        Ok(StartSuccess {
            id: app.id,
            name: app.name,
            port: 0,
            pid: Some(pid),
            status: ProcessStatus::Running,
            health: None,
            warning: None,
            elapsed_ms: begun.elapsed().as_millis() as u64,
        })
    }

    /// Port preflight, including the `retry` path that tries to free the
    /// port first.
    async fn preflight_port(
        self: &Arc<Self>,
        app: &AppConfig,
        port: u16,
        opts: &StartOptions,
        steps: &mut Vec<String>,
    ) -> Result<(), Box<StartFailure>> {
        if !ports::is_port_in_use(port).await {
            steps.push(format!("port {} is free", port));
            return Ok(());
        }

        if opts.retry {
            steps.push(format!("port {} in use, attempting to free it", port));
            let freed = ports::free_port(port).await;
            if freed {
                tokio::time::sleep(PORT_FREE_SETTLE).await;
            }
            if freed && !ports::is_port_in_use(port).await {
                steps.push(format!("port {} freed", port));
                return Ok(());
            }
            let message = format!("Port {} still in use after freeing it", port);
            self.trouble.append(
                LogLevel::Error,
                &app.name,
                &format!("Port {} in use after retry", port),
                Some(&json!({ "port": port })),
            );
            steps.push(message.clone());
            return Err(Box::new(
                StartFailure::new(FailureKind::PortInUse, SupportCode::PortInUseAfterRetry, message)
                    .with_trace(steps.clone())
                    .with_suggestion("The blocking process would not die; stop it manually or pick another port"),
            ));
        }

        let blocking = ports::identify(port).await;
        let alternative = ports::suggest(&self.config_store.snapshot(), port.saturating_add(1)).ok();
        let message = match &blocking {
            Some(p) => format!("Port {} in use by {} (pid {})", port, p.name, p.pid),
            None => format!("Port {} in use", port),
        };
        steps.push(message.clone());
        self.trouble.append(
            LogLevel::Error,
            &app.name,
            &message,
            Some(&json!({ "port": port, "pid": blocking.as_ref().map(|p| p.pid) })),
        );

        let mut failure =
            StartFailure::new(FailureKind::PortInUse, SupportCode::PortInUse, message)
                .with_trace(steps.clone())
                .with_suggestion(
                    "Retry to free the port automatically, or start on the suggested alternative",
                )
                .retryable();
        if let Some(alt) = alternative {
            failure = failure.with_alternative(alt);
        }
        if let Some(p) = blocking {
            failure = failure.with_blocking_process(p);
        }
        Err(Box::new(failure))
    }

    /// Manifest and dependency-directory preflight for node-ish commands.
    fn preflight_node_deps(
        self: &Arc<Self>,
        app: &AppConfig,
        steps: &mut Vec<String>,
    ) -> Result<(), Box<StartFailure>> {
        if !app.path.join("package.json").is_file() {
            let message = format!("package.json not found in {}", app.path.display());
            steps.push(message.clone());
            self.trouble.append(
                LogLevel::Error,
                &app.name,
                &message,
                Some(&json!({ "path": app.path })),
            );
            self.record_failed_attempt(&app.id, steps, AttemptResult::Failed);
            return Err(Box::new(
                StartFailure::new(FailureKind::MissingManifest, SupportCode::ManifestMissing, message)
                    .with_trace(steps.clone())
                    .with_suggestion("The command expects a node package here; check the app path"),
            ));
        }
        steps.push("package.json present".to_string());

        if !app.path.join("node_modules").is_dir() {
            let package_manager = super::install::detect_package_manager(&app.path);
            let message = format!("Missing node_modules in {}", app.path.display());
            steps.push(message.clone());
            self.trouble.append(
                LogLevel::Error,
                &app.name,
                &message,
                Some(&json!({ "path": app.path, "packageManager": package_manager })),
            );
            self.record_failed_attempt(&app.id, steps, AttemptResult::NeedsInstall);
            return Err(Box::new(
                StartFailure::new(
                    FailureKind::MissingDependencies,
                    SupportCode::DependenciesMissing,
                    message,
                )
                .with_trace(steps.clone())
                .with_suggestion(format!("Run `{} install` and start again", package_manager))
                .with_install_hint(package_manager),
            ));
        }
        steps.push("node_modules present".to_string());
        Ok(())
    }

    /// Build the failure envelope for a crash caught during startup.
    fn startup_crash_failure(
        &self,
        app: &AppConfig,
        entry: &ql_core::ProcessEntry,
        mut steps: Vec<String>,
    ) -> Box<StartFailure> {
        let (kind, code, message) = match &entry.error {
            Some(err) => {
                let (kind, code) = match err.kind {
                    StartupErrorKind::PortInUse => {
                        (FailureKind::PortInUse, SupportCode::PortInUse)
                    }
                    StartupErrorKind::MissingModule => {
                        (FailureKind::MissingDependencies, SupportCode::DependenciesMissing)
                    }
                    StartupErrorKind::PathNotFound => {
                        (FailureKind::PathNotFound, SupportCode::PathMissing)
                    }
                };
                (kind, code, err.message.clone())
            }
            None => (
                FailureKind::StartupCrash,
                SupportCode::Unknown,
                format!(
                    "'{}' exited with code {} during startup",
                    app.name,
                    entry
                        .exit_code
                        .map_or_else(|| "signal".to_string(), |c| c.to_string())
                ),
            ),
        };
        steps.push("process crashed during startup".to_string());
        Box::new(
            StartFailure::new(kind, code, message)
                .with_trace(steps)
                .with_suggestion("Inspect the captured output below for the root cause")
                .with_logs(entry.logs.tail_formatted(10)),
        )
    }

    fn record_attempt(&self, app_id: &str, steps: &[String], result: AttemptResult) {
        self.history.lock().record(
            app_id,
            StartAttempt {
                timestamp_ms: self.now_ms(),
                steps: steps.to_vec(),
                result,
            },
        );
    }

    fn record_failed_attempt(&self, app_id: &str, steps: &[String], result: AttemptResult) {
        self.record_attempt(app_id, steps, result);
        if let Some(last) = steps.last() {
            self.history.lock().set_last_error(app_id, last.clone());
        }
    }
}

#[cfg(test)]
#[path = "start_tests.rs"]
mod tests;
