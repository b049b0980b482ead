// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Start, stop, status, and history handlers.

use super::ListenCtx;
use crate::protocol::Response;
use crate::supervisor::{self, StartError};
use ql_core::{AppConfig, ProcessKey, StartOptions};
use std::path::PathBuf;

/// Inline app declaration + options from a start request.
pub(super) struct StartParams {
    pub id: String,
    pub name: String,
    pub port: u16,
    pub path: PathBuf,
    pub command: String,
    pub retry: bool,
    pub override_port: Option<u16>,
    pub health_check_url: Option<String>,
    pub startup_timeout: Option<u64>,
    pub auto_restart: Option<bool>,
    pub max_restart_attempts: Option<u32>,
}

impl StartParams {
    /// Build the effective app config: the inline declaration, layered over
    /// the stored one when the app is known.
    fn into_config(self, stored: Option<AppConfig>) -> (AppConfig, StartOptions) {
        // Unsaved apps get a blank declaration; every load-bearing field is
        // overwritten from the request below.
        let mut app = stored.unwrap_or(AppConfig {
            id: String::new(),
            name: String::new(),
            description: String::new(),
            port: 0,
            path: PathBuf::new(),
            command: String::new(),
            icon: None,
            icon_path: None,
            colors: None,
            health_check_url: None,
            startup_timeout_ms: ql_core::app::DEFAULT_STARTUP_TIMEOUT_MS,
            auto_restart: false,
            max_restart_attempts: ql_core::app::DEFAULT_MAX_RESTART_ATTEMPTS,
            schedule: None,
            schedule_enabled: false,
            run_if_missed: false,
            schedule_command: None,
        });

        app.id = self.id;
        app.name = self.name;
        if self.port > 0 {
            app.port = self.port;
        }
        app.path = self.path;
        app.command = self.command;
        if let Some(url) = self.health_check_url {
            app.health_check_url = Some(url);
        }
        if let Some(t) = self.startup_timeout {
            app.startup_timeout_ms = t;
        }
        if let Some(ar) = self.auto_restart {
            app.auto_restart = ar;
        }
        if let Some(max) = self.max_restart_attempts {
            app.max_restart_attempts = max;
        }

        let opts = StartOptions {
            retry: self.retry,
            override_port: self.override_port,
        };
        (app, opts)
    }
}

pub(super) async fn handle_start(ctx: &ListenCtx, params: StartParams) -> Response {
    let stored = {
        let doc = ctx.supervisor.config_store().snapshot();
        doc.app(&params.id).cloned()
    };
    let (app, opts) = params.into_config(stored);

    // Past-failure analysis runs before anything else; a critical pattern
    // writes its once-a-day TODO entry even if the start then succeeds.
    let analysis = ctx.supervisor.analysis_for(&app.name);
    ctx.supervisor.maybe_auto_todo(&app.name, &analysis);

    match ctx.supervisor.start_app(app, opts).await {
        Ok(result) => Response::Started {
            result,
            analysis: Some(analysis),
        },
        Err(StartError::AlreadyRunning(message)) => Response::Error { message },
        Err(StartError::Failure(failure)) => Response::StartFailed {
            failure,
            analysis: Some(analysis),
        },
    }
}

pub(super) fn handle_stop(ctx: &ListenCtx, id: &str) -> Response {
    let key = ProcessKey::from(id);
    match ctx.supervisor.stop(&key) {
        Ok(_) => Response::Stopped { id: id.to_string() },
        Err(e) => Response::Error {
            message: e.to_string(),
        },
    }
}

pub(super) async fn handle_status(ctx: &ListenCtx) -> Response {
    let apps = supervisor::status_map(&ctx.supervisor).await;
    Response::Status { apps }
}

pub(super) fn handle_history(ctx: &ListenCtx, id: &str) -> Response {
    let (attempts, last_error) = ctx.supervisor.history_for(id);
    Response::History {
        attempts,
        last_error,
    }
}
