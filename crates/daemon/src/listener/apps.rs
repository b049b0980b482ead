// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! App CRUD and bulk import over the config document.

use super::ListenCtx;
use crate::ports;
use crate::protocol::{MigrateResult, MigrateStatus, Response};
use chrono::Local;
use ql_core::{AppConfig, AppPatch};
use ql_storage::ConfigError;

/// Reinstall schedule jobs after any config change.
fn reload_schedules(ctx: &ListenCtx) {
    let doc = ctx.supervisor.config_store().snapshot();
    ctx.scheduler.reload(&doc, Local::now().naive_local());
}

pub(super) fn handle_apps(ctx: &ListenCtx) -> Response {
    let doc = ctx.supervisor.config_store().snapshot();
    Response::Apps {
        apps: doc.apps,
        reserved_ports: doc.reserved_ports,
    }
}

pub(super) fn handle_app_add(ctx: &ListenCtx, app: AppConfig) -> Response {
    if app.id.is_empty() || app.name.is_empty() {
        return Response::Error {
            message: "app id and name are required".to_string(),
        };
    }
    let added = app.clone();
    match ctx.supervisor.config_store().mutate(|doc| doc.add_app(app)) {
        Ok(()) => {
            reload_schedules(ctx);
            Response::App { app: added }
        }
        Err(e @ (ConfigError::PortAssigned { .. } | ConfigError::PortReserved { .. })) => {
            let doc = ctx.supervisor.config_store().snapshot();
            Response::PortConflict {
                message: e.to_string(),
                suggested_port: ports::suggest(&doc, ports::DEFAULT_SUGGEST_BASE).ok(),
            }
        }
        Err(e) => Response::Error {
            message: e.to_string(),
        },
    }
}

pub(super) fn handle_app_update(ctx: &ListenCtx, id: &str, patch: AppPatch) -> Response {
    match ctx
        .supervisor
        .config_store()
        .mutate(|doc| doc.update_app(id, &patch))
    {
        Ok(app) => {
            reload_schedules(ctx);
            Response::App { app }
        }
        Err(e @ (ConfigError::PortAssigned { .. } | ConfigError::PortReserved { .. })) => {
            let doc = ctx.supervisor.config_store().snapshot();
            Response::PortConflict {
                message: e.to_string(),
                suggested_port: ports::suggest(&doc, ports::DEFAULT_SUGGEST_BASE).ok(),
            }
        }
        Err(e) => Response::Error {
            message: e.to_string(),
        },
    }
}

pub(super) fn handle_app_remove(ctx: &ListenCtx, id: &str) -> Response {
    match ctx.supervisor.config_store().mutate(|doc| doc.remove_app(id)) {
        Ok(removed) => {
            reload_schedules(ctx);
            ctx.supervisor.forget_schedule_state(&removed.id);
            Response::Ok
        }
        Err(e) => Response::Error {
            message: e.to_string(),
        },
    }
}

pub(super) fn handle_migrate(ctx: &ListenCtx, apps: Vec<AppConfig>) -> Response {
    let mut results = Vec::with_capacity(apps.len());
    for app in apps {
        let id = app.id.clone();
        let outcome = ctx.supervisor.config_store().mutate(|doc| doc.add_app(app));
        results.push(match outcome {
            Ok(()) => MigrateResult {
                id,
                status: MigrateStatus::Imported,
                reason: None,
            },
            Err(e) => MigrateResult {
                id,
                status: MigrateStatus::Skipped,
                reason: Some(e.to_string()),
            },
        });
    }
    reload_schedules(ctx);
    Response::Migrated { results }
}
