// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scheduler endpoints.

use super::ListenCtx;
use crate::protocol::{Response, ScheduleInfo};
use crate::sched::CronExpr;
use chrono::Local;
use ql_core::{AppConfig, AppPatch, ProcessKey};

/// Log lines surfaced with a schedule status.
const SCHEDULE_LOG_TAIL: usize = 20;

fn schedule_info(ctx: &ListenCtx, app: &AppConfig) -> ScheduleInfo {
    let record = ctx.supervisor.schedule_state().get(&app.id);
    let description = app
        .schedule
        .as_deref()
        .and_then(|s| CronExpr::parse(s).ok())
        .map(|e| e.describe());
    let next_run = ctx
        .scheduler
        .next_fire(&app.id)
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string());

    let key = if app.schedule_command.is_some() {
        ProcessKey::sync(&app.id)
    } else {
        ProcessKey::app(&app.id)
    };
    let entry = ctx.supervisor.table().get(&key);
    let running = entry
        .as_ref()
        .is_some_and(|e| e.is_scheduled && e.status.is_active());
    let recent_logs = entry
        .filter(|e| e.is_scheduled)
        .map(|e| e.logs.tail_formatted(SCHEDULE_LOG_TAIL))
        .unwrap_or_default();

    ScheduleInfo {
        id: app.id.clone(),
        name: app.name.clone(),
        schedule: app.schedule.clone(),
        schedule_enabled: app.schedule_enabled,
        run_if_missed: app.run_if_missed,
        description,
        next_run,
        last_run: record
            .as_ref()
            .and_then(|r| r.last_run)
            .map(|t| t.to_rfc3339()),
        last_exit_code: record.as_ref().and_then(|r| r.last_exit_code),
        was_manual: record.as_ref().map(|r| r.was_manual).unwrap_or(false),
        running,
        recent_logs,
    }
}

pub(super) fn handle_get(ctx: &ListenCtx, id: &str) -> Response {
    let doc = ctx.supervisor.config_store().snapshot();
    match doc.app(id) {
        Some(app) => Response::Schedule {
            info: schedule_info(ctx, app),
        },
        None => Response::Error {
            message: format!("unknown app: {}", id),
        },
    }
}

pub(super) fn handle_enable(ctx: &ListenCtx, id: &str, enabled: bool) -> Response {
    let patch = AppPatch {
        schedule_enabled: Some(enabled),
        ..Default::default()
    };
    handle_update(ctx, id, patch)
}

pub(super) fn handle_update(ctx: &ListenCtx, id: &str, patch: AppPatch) -> Response {
    // Schedule edits are config-document edits; the job table follows.
    match ctx
        .supervisor
        .config_store()
        .mutate(|doc| doc.update_app(id, &patch))
    {
        Ok(app) => {
            let doc = ctx.supervisor.config_store().snapshot();
            ctx.scheduler.reload(&doc, Local::now().naive_local());
            Response::Schedule {
                info: schedule_info(ctx, &app),
            }
        }
        Err(e) => Response::Error {
            message: e.to_string(),
        },
    }
}

pub(super) async fn handle_run(ctx: &ListenCtx, id: &str) -> Response {
    let doc = ctx.supervisor.config_store().snapshot();
    let Some(app) = doc.app(id).cloned() else {
        return Response::Error {
            message: format!("unknown app: {}", id),
        };
    };
    match ctx.supervisor.run_scheduled(&app, true).await {
        Ok(key) => Response::ScheduleRunStarted {
            key: key.to_string(),
        },
        Err(e) => Response::Error {
            message: e.to_string(),
        },
    }
}

pub(super) fn handle_list(ctx: &ListenCtx) -> Response {
    let doc = ctx.supervisor.config_store().snapshot();
    let schedules = doc
        .apps
        .iter()
        .filter(|a| a.has_schedule())
        .map(|a| schedule_info(ctx, a))
        .collect();
    Response::Schedules { schedules }
}
