// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! TODO inventory, triage, and resolution endpoints.

use super::ListenCtx;
use crate::protocol::Response;
use chrono::Utc;
use ql_diag::{apply_triage, classify_issue, ErrorType, TriageItem};
use ql_storage::{Disposition, Resolution};
use tracing::warn;

fn read_todo(ctx: &ListenCtx) -> String {
    std::fs::read_to_string(ctx.supervisor.todo_path()).unwrap_or_default()
}

fn write_todo(ctx: &ListenCtx, content: &str) -> Result<(), String> {
    std::fs::write(ctx.supervisor.todo_path(), content)
        .map_err(|e| format!("failed to write TODO.md: {}", e))
}

pub(super) fn handle_todos(ctx: &ListenCtx) -> Response {
    let inventory = ql_diag::scan(&read_todo(ctx));
    Response::Todos { inventory }
}

pub(super) fn handle_triage(ctx: &ListenCtx, items: &[TriageItem]) -> Response {
    let outcome = apply_triage(&read_todo(ctx), items);
    if let Err(message) = write_todo(ctx, &outcome.content) {
        return Response::Error { message };
    }

    // Dismissed items become cancelled resolutions so the diagnostics
    // engine stops counting them.
    for cancelled in &outcome.cancelled {
        let record = Resolution {
            date: Utc::now(),
            app: String::new(),
            issue: cancelled.issue.clone(),
            error_type: cancelled.error_type.as_str().to_string(),
            disposition: Disposition::Cancelled,
            explanation: "Dismissed during TODO triage".to_string(),
            notes: String::new(),
        };
        if let Err(e) = ctx.supervisor.resolutions().append(&record) {
            warn!(error = %e, "failed to append triage resolution");
        }
    }

    Response::Triaged {
        counts: outcome.counts,
    }
}

pub(super) fn handle_resolutions(ctx: &ListenCtx) -> Response {
    Response::Resolutions {
        resolutions: ctx.supervisor.resolutions().read_all(),
    }
}

pub(super) fn handle_resolution_add(
    ctx: &ListenCtx,
    app: String,
    issue: String,
    error_type: Option<String>,
    explanation: String,
    notes: String,
) -> Response {
    // Absent or UNKNOWN error types are auto-classified from the issue text.
    let error_type = match error_type.as_deref() {
        Some(et) if et != ErrorType::Unknown.as_str() => et.to_string(),
        _ => classify_issue(&issue).as_str().to_string(),
    };

    let resolution = Resolution {
        date: Utc::now(),
        app,
        issue: issue.clone(),
        error_type,
        disposition: Disposition::Resolved,
        explanation,
        notes,
    };
    if let Err(e) = ctx.supervisor.resolutions().append(&resolution) {
        return Response::Error {
            message: format!("failed to append resolution: {}", e),
        };
    }

    // Also retire the first matching TODO item.
    let todo_removed = match ql_diag::remove_first_matching(&read_todo(ctx), &issue) {
        Some(updated) => write_todo(ctx, &updated).is_ok(),
        None => false,
    };

    Response::ResolutionAdded {
        resolution,
        todo_removed,
    }
}
