// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dependency check and install endpoints.

use super::ListenCtx;
use crate::protocol::Response;
use crate::supervisor;
use std::path::Path;

pub(super) fn handle_check(path: &Path) -> Response {
    if !path.is_dir() {
        return Response::Error {
            message: format!("path not found: {}", path.display()),
        };
    }
    Response::DepsChecked {
        result: supervisor::check_deps(path),
    }
}

pub(super) async fn handle_install_start(ctx: &ListenCtx, id: &str) -> Response {
    let doc = ctx.supervisor.config_store().snapshot();
    let Some(app) = doc.app(id).cloned() else {
        return Response::Error {
            message: format!("unknown app: {}", id),
        };
    };
    match ctx
        .supervisor
        .start_install(&app.id, &app.path, &app.name)
        .await
    {
        Ok(package_manager) => Response::InstallStarted {
            status: "started".to_string(),
            package_manager,
        },
        Err(message) => Response::Error { message },
    }
}

pub(super) fn handle_install_status(ctx: &ListenCtx, id: &str) -> Response {
    match ctx.supervisor.install_status(id) {
        Some(result) => Response::InstallStatus { result },
        None => Response::Error {
            message: format!("no install job for '{}'", id),
        },
    }
}
