// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Port broker endpoints.

use super::ListenCtx;
use crate::ports;
use crate::protocol::Response;

pub(super) async fn handle_check(ctx: &ListenCtx, port: u16, exclude: Option<&str>) -> Response {
    if port == 0 {
        return Response::Error {
            message: "port must be 1-65535".to_string(),
        };
    }
    let doc = ctx.supervisor.config_store().snapshot();
    let result = ports::check(&doc, port, exclude).await;
    Response::PortChecked { result }
}

pub(super) fn handle_suggest(ctx: &ListenCtx, base: Option<u16>) -> Response {
    let doc = ctx.supervisor.config_store().snapshot();
    match ports::suggest(&doc, base.unwrap_or(ports::DEFAULT_SUGGEST_BASE)) {
        Ok(port) => Response::PortSuggested { port },
        Err(e) => Response::Error {
            message: e.to_string(),
        },
    }
}

pub(super) fn handle_reserve(ctx: &ListenCtx, port: u16, description: String) -> Response {
    if port == 0 {
        return Response::Error {
            message: "port must be 1-65535".to_string(),
        };
    }
    match ctx
        .supervisor
        .config_store()
        .mutate(|doc| doc.reserve_port(port, description))
    {
        Ok(()) => Response::Ok,
        Err(e) => Response::Error {
            message: e.to_string(),
        },
    }
}

pub(super) fn handle_release(ctx: &ListenCtx, port: u16) -> Response {
    match ctx
        .supervisor
        .config_store()
        .mutate(|doc| doc.release_port(port))
    {
        Ok(()) => Response::Ok,
        Err(e) => Response::Error {
            message: e.to_string(),
        },
    }
}
