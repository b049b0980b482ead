// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI subcommand handlers, one module per area.

pub mod apps;
pub mod daemon;
pub mod deps;
pub mod ports;
pub mod schedule;
pub mod start;
pub mod status;
pub mod todos;

use ql_daemon::Response;

/// Map an unexpected response to an error, surfacing daemon-side messages.
pub(crate) fn unexpected(response: Response) -> anyhow::Error {
    match response {
        Response::Error { message } => anyhow::anyhow!(message),
        other => anyhow::anyhow!("unexpected response from daemon: {:?}", other),
    }
}
