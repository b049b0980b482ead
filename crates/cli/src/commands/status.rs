// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::unexpected;
use crate::client::DaemonClient;
use crate::output;
use ql_daemon::{Request, Response};

pub async fn status() -> anyhow::Result<()> {
    let client = DaemonClient::for_query().await?;
    match client.request(&Request::Status).await? {
        Response::Status { apps } => {
            let now_ms = std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_millis() as u64;
            output::print_status(&apps, now_ms);
            Ok(())
        }
        other => Err(unexpected(other)),
    }
}
