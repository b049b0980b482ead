// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::unexpected;
use crate::client::DaemonClient;
use crate::output;
use ql_core::AppConfig;
use ql_daemon::{Request, Response};

/// Look up the stored declaration for an app id.
async fn lookup_app(client: &DaemonClient, id: &str) -> anyhow::Result<AppConfig> {
    match client.request(&Request::Apps).await? {
        Response::Apps { apps, .. } => apps
            .into_iter()
            .find(|a| a.id == id)
            .ok_or_else(|| anyhow::anyhow!("unknown app: {} (see `ql apps list`)", id)),
        other => Err(unexpected(other)),
    }
}

pub async fn start(id: &str, retry: bool, override_port: Option<u16>) -> anyhow::Result<()> {
    let client = DaemonClient::for_action().await?;
    let app = lookup_app(&client, id).await?;

    let request = Request::Start {
        id: app.id,
        name: app.name,
        port: app.port,
        path: app.path,
        command: app.command,
        retry,
        override_port,
        health_check_url: app.health_check_url,
        startup_timeout: Some(app.startup_timeout_ms),
        auto_restart: Some(app.auto_restart),
        max_restart_attempts: Some(app.max_restart_attempts),
    };
    match client.request(&request).await? {
        Response::Started { result, analysis } => {
            output::print_start_success(&result, analysis.as_ref());
            Ok(())
        }
        Response::StartFailed { failure, analysis } => {
            output::print_start_failure(&failure, analysis.as_ref());
            std::process::exit(1);
        }
        other => Err(unexpected(other)),
    }
}

pub async fn stop(id: &str) -> anyhow::Result<()> {
    let client = DaemonClient::for_query().await?;
    match client.request(&Request::Stop { id: id.to_string() }).await? {
        Response::Stopped { id } => {
            println!("Stopped {}", id);
            Ok(())
        }
        other => Err(unexpected(other)),
    }
}

pub async fn history(id: &str) -> anyhow::Result<()> {
    let client = DaemonClient::for_query().await?;
    match client
        .request(&Request::History { id: id.to_string() })
        .await?
    {
        Response::History {
            attempts,
            last_error,
        } => {
            if attempts.is_empty() {
                println!("No start attempts recorded for {}", id);
            }
            for attempt in attempts {
                println!(
                    "[{}] {:?}",
                    ql_core::format_clock_ms(attempt.timestamp_ms),
                    attempt.result
                );
                for step in attempt.steps {
                    println!("  - {}", step);
                }
            }
            if let Some(error) = last_error {
                println!("last error: {}", error);
            }
            Ok(())
        }
        other => Err(unexpected(other)),
    }
}
