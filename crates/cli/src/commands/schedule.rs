// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::unexpected;
use crate::client::DaemonClient;
use crate::output;
use clap::Subcommand;
use ql_daemon::{Request, Response};

#[derive(Subcommand)]
pub enum ScheduleCommand {
    /// Schedule details for one app
    Show { id: String },

    /// Enable an app's schedule
    Enable { id: String },

    /// Disable an app's schedule
    Disable { id: String },

    /// Run a scheduled app now
    Run { id: String },

    /// Overview of every scheduled app
    List,
}

pub async fn run(command: ScheduleCommand) -> anyhow::Result<()> {
    match command {
        ScheduleCommand::Show { id } => show(&id).await,
        ScheduleCommand::Enable { id } => enable(&id, true).await,
        ScheduleCommand::Disable { id } => enable(&id, false).await,
        ScheduleCommand::Run { id } => run_now(&id).await,
        ScheduleCommand::List => list().await,
    }
}

async fn show(id: &str) -> anyhow::Result<()> {
    let client = DaemonClient::for_query().await?;
    match client
        .request(&Request::ScheduleGet { id: id.to_string() })
        .await?
    {
        Response::Schedule { info } => {
            output::print_schedules(std::slice::from_ref(&info));
            if !info.recent_logs.is_empty() {
                println!("recent output:");
                for line in &info.recent_logs {
                    println!("  {}", line);
                }
            }
            Ok(())
        }
        other => Err(unexpected(other)),
    }
}

async fn enable(id: &str, enabled: bool) -> anyhow::Result<()> {
    let client = DaemonClient::for_action().await?;
    match client
        .request(&Request::ScheduleEnable {
            id: id.to_string(),
            enabled,
        })
        .await?
    {
        Response::Schedule { info } => {
            println!(
                "Schedule for {} is now {}",
                info.id,
                if info.schedule_enabled { "enabled" } else { "disabled" }
            );
            Ok(())
        }
        other => Err(unexpected(other)),
    }
}

async fn run_now(id: &str) -> anyhow::Result<()> {
    let client = DaemonClient::for_action().await?;
    match client
        .request(&Request::ScheduleRun { id: id.to_string() })
        .await?
    {
        Response::ScheduleRunStarted { key } => {
            println!("Running {} (watch it with `ql status`)", key);
            Ok(())
        }
        other => Err(unexpected(other)),
    }
}

async fn list() -> anyhow::Result<()> {
    let client = DaemonClient::for_query().await?;
    match client.request(&Request::Schedules).await? {
        Response::Schedules { schedules } => {
            output::print_schedules(&schedules);
            Ok(())
        }
        other => Err(unexpected(other)),
    }
}
