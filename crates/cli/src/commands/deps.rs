// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::unexpected;
use crate::client::DaemonClient;
use clap::Subcommand;
use ql_daemon::{Request, Response};
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum DepsCommand {
    /// Dependency preflight for a directory
    Check { path: PathBuf },

    /// Start a dependency install for an app
    Install { id: String },

    /// Status of a running or recently finished install
    Status { id: String },
}

pub async fn run(command: DepsCommand) -> anyhow::Result<()> {
    match command {
        DepsCommand::Check { path } => check(path).await,
        DepsCommand::Install { id } => install(&id).await,
        DepsCommand::Status { id } => status(&id).await,
    }
}

async fn check(path: PathBuf) -> anyhow::Result<()> {
    let client = DaemonClient::for_query().await?;
    match client
        .request(&Request::DepsCheck {
            path,
            command: None,
        })
        .await?
    {
        Response::DepsChecked { result } => {
            println!("package.json: {}", if result.has_package_json { "yes" } else { "no" });
            println!("needs install: {}", if result.needs_install { "yes" } else { "no" });
            println!("package manager: {}", result.package_manager);
            Ok(())
        }
        other => Err(unexpected(other)),
    }
}

async fn install(id: &str) -> anyhow::Result<()> {
    let client = DaemonClient::for_action().await?;
    match client
        .request(&Request::InstallStart { id: id.to_string() })
        .await?
    {
        Response::InstallStarted {
            package_manager, ..
        } => {
            println!(
                "Install started with {} (watch it with `ql deps status {}`)",
                package_manager, id
            );
            Ok(())
        }
        other => Err(unexpected(other)),
    }
}

async fn status(id: &str) -> anyhow::Result<()> {
    let client = DaemonClient::for_query().await?;
    match client
        .request(&Request::InstallStatus { id: id.to_string() })
        .await?
    {
        Response::InstallStatus { result } => {
            println!("status: {:?}", result.status);
            if let Some(duration) = result.duration_ms {
                println!("duration: {}", ql_core::format_elapsed_ms(duration));
            }
            if let Some(code) = result.exit_code {
                println!("exit code: {}", code);
            }
            for line in result.logs {
                println!("  {}", line);
            }
            Ok(())
        }
        other => Err(unexpected(other)),
    }
}
