// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::unexpected;
use crate::client::DaemonClient;
use clap::Subcommand;
use ql_daemon::{Request, Response};

#[derive(Subcommand)]
pub enum PortsCommand {
    /// Check one port against the registry and the OS
    Check {
        port: u16,
        /// Ignore this app's own claim on the port
        #[arg(long)]
        exclude: Option<String>,
    },

    /// Suggest the next registry-free port
    Suggest {
        #[arg(long)]
        base: Option<u16>,
    },

    /// Reserve a port with a description
    Reserve { port: u16, description: String },

    /// Release a reservation
    Release { port: u16 },
}

pub async fn run(command: PortsCommand) -> anyhow::Result<()> {
    match command {
        PortsCommand::Check { port, exclude } => check(port, exclude).await,
        PortsCommand::Suggest { base } => suggest(base).await,
        PortsCommand::Reserve { port, description } => reserve(port, description).await,
        PortsCommand::Release { port } => release(port).await,
    }
}

async fn check(port: u16, exclude: Option<String>) -> anyhow::Result<()> {
    let client = DaemonClient::for_query().await?;
    match client.request(&Request::PortCheck { port, exclude }).await? {
        Response::PortChecked { result } => {
            if result.available {
                println!("port {} is available", port);
                return Ok(());
            }
            if let Some(reason) = &result.registry_reason {
                let owner = result.registry_used_by.as_deref().unwrap_or("unknown");
                println!("registry: taken ({} - {})", reason, owner);
            }
            if result.system_in_use {
                match &result.blocking_process {
                    Some(p) => println!("system: in use by {} (pid {})", p.name, p.pid),
                    None => println!("system: in use"),
                }
            }
            if let Some(suggested) = result.suggested_port {
                println!("suggested: {}", suggested);
            }
            Ok(())
        }
        other => Err(unexpected(other)),
    }
}

async fn suggest(base: Option<u16>) -> anyhow::Result<()> {
    let client = DaemonClient::for_query().await?;
    match client.request(&Request::PortSuggest { base }).await? {
        Response::PortSuggested { port } => {
            println!("{}", port);
            Ok(())
        }
        other => Err(unexpected(other)),
    }
}

async fn reserve(port: u16, description: String) -> anyhow::Result<()> {
    let client = DaemonClient::for_action().await?;
    match client
        .request(&Request::PortReserve { port, description })
        .await?
    {
        Response::Ok => {
            println!("Reserved {}", port);
            Ok(())
        }
        other => Err(unexpected(other)),
    }
}

async fn release(port: u16) -> anyhow::Result<()> {
    let client = DaemonClient::for_action().await?;
    match client.request(&Request::PortRelease { port }).await? {
        Response::Ok => {
            println!("Released {}", port);
            Ok(())
        }
        other => Err(unexpected(other)),
    }
}
