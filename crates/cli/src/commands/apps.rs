// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::unexpected;
use crate::client::DaemonClient;
use clap::Subcommand;
use ql_core::AppConfig;
use ql_daemon::{Request, Response};
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum AppsCommand {
    /// List declared apps and reserved ports
    List,

    /// Declare a new app
    Add {
        #[arg(long)]
        id: String,
        #[arg(long)]
        name: String,
        /// Server port; omit for scheduled-only apps
        #[arg(long, default_value_t = 0)]
        port: u16,
        #[arg(long)]
        path: PathBuf,
        #[arg(long)]
        command: String,
        #[arg(long, default_value = "")]
        description: String,
    },

    /// Remove an app declaration
    Remove { id: String },

    /// Bulk-import apps from a JSON file (an array of app objects)
    Import { file: PathBuf },
}

pub async fn run(command: AppsCommand) -> anyhow::Result<()> {
    match command {
        AppsCommand::List => list().await,
        AppsCommand::Add {
            id,
            name,
            port,
            path,
            command,
            description,
        } => add(id, name, port, path, command, description).await,
        AppsCommand::Remove { id } => remove(&id).await,
        AppsCommand::Import { file } => import(&file).await,
    }
}

async fn list() -> anyhow::Result<()> {
    let client = DaemonClient::for_query().await?;
    match client.request(&Request::Apps).await? {
        Response::Apps {
            apps,
            reserved_ports,
        } => {
            if apps.is_empty() {
                println!("No apps declared.");
            }
            for app in apps {
                let port = if app.port > 0 {
                    format!(":{}", app.port)
                } else {
                    "scheduled-only".to_string()
                };
                println!("{:<20} {:<16} {}  ({})", app.id, port, app.name, app.command);
            }
            println!();
            println!("Reserved ports:");
            for (port, description) in reserved_ports {
                println!("  {:<6} {}", port, description);
            }
            Ok(())
        }
        other => Err(unexpected(other)),
    }
}

async fn add(
    id: String,
    name: String,
    port: u16,
    path: PathBuf,
    command: String,
    description: String,
) -> anyhow::Result<()> {
    let app: AppConfig = serde_json::from_value(serde_json::json!({
        "id": id,
        "name": name,
        "port": port,
        "path": path,
        "command": command,
        "description": description,
    }))?;

    let client = DaemonClient::for_action().await?;
    match client.request(&Request::AppAdd { app }).await? {
        Response::App { app } => {
            println!("Added {} ({})", app.id, app.name);
            Ok(())
        }
        Response::PortConflict {
            message,
            suggested_port,
        } => {
            let hint = suggested_port
                .map(|p| format!("; try --port {}", p))
                .unwrap_or_default();
            Err(anyhow::anyhow!("{}{}", message, hint))
        }
        other => Err(unexpected(other)),
    }
}

async fn remove(id: &str) -> anyhow::Result<()> {
    let client = DaemonClient::for_action().await?;
    match client
        .request(&Request::AppRemove { id: id.to_string() })
        .await?
    {
        Response::Ok => {
            println!("Removed {}", id);
            Ok(())
        }
        other => Err(unexpected(other)),
    }
}

async fn import(file: &PathBuf) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(file)?;
    let apps: Vec<AppConfig> = serde_json::from_str(&content)?;

    let client = DaemonClient::for_action().await?;
    match client.request(&Request::AppsMigrate { apps }).await? {
        Response::Migrated { results } => {
            for result in results {
                match result.reason {
                    Some(reason) => println!("{:<20} {:?} ({})", result.id, result.status, reason),
                    None => println!("{:<20} {:?}", result.id, result.status),
                }
            }
            Ok(())
        }
        other => Err(unexpected(other)),
    }
}
