// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::client::{poll_interval, timeout_connect, DaemonClient};
use crate::daemon_process;
use clap::Subcommand;
use ql_daemon::protocol::PROTOCOL_VERSION;
use ql_daemon::{Request, Response};

#[derive(Subcommand)]
pub enum DaemonCommand {
    /// Start the daemon in the background
    Start,

    /// Ask the daemon to shut down
    Stop,

    /// Daemon reachability and version
    Status,
}

pub async fn run(command: DaemonCommand) -> anyhow::Result<()> {
    match command {
        DaemonCommand::Start => start().await,
        DaemonCommand::Stop => stop().await,
        DaemonCommand::Status => status().await,
    }
}

async fn start() -> anyhow::Result<()> {
    if DaemonClient::for_query().await.is_ok() {
        println!("Daemon already running");
        return Ok(());
    }

    daemon_process::start_daemon_background()?;
    let deadline = std::time::Instant::now() + timeout_connect();
    while std::time::Instant::now() < deadline {
        if DaemonClient::for_query().await.is_ok() {
            println!("Daemon started");
            return Ok(());
        }
        tokio::time::sleep(poll_interval()).await;
    }
    anyhow::bail!("daemon did not become ready; check its log");
}

async fn stop() -> anyhow::Result<()> {
    match DaemonClient::for_query().await {
        Ok(client) => {
            client.shutdown().await?;
            println!("Daemon stopping");
            Ok(())
        }
        Err(_) => {
            println!("Daemon not running");
            Ok(())
        }
    }
}

async fn status() -> anyhow::Result<()> {
    match DaemonClient::for_query().await {
        Ok(client) => {
            match client
                .request(&Request::Hello {
                    version: PROTOCOL_VERSION.to_string(),
                })
                .await?
            {
                Response::Hello { version } => {
                    println!("running (daemon version {})", version);
                    if version != PROTOCOL_VERSION {
                        println!("note: CLI version is {}, consider restarting the daemon", PROTOCOL_VERSION);
                    }
                }
                _ => println!("running"),
            }
            Ok(())
        }
        Err(_) => {
            println!("not running");
            Ok(())
        }
    }
}
