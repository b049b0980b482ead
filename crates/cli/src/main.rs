// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! QuickLaunch CLI (ql)
//!
//! Talks to the qld daemon over its Unix socket. Action commands start the
//! daemon on demand; query commands fail fast when it is not running.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod client;
mod commands;
mod daemon_process;
mod output;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "ql", version, about = "QuickLaunch: local dev-process supervisor")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Status of every configured app, including externally-started ones
    Status,

    /// Start an app by id
    Start {
        id: String,
        /// Try to free a conflicting port before giving up
        #[arg(long)]
        retry: bool,
        /// Start on this port instead of the declared one
        #[arg(long)]
        port: Option<u16>,
    },

    /// Stop a managed process (append `:sync` for a hybrid app's task)
    Stop { id: String },

    /// Startup attempt history for an app
    History { id: String },

    /// Manage app declarations
    Apps {
        #[command(subcommand)]
        command: commands::apps::AppsCommand,
    },

    /// Port registry and occupancy
    Ports {
        #[command(subcommand)]
        command: commands::ports::PortsCommand,
    },

    /// Dependency checks and installs
    Deps {
        #[command(subcommand)]
        command: commands::deps::DepsCommand,
    },

    /// Schedules: show, enable, run
    Schedule {
        #[command(subcommand)]
        command: commands::schedule::ScheduleCommand,
    },

    /// TODO.md inventory
    Todos,

    /// Triage a TODO item
    Triage {
        /// Item text (use the exact text from `ql todos`)
        text: String,
        /// What to do with it
        #[arg(long, value_parser = ["parking", "implement", "dontdo"])]
        action: String,
    },

    /// Resolutions log
    Resolutions {
        #[command(subcommand)]
        command: commands::todos::ResolutionsCommand,
    },

    /// Daemon lifecycle
    Daemon {
        #[command(subcommand)]
        command: commands::daemon::DaemonCommand,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Status => commands::status::status().await,
        Commands::Start { id, retry, port } => commands::start::start(&id, retry, port).await,
        Commands::Stop { id } => commands::start::stop(&id).await,
        Commands::History { id } => commands::start::history(&id).await,
        Commands::Apps { command } => commands::apps::run(command).await,
        Commands::Ports { command } => commands::ports::run(command).await,
        Commands::Deps { command } => commands::deps::run(command).await,
        Commands::Schedule { command } => commands::schedule::run(command).await,
        Commands::Todos => commands::todos::todos().await,
        Commands::Triage { text, action } => commands::todos::triage(text, &action).await,
        Commands::Resolutions { command } => commands::todos::resolutions(command).await,
        Commands::Daemon { command } => commands::daemon::run(command).await,
    }
}
