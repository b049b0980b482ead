// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::unexpected;
use crate::client::DaemonClient;
use crate::output;
use clap::Subcommand;
use ql_daemon::{Request, Response};
use ql_diag::{TriageAction, TriageItem};

#[derive(Subcommand)]
pub enum ResolutionsCommand {
    /// Read the resolutions log
    List,

    /// Record a resolution (also removes the matching TODO item)
    Add {
        #[arg(long)]
        app: String,
        #[arg(long)]
        issue: String,
        /// PORT_IN_USE, PATH_NOT_FOUND, MISSING_MODULE, CRASH; inferred
        /// from the issue text when omitted
        #[arg(long)]
        error_type: Option<String>,
        #[arg(long, default_value = "")]
        explanation: String,
        #[arg(long, default_value = "")]
        notes: String,
    },
}

pub async fn todos() -> anyhow::Result<()> {
    let client = DaemonClient::for_query().await?;
    match client.request(&Request::Todos).await? {
        Response::Todos { inventory } => {
            output::print_todos(&inventory);
            Ok(())
        }
        other => Err(unexpected(other)),
    }
}

pub async fn triage(text: String, action: &str) -> anyhow::Result<()> {
    let action = match action {
        "parking" => TriageAction::Parking,
        "implement" => TriageAction::Implement,
        "dontdo" => TriageAction::Dontdo,
        other => anyhow::bail!("unknown action: {}", other),
    };

    let client = DaemonClient::for_action().await?;
    match client
        .request(&Request::Triage {
            items: vec![TriageItem {
                text,
                priority: None,
                action,
            }],
        })
        .await?
    {
        Response::Triaged { counts } => {
            let applied = counts.parking + counts.implement + counts.dontdo;
            if applied == 0 {
                anyhow::bail!("no matching TODO item found");
            }
            println!("Triaged 1 item");
            Ok(())
        }
        other => Err(unexpected(other)),
    }
}

pub async fn resolutions(command: ResolutionsCommand) -> anyhow::Result<()> {
    match command {
        ResolutionsCommand::List => {
            let client = DaemonClient::for_query().await?;
            match client.request(&Request::Resolutions).await? {
                Response::Resolutions { resolutions } => {
                    if resolutions.is_empty() {
                        println!("No resolutions recorded.");
                    }
                    for r in resolutions {
                        println!(
                            "[{}] {} {} ({:?}): {}",
                            r.date.format("%Y-%m-%d"),
                            r.app,
                            r.error_type,
                            r.disposition,
                            r.issue
                        );
                        if !r.explanation.is_empty() {
                            println!("  {}", r.explanation);
                        }
                    }
                    Ok(())
                }
                other => Err(unexpected(other)),
            }
        }
        ResolutionsCommand::Add {
            app,
            issue,
            error_type,
            explanation,
            notes,
        } => {
            let client = DaemonClient::for_action().await?;
            match client
                .request(&Request::ResolutionAdd {
                    app,
                    issue,
                    error_type,
                    explanation,
                    notes,
                })
                .await?
            {
                Response::ResolutionAdded {
                    resolution,
                    todo_removed,
                } => {
                    println!(
                        "Recorded {} resolution for {}",
                        resolution.error_type, resolution.app
                    );
                    if todo_removed {
                        println!("Matching TODO item removed");
                    }
                    Ok(())
                }
                other => Err(unexpected(other)),
            }
        }
    }
}
