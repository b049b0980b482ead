// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Port broker: reconcile registry reservations, app-declared ports, and
//! live OS occupancy.
//!
//! The registry (config document) answers "who is allowed here"; a bind
//! probe answers "who is actually here". `available` requires both to
//! agree. `suggest` is registry-only by contract — it never probes the OS.

use crate::protocol::PortCheckResult;
use ql_core::ProcessIdent;
use ql_storage::{ConfigDocument, PortOwner};
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

/// Default base for port suggestions.
pub const DEFAULT_SUGGEST_BASE: u16 = 5174;

#[derive(Debug, Error)]
pub enum PortError {
    #[error("no free port at or above {0}")]
    Exhausted(u16),
}

/// Probe the OS by attempting to bind; a failed bind means in use.
pub async fn is_port_in_use(port: u16) -> bool {
    TcpListener::bind(("127.0.0.1", port)).await.is_err()
}

/// Smallest port >= `base` that is neither reserved nor assigned to any app
/// in the document. Does not probe the OS.
pub fn suggest(doc: &ConfigDocument, base: u16) -> Result<u16, PortError> {
    let mut port = base.max(1);
    loop {
        if doc.port_owner(port, None).is_none() {
            return Ok(port);
        }
        if port == u16::MAX {
            return Err(PortError::Exhausted(base));
        }
        port += 1;
    }
}

/// Full broker check: registry and OS, with a suggestion and (when
/// identifiable) the blocking process.
pub async fn check(doc: &ConfigDocument, port: u16, exclude: Option<&str>) -> PortCheckResult {
    let owner = doc.port_owner(port, exclude);
    let (registry_available, registry_reason, registry_used_by) = match &owner {
        None => (true, None, None),
        Some(PortOwner::Reserved { description }) => (
            false,
            Some("reserved".to_string()),
            Some(description.clone()),
        ),
        Some(PortOwner::App { name, .. }) => {
            (false, Some("app".to_string()), Some(name.clone()))
        }
    };

    let system_in_use = is_port_in_use(port).await;
    let available = registry_available && !system_in_use;

    let suggested_port = if available {
        None
    } else {
        suggest(doc, port.saturating_add(1)).ok()
    };

    let blocking_process = if system_in_use {
        identify(port).await
    } else {
        None
    };

    PortCheckResult {
        registry_available,
        registry_reason,
        registry_used_by,
        system_in_use,
        available,
        suggested_port,
        blocking_process,
    }
}

/// Attribute the process bound to `port`, where the platform tooling allows.
pub async fn identify(port: u16) -> Option<ProcessIdent> {
    #[cfg(unix)]
    {
        // lsof prints the listener's pid with -t; the name comes from a
        // second query so the parse stays trivial.
        let output = tokio::process::Command::new("lsof")
            .args([
                "-nP",
                "-t",
                &format!("-iTCP:{}", port),
                "-sTCP:LISTEN",
            ])
            .output()
            .await
            .ok()?;
        let pid: u32 = String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()?
            .trim()
            .parse()
            .ok()?;

        let name = tokio::process::Command::new("ps")
            .args(["-p", &pid.to_string(), "-o", "comm="])
            .output()
            .await
            .ok()
            .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "unknown".to_string());

        debug!(port, pid, name = %name, "identified blocking process");
        Some(ProcessIdent { pid, name })
    }

    #[cfg(not(unix))]
    {
        // netstat -ano lists "proto local foreign state pid"; match the
        // listening row for our port, then resolve the image name.
        let output = tokio::process::Command::new("netstat")
            .args(["-ano", "-p", "TCP"])
            .output()
            .await
            .ok()?;
        let needle = format!(":{}", port);
        let pid: u32 = String::from_utf8_lossy(&output.stdout)
            .lines()
            .filter(|l| l.contains("LISTENING"))
            .find(|l| l.split_whitespace().nth(1).is_some_and(|a| a.ends_with(&needle)))
            .and_then(|l| l.split_whitespace().last())
            .and_then(|p| p.parse().ok())?;

        let name = tokio::process::Command::new("tasklist")
            .args(["/FI", &format!("PID eq {}", pid), "/NH", "/FO", "CSV"])
            .output()
            .await
            .ok()
            .and_then(|o| {
                String::from_utf8_lossy(&o.stdout)
                    .lines()
                    .next()
                    .and_then(|l| l.split(',').next().map(|n| n.trim_matches('"').to_string()))
            })
            .unwrap_or_else(|| "unknown".to_string());

        Some(ProcessIdent { pid, name })
    }
}

/// Forcibly terminate whatever is bound to `port`. Returns success.
pub async fn free_port(port: u16) -> bool {
    let Some(ident) = identify(port).await else {
        warn!(port, "cannot free port: no owner identified");
        return false;
    };
    info!(port, pid = ident.pid, name = %ident.name, "freeing port");
    crate::prockill::kill_pid(ident.pid).await
}

#[cfg(test)]
#[path = "ports_tests.rs"]
mod tests;
