// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process table types: composite keys, status machine, bounded log ring.

use crate::app::AppConfig;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::time::Instant;

/// Suffix distinguishing the scheduled variant of a hybrid app.
const SYNC_SUFFIX: &str = ":sync";

/// Maximum lines kept in a process log ring.
pub const MAX_LOG_LINES: usize = 200;

/// Composite key into the process table: `appId` or `appId:sync`.
///
/// A hybrid app's long-running server and its periodic task never share a
/// key, so both may be resident at once.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProcessKey(pub String);

impl ProcessKey {
    /// Key for an app's long-running server (or a plain scheduled app).
    pub fn app(app_id: &str) -> Self {
        Self(app_id.to_string())
    }

    /// Key for the periodic task of a hybrid app.
    pub fn sync(app_id: &str) -> Self {
        Self(format!("{}{}", app_id, SYNC_SUFFIX))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The owning app id, with any `:sync` suffix stripped.
    pub fn app_id(&self) -> &str {
        self.0.strip_suffix(SYNC_SUFFIX).unwrap_or(&self.0)
    }

    pub fn is_sync(&self) -> bool {
        self.0.ends_with(SYNC_SUFFIX)
    }
}

impl fmt::Display for ProcessKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ProcessKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Status of a managed process.
///
/// `External` is synthesized for status queries only — the table never
/// stores an entry the supervisor did not spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessStatus {
    Starting,
    Running,
    Stopped,
    Failed,
    Restarting,
    Completed,
    External,
}

impl ProcessStatus {
    /// Terminal states never transition back to an active one.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProcessStatus::Stopped | ProcessStatus::Failed | ProcessStatus::Completed
        )
    }

    pub fn is_active(&self) -> bool {
        matches!(
            self,
            ProcessStatus::Starting | ProcessStatus::Running | ProcessStatus::Restarting
        )
    }

    /// Whether a transition to `next` is legal.
    ///
    /// Observers may move any active state to a terminal one at any moment,
    /// but a terminal entry is absorbing: it is replaced, never revived.
    pub fn can_transition_to(&self, next: ProcessStatus) -> bool {
        if *self == next {
            return true;
        }
        !self.is_terminal()
    }
}

impl fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProcessStatus::Starting => "starting",
            ProcessStatus::Running => "running",
            ProcessStatus::Stopped => "stopped",
            ProcessStatus::Failed => "failed",
            ProcessStatus::Restarting => "restarting",
            ProcessStatus::Completed => "completed",
            ProcessStatus::External => "external",
        };
        write!(f, "{}", s)
    }
}

/// Which stream a captured line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogStream {
    Stdout,
    Stderr,
}

/// One captured output line with a millisecond timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogLine {
    pub ts_ms: u64,
    pub stream: LogStream,
    pub line: String,
}

/// Bounded ring of captured output lines.
#[derive(Debug, Clone)]
pub struct LogRing {
    cap: usize,
    lines: VecDeque<LogLine>,
}

impl LogRing {
    pub fn new(cap: usize) -> Self {
        Self {
            cap,
            lines: VecDeque::with_capacity(cap.min(64)),
        }
    }

    pub fn push(&mut self, ts_ms: u64, stream: LogStream, line: String) {
        if self.lines.len() >= self.cap {
            self.lines.pop_front();
        }
        self.lines.push_back(LogLine {
            ts_ms,
            stream,
            line,
        });
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Last `n` lines, oldest first.
    pub fn tail(&self, n: usize) -> Vec<LogLine> {
        let skip = self.lines.len().saturating_sub(n);
        self.lines.iter().skip(skip).cloned().collect()
    }

    /// Last `n` lines rendered as `[HH:MM:SS.mmm] text`, oldest first.
    pub fn tail_formatted(&self, n: usize) -> Vec<String> {
        self.tail(n)
            .into_iter()
            .map(|l| format!("[{}] {}", crate::time_fmt::format_clock_ms(l.ts_ms), l.line))
            .collect()
    }
}

impl Default for LogRing {
    fn default() -> Self {
        Self::new(MAX_LOG_LINES)
    }
}

/// Well-known failure markers classified out of child output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StartupErrorKind {
    PortInUse,
    MissingModule,
    PathNotFound,
}

/// A structured startup error attributed from a captured output line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartupErrorInfo {
    pub kind: StartupErrorKind,
    pub message: String,
}

/// Classify a child output line into a structured startup error, if it
/// carries a well-known marker.
pub fn classify_output_line(line: &str) -> Option<StartupErrorInfo> {
    let kind = if line.contains("EADDRINUSE") {
        StartupErrorKind::PortInUse
    } else if line.contains("Cannot find module") {
        StartupErrorKind::MissingModule
    } else if line.contains("ENOENT") {
        StartupErrorKind::PathNotFound
    } else {
        return None;
    };
    Some(StartupErrorInfo {
        kind,
        message: line.trim().to_string(),
    })
}

/// Informational readiness markers some dev servers print.
///
/// These never drive status — only the health probe moves an entry to
/// `running` — but they are recorded for diagnostics.
pub fn looks_ready(line: &str) -> bool {
    line.contains("Local:") || line.contains("ready in") || line.contains("listening")
}

/// An entry in the in-memory process table.
///
/// Created on successful spawn; mutated only by the lifecycle manager
/// (status transitions) and the child's output/exit observers; removed on
/// explicit stop or when a terminal sync entry ages out.
#[derive(Debug, Clone)]
pub struct ProcessEntry {
    pub key: ProcessKey,
    pub name: String,
    /// Declared port; 0 for sync-only processes.
    pub port: u16,
    pub pid: Option<u32>,
    pub status: ProcessStatus,
    pub exit_code: Option<i64>,
    pub error: Option<StartupErrorInfo>,
    pub logs: LogRing,
    /// Wall-clock start for reporting.
    pub started_at_ms: u64,
    /// Monotonic start for run-time classification.
    pub started: Instant,
    pub finished_at_ms: Option<u64>,
    /// Snapshot of the config used at spawn, so restarts never read a
    /// mutated document.
    pub config: AppConfig,
    pub is_scheduled: bool,
    pub is_manual: bool,
    pub is_sync: bool,
    /// A readiness marker was seen on stdout (informational).
    pub ready_seen: bool,
}

impl ProcessEntry {
    /// Fresh entry in `starting` state for a just-spawned child.
    pub fn new(key: ProcessKey, config: AppConfig, port: u16, pid: u32, now_ms: u64) -> Self {
        Self {
            key,
            name: config.name.clone(),
            port,
            pid: Some(pid),
            status: ProcessStatus::Starting,
            exit_code: None,
            error: None,
            logs: LogRing::default(),
            started_at_ms: now_ms,
            started: Instant::now(),
            finished_at_ms: None,
            config,
            is_scheduled: false,
            is_manual: false,
            is_sync: false,
            ready_seen: false,
        }
    }
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
