// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only structured troubleshooting log.
//!
//! One line per lifecycle event of interest:
//!
//! ```text
//! [2026-08-01T09:15:02.123Z] [ERROR] [Web App] Port 5173 in use {"port":5173}
//! ```
//!
//! Exit lines must carry both `exitCode` and `normalTermination` in the
//! details so later analyses can discount clean exits. Appends are
//! best-effort — logging must not break the lifecycle. The file grows
//! without bound; rotation is external.

use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use serde_json::Value;
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::sync::OnceLock;
use tracing::warn;

/// Severity of a troubleshooting-log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "INFO" => Some(LogLevel::Info),
            "WARN" => Some(LogLevel::Warn),
            "ERROR" => Some(LogLevel::Error),
            _ => None,
        }
    }

    /// WARN and ERROR lines participate in failure analysis.
    pub fn is_failure_level(&self) -> bool {
        matches!(self, LogLevel::Warn | LogLevel::Error)
    }
}

/// A parsed troubleshooting-log line.
#[derive(Debug, Clone, PartialEq)]
pub struct TroubleEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub app: String,
    pub message: String,
    pub details: Option<Value>,
}

impl TroubleEntry {
    /// True when the details mark this exit as a normal termination.
    pub fn is_normal_termination(&self) -> bool {
        self.details
            .as_ref()
            .and_then(|d| d.get("normalTermination"))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

#[allow(clippy::unwrap_used)] // pattern is a literal
fn line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\[([^\]]+)\] \[(INFO|WARN|ERROR)\] \[([^\]]+)\] (.*)$").unwrap()
    })
}

/// Split a message body into text and a trailing JSON details object.
///
/// The message itself may contain braces, so candidate `{` offsets are tried
/// left to right until one parses as a complete JSON suffix.
fn split_details(body: &str) -> (String, Option<Value>) {
    for (idx, _) in body.char_indices().filter(|&(_, c)| c == '{') {
        let candidate = &body[idx..];
        if let Ok(value) = serde_json::from_str::<Value>(candidate) {
            return (body[..idx].trim_end().to_string(), Some(value));
        }
    }
    (body.to_string(), None)
}

/// Handle on the append-only troubleshooting log file.
#[derive(Debug, Clone)]
pub struct TroubleshootingLog {
    path: PathBuf,
}

impl TroubleshootingLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Append one event line. Best-effort: failures are logged and swallowed.
    pub fn append(&self, level: LogLevel, app: &str, message: &str, details: Option<&Value>) {
        let ts = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let line = match details {
            Some(d) => format!("[{}] [{}] [{}] {} {}", ts, level.as_str(), app, message, d),
            None => format!("[{}] [{}] [{}] {}", ts, level.as_str(), app, message),
        };
        if let Some(parent) = self.path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        match OpenOptions::new().create(true).append(true).open(&self.path) {
            Ok(mut f) => {
                if let Err(e) = writeln!(f, "{}", line) {
                    warn!(error = %e, "failed to append troubleshooting log line");
                }
            }
            Err(e) => warn!(error = %e, path = %self.path.display(), "failed to open troubleshooting log"),
        }
    }

    /// Read every parseable line, oldest first. Unparseable lines are
    /// skipped — the file is append-only and may be truncated externally.
    pub fn read_all(&self) -> Vec<TroubleEntry> {
        let file = match std::fs::File::open(&self.path) {
            Ok(f) => f,
            Err(_) => return Vec::new(),
        };
        BufReader::new(file)
            .lines()
            .map_while(Result::ok)
            .filter_map(|line| parse_line(&line))
            .collect()
    }

    /// All entries tagged with the given app label.
    pub fn entries_for_app(&self, app: &str) -> Vec<TroubleEntry> {
        self.read_all().into_iter().filter(|e| e.app == app).collect()
    }
}

fn parse_line(line: &str) -> Option<TroubleEntry> {
    let caps = line_re().captures(line)?;
    let timestamp = DateTime::parse_from_rfc3339(&caps[1]).ok()?.with_timezone(&Utc);
    let level = LogLevel::parse(&caps[2])?;
    let (message, details) = split_details(&caps[4]);
    Some(TroubleEntry {
        timestamp,
        level,
        app: caps[3].to_string(),
        message,
        details,
    })
}

#[cfg(test)]
#[path = "trouble_log_tests.rs"]
mod tests;
