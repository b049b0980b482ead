// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error-type vocabulary and message classification.

use ql_core::is_normal_exit;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Classes of recurring failure tracked across the troubleshooting and
/// resolutions logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorType {
    PortInUse,
    PathNotFound,
    MissingModule,
    Crash,
    /// An auto-detected TODO block was dismissed during triage.
    AutoDetectedResolved,
    /// A hand-written TODO item was dismissed during triage.
    TodoTriaged,
    Unknown,
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::PortInUse => "PORT_IN_USE",
            ErrorType::PathNotFound => "PATH_NOT_FOUND",
            ErrorType::MissingModule => "MISSING_MODULE",
            ErrorType::Crash => "CRASH",
            ErrorType::AutoDetectedResolved => "AUTO_DETECTED_RESOLVED",
            ErrorType::TodoTriaged => "TODO_TRIAGED",
            ErrorType::Unknown => "UNKNOWN",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PORT_IN_USE" => Some(ErrorType::PortInUse),
            "PATH_NOT_FOUND" => Some(ErrorType::PathNotFound),
            "MISSING_MODULE" => Some(ErrorType::MissingModule),
            "CRASH" => Some(ErrorType::Crash),
            "AUTO_DETECTED_RESOLVED" => Some(ErrorType::AutoDetectedResolved),
            "TODO_TRIAGED" => Some(ErrorType::TodoTriaged),
            "UNKNOWN" => Some(ErrorType::Unknown),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[allow(clippy::unwrap_used)] // pattern is a literal
fn exit_code_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"exited with code (\d+)").unwrap())
}

/// Classify a troubleshooting-log message into an error type.
///
/// Order matters: the earlier rules are the more specific ones, and an exit
/// line only counts as a crash when the code is outside the normal set.
pub fn classify_message(message: &str) -> Option<ErrorType> {
    if message.contains("Port") && message.contains("in use") {
        return Some(ErrorType::PortInUse);
    }
    if message.contains("not found") || message.contains("not exist") {
        return Some(ErrorType::PathNotFound);
    }
    if message.contains("module") || message.contains("MODULE") {
        return Some(ErrorType::MissingModule);
    }
    if let Some(caps) = exit_code_re().captures(message) {
        if let Ok(code) = caps[1].parse::<i64>() {
            if !is_normal_exit(code) {
                return Some(ErrorType::Crash);
            }
        }
    }
    None
}

/// Keyword auto-classification for a resolution recorded without an
/// explicit (or with an `UNKNOWN`) error type.
pub fn classify_issue(issue: &str) -> ErrorType {
    let lower = issue.to_lowercase();
    if lower.contains("port") {
        ErrorType::PortInUse
    } else if lower.contains("path") || lower.contains("file") || lower.contains("directory") {
        ErrorType::PathNotFound
    } else if lower.contains("module") || lower.contains("depend") || lower.contains("install") {
        ErrorType::MissingModule
    } else if lower.contains("crash") || lower.contains("exit") {
        ErrorType::Crash
    } else {
        ErrorType::Unknown
    }
}

#[cfg(test)]
#[path = "error_type_tests.rs"]
mod tests;
