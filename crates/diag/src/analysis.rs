// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Failure-pattern analysis with resolution-aware discounting.
//!
//! A log entry counts toward a pattern only if no later `resolved`
//! resolution exists for its error type, so fixed failures stop inflating
//! the numbers. Recommendations are driven by failures inside the recent
//! window.

use crate::error_type::{classify_message, ErrorType};
use chrono::{DateTime, Duration, Utc};
use ql_storage::TroubleEntry;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Window for "recent" failures.
pub const RECENT_WINDOW_DAYS: i64 = 7;

/// Recent failures at or above this count produce a critical advisory.
pub const CRITICAL_THRESHOLD: u32 = 6;

/// Recent failures at or above this count produce a warning advisory.
pub const WARNING_THRESHOLD: u32 = 3;

/// Advisory severity tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdvisoryLevel {
    Warning,
    Critical,
}

/// One recurring failure pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternInfo {
    pub error_type: ErrorType,
    pub count: u32,
    pub last_seen: DateTime<Utc>,
    pub message: String,
}

/// Action advisory attached to a start response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub level: AdvisoryLevel,
    pub message: String,
    pub actions: Vec<String>,
    pub should_auto_todo: bool,
}

/// Result of analyzing one app's failure history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureAnalysis {
    pub app: String,
    pub total_failures: u32,
    pub recent_failures: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dominant: Option<ErrorType>,
    pub patterns: Vec<PatternInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<Recommendation>,
}

/// Canned action for the warning tier.
fn warning_action(error_type: ErrorType) -> &'static str {
    match error_type {
        ErrorType::PortInUse => "Check which process occupies the port before starting",
        ErrorType::PathNotFound => "Verify the app path still exists and is spelled correctly",
        ErrorType::MissingModule => "Run the package manager install before starting",
        ErrorType::Crash => "Review the last app logs for the failing stack trace",
        _ => "Review the troubleshooting log for this app",
    }
}

/// Canned action for the critical tier.
fn critical_action(error_type: ErrorType) -> &'static str {
    match error_type {
        ErrorType::PortInUse => {
            "Find the process that keeps taking this port and stop it permanently, or move the app to a reserved port"
        }
        ErrorType::PathNotFound => {
            "The app directory keeps disappearing; fix the path in the app config or restore the checkout"
        }
        ErrorType::MissingModule => {
            "Dependencies are repeatedly missing; check for a broken postinstall or a cleaner wiping node_modules"
        }
        ErrorType::Crash => {
            "The app crashes repeatedly at runtime; capture its logs and fix the underlying error before relying on auto-restart"
        }
        _ => "Investigate the recurring failures in the troubleshooting log",
    }
}

/// Human pattern summary, e.g. `7x PORT_IN_USE in the last 7 days`.
fn pattern_message(error_type: ErrorType, recent: u32) -> String {
    format!(
        "{}x {} in the last {} days",
        recent,
        error_type.as_str(),
        RECENT_WINDOW_DAYS
    )
}

/// Analyze an app's failure history.
///
/// `entries` must already be filtered to the app's label; `resolved` maps an
/// error-type tag to the latest `resolved` resolution timestamp.
pub fn analyze(
    app: &str,
    entries: &[TroubleEntry],
    resolved: &HashMap<String, DateTime<Utc>>,
    now: DateTime<Utc>,
) -> FailureAnalysis {
    let recent_cutoff = now - Duration::days(RECENT_WINDOW_DAYS);

    struct Tally {
        count: u32,
        recent: u32,
        last_seen: DateTime<Utc>,
    }
    let mut tallies: HashMap<ErrorType, Tally> = HashMap::new();

    for entry in entries {
        if !entry.level.is_failure_level() || entry.is_normal_termination() {
            continue;
        }
        let Some(error_type) = classify_message(&entry.message) else {
            continue;
        };
        // Discount rule: only count entries after the latest resolution for
        // this error type.
        if let Some(resolved_at) = resolved.get(error_type.as_str()) {
            if entry.timestamp <= *resolved_at {
                continue;
            }
        }
        let tally = tallies.entry(error_type).or_insert(Tally {
            count: 0,
            recent: 0,
            last_seen: entry.timestamp,
        });
        tally.count += 1;
        if entry.timestamp > tally.last_seen {
            tally.last_seen = entry.timestamp;
        }
        if entry.timestamp >= recent_cutoff {
            tally.recent += 1;
        }
    }

    let total_failures: u32 = tallies.values().map(|t| t.count).sum();
    let recent_failures: u32 = tallies.values().map(|t| t.recent).sum();

    let dominant = tallies
        .iter()
        .max_by_key(|(_, t)| t.count)
        .map(|(et, _)| *et);

    let mut patterns: Vec<PatternInfo> = tallies
        .iter()
        .map(|(et, t)| PatternInfo {
            error_type: *et,
            count: t.count,
            last_seen: t.last_seen,
            message: pattern_message(*et, t.recent),
        })
        .collect();
    patterns.sort_by(|a, b| b.count.cmp(&a.count));

    let recommendation = dominant.and_then(|et| {
        if recent_failures >= CRITICAL_THRESHOLD {
            Some(Recommendation {
                level: AdvisoryLevel::Critical,
                message: pattern_message(et, recent_failures),
                actions: vec![critical_action(et).to_string()],
                should_auto_todo: true,
            })
        } else if recent_failures >= WARNING_THRESHOLD {
            Some(Recommendation {
                level: AdvisoryLevel::Warning,
                message: pattern_message(et, recent_failures),
                actions: vec![warning_action(et).to_string()],
                should_auto_todo: false,
            })
        } else {
            None
        }
    });

    FailureAnalysis {
        app: app.to_string(),
        total_failures,
        recent_failures,
        dominant,
        patterns,
        recommendation,
    }
}

#[cfg(test)]
#[path = "analysis_tests.rs"]
mod tests;
