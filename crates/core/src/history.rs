// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-app startup attempt history. Memory only — lost on supervisor
//! restart by design.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

/// Attempts kept per app.
pub const MAX_ATTEMPTS_KEPT: usize = 20;

/// Outcome of a recorded start attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptResult {
    Success,
    /// Spawned but the health probe never confirmed it.
    Partial,
    Failed,
    NeedsInstall,
}

/// One start attempt with the preflight/startup steps that were reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartAttempt {
    pub timestamp_ms: u64,
    pub steps: Vec<String>,
    pub result: AttemptResult,
}

/// Bounded start-attempt history keyed by app id.
#[derive(Debug, Default)]
pub struct StartupHistory {
    attempts: HashMap<String, VecDeque<StartAttempt>>,
    last_error: HashMap<String, String>,
}

impl StartupHistory {
    pub fn record(&mut self, app_id: &str, attempt: StartAttempt) {
        let entries = self.attempts.entry(app_id.to_string()).or_default();
        if entries.len() >= MAX_ATTEMPTS_KEPT {
            entries.pop_front();
        }
        entries.push_back(attempt);
    }

    pub fn set_last_error(&mut self, app_id: &str, error: impl Into<String>) {
        self.last_error.insert(app_id.to_string(), error.into());
    }

    /// Attempts (oldest first) and last recorded error for an app.
    pub fn for_app(&self, app_id: &str) -> (Vec<StartAttempt>, Option<String>) {
        let attempts = self
            .attempts
            .get(app_id)
            .map(|v| v.iter().cloned().collect())
            .unwrap_or_default();
        (attempts, self.last_error.get(app_id).cloned())
    }
}

#[cfg(test)]
#[path = "history_tests.rs"]
mod tests;
