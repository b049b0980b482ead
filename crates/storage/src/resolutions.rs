// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only resolutions log.
//!
//! Records that an issue class was fixed (`resolved`) or dismissed
//! (`cancelled`). The diagnostics engine uses the latest `resolved`
//! timestamp per error type to discount earlier failures.
//!
//! Records are `---`-separated blocks of `Key: value` lines:
//!
//! ```text
//! Date: 2026-08-01T09:15:02Z
//! App: Web App
//! Issue: Port conflict on 5173
//! ErrorType: PORT_IN_USE
//! Disposition: resolved
//! Explanation: Stopped the stray vite process
//! Notes:
//! ---
//! ```

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use thiserror::Error;

/// Shared storage error for the append-only logs and small documents.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Whether an issue was fixed or dismissed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Disposition {
    Resolved,
    Cancelled,
}

impl Disposition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Disposition::Resolved => "resolved",
            Disposition::Cancelled => "cancelled",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "resolved" => Some(Disposition::Resolved),
            "cancelled" => Some(Disposition::Cancelled),
            _ => None,
        }
    }
}

/// One resolution record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    pub date: DateTime<Utc>,
    pub app: String,
    pub issue: String,
    /// Error-type tag; storage keeps it opaque so the diagnostics layer owns
    /// the vocabulary.
    pub error_type: String,
    pub disposition: Disposition,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub notes: String,
}

/// Handle on the append-only resolutions log file.
#[derive(Debug, Clone)]
pub struct ResolutionsLog {
    path: PathBuf,
}

impl ResolutionsLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Append one record.
    pub fn append(&self, r: &Resolution) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut f = OpenOptions::new().create(true).append(true).open(&self.path)?;
        writeln!(f, "Date: {}", r.date.to_rfc3339_opts(SecondsFormat::Secs, true))?;
        writeln!(f, "App: {}", r.app)?;
        writeln!(f, "Issue: {}", r.issue)?;
        writeln!(f, "ErrorType: {}", r.error_type)?;
        writeln!(f, "Disposition: {}", r.disposition.as_str())?;
        writeln!(f, "Explanation: {}", r.explanation)?;
        writeln!(f, "Notes: {}", r.notes)?;
        writeln!(f, "---")?;
        Ok(())
    }

    /// Read every parseable record, oldest first. Malformed blocks are
    /// skipped.
    pub fn read_all(&self) -> Vec<Resolution> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(_) => return Vec::new(),
        };
        content
            .split("\n---")
            .filter_map(parse_record)
            .collect()
    }

    /// Latest `resolved` timestamp per error type.
    pub fn latest_resolved_by_type(&self) -> HashMap<String, DateTime<Utc>> {
        let mut latest: HashMap<String, DateTime<Utc>> = HashMap::new();
        for r in self.read_all() {
            if r.disposition != Disposition::Resolved {
                continue;
            }
            let entry = latest.entry(r.error_type).or_insert(r.date);
            if r.date > *entry {
                *entry = r.date;
            }
        }
        latest
    }
}

fn parse_record(block: &str) -> Option<Resolution> {
    let mut fields: HashMap<&str, String> = HashMap::new();
    for line in block.lines() {
        if let Some((key, value)) = line.split_once(':') {
            fields
                .entry(key.trim())
                .or_insert_with(|| value.trim().to_string());
        }
    }
    let date = DateTime::parse_from_rfc3339(fields.get("Date")?).ok()?.with_timezone(&Utc);
    Some(Resolution {
        date,
        app: fields.get("App").cloned().unwrap_or_default(),
        issue: fields.get("Issue").cloned().unwrap_or_default(),
        error_type: fields.get("ErrorType").cloned().unwrap_or_default(),
        disposition: Disposition::parse(fields.get("Disposition")?)?,
        explanation: fields.get("Explanation").cloned().unwrap_or_default(),
        notes: fields.get("Notes").cloned().unwrap_or_default(),
    })
}

#[cfg(test)]
#[path = "resolutions_tests.rs"]
mod tests;
