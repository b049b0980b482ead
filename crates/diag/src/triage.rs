// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Triage application over TODO.md.
//!
//! Each triaged item is removed from wherever it lives and either re-filed
//! (`parking`, `implement`) or dismissed (`dontdo`, which also yields a
//! cancelled resolution for the caller to record). Item text is preserved
//! verbatim across moves.

use crate::error_type::ErrorType;
use crate::todo::{join_lines, remove_checkbox_line};
use serde::{Deserialize, Serialize};

/// What to do with a triaged item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriageAction {
    Parking,
    Implement,
    Dontdo,
}

/// One triage instruction from the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriageItem {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    pub action: TriageAction,
}

/// How many items each action applied to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriageCounts {
    pub parking: u32,
    pub implement: u32,
    pub dontdo: u32,
}

/// A dismissed item the caller should record as a cancelled resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct CancelledItem {
    pub issue: String,
    pub error_type: ErrorType,
}

/// Result of applying a triage batch.
#[derive(Debug, Clone, PartialEq)]
pub struct TriageOutcome {
    pub content: String,
    pub counts: TriageCounts,
    pub cancelled: Vec<CancelledItem>,
}

const AUTO_PREFIX: &str = "[Auto] ";

/// Apply a batch of triage instructions to the file content.
///
/// Items that cannot be located are skipped and not counted.
pub fn apply_triage(content: &str, items: &[TriageItem]) -> TriageOutcome {
    let mut lines: Vec<String> = content.lines().map(String::from).collect();
    let mut counts = TriageCounts::default();
    let mut cancelled = Vec::new();

    for item in items {
        let is_auto = item.text.starts_with(AUTO_PREFIX);
        let removed = if is_auto {
            let needle = item.text.strip_prefix(AUTO_PREFIX).unwrap_or(&item.text);
            remove_auto_block(&mut lines, needle)
        } else {
            remove_checkbox_line(&mut lines, &item.text)
        };
        if !removed {
            continue;
        }

        match item.action {
            TriageAction::Parking => {
                insert_parking(&mut lines, &item.text);
                counts.parking += 1;
            }
            TriageAction::Implement => {
                insert_next_session(&mut lines, &item.text);
                counts.implement += 1;
            }
            TriageAction::Dontdo => {
                counts.dontdo += 1;
                cancelled.push(CancelledItem {
                    issue: item.text.clone(),
                    error_type: if is_auto {
                        ErrorType::AutoDetectedResolved
                    } else {
                        ErrorType::TodoTriaged
                    },
                });
            }
        }
    }

    TriageOutcome {
        content: join_lines(&lines),
        counts,
        cancelled,
    }
}

/// Remove a `### ` auto-detected block: the matching header and everything
/// up to (but not including) the next `## ` or `### ` heading.
fn remove_auto_block(lines: &mut Vec<String>, needle: &str) -> bool {
    let Some(start) = lines
        .iter()
        .position(|l| l.starts_with("### ") && l.contains(needle))
    else {
        return false;
    };
    let end = lines[start + 1..]
        .iter()
        .position(|l| l.starts_with("## ") || l.starts_with("### "))
        .map(|off| start + 1 + off)
        .unwrap_or(lines.len());
    lines.drain(start..end);
    true
}

/// Append `- [ ] text` at the end of the Parking Lot section, creating the
/// section before any Support Codes section (else at the end of the file).
fn insert_parking(lines: &mut Vec<String>, text: &str) {
    let header_idx = match lines.iter().position(|l| l.trim() == "## Parking Lot") {
        Some(idx) => idx,
        None => {
            let at = lines
                .iter()
                .position(|l| {
                    l.strip_prefix("## ")
                        .is_some_and(|h| h.starts_with("Support Codes"))
                })
                .unwrap_or(lines.len());
            lines.splice(at..at, ["## Parking Lot".to_string(), String::new()]);
            at
        }
    };

    // End of the section: the next `## ` heading, trimmed of trailing blanks.
    let mut end = lines[header_idx + 1..]
        .iter()
        .position(|l| l.starts_with("## "))
        .map(|off| header_idx + 1 + off)
        .unwrap_or(lines.len());
    while end > header_idx + 1 && lines[end - 1].trim().is_empty() {
        end -= 1;
    }
    lines.insert(end, format!("- [ ] {}", text));
}

/// Insert `- [ ] text` at the top of the Next Session section, creating the
/// section before the first `## ` heading when absent.
fn insert_next_session(lines: &mut Vec<String>, text: &str) {
    let header_idx = match lines.iter().position(|l| l.trim() == "## Next Session") {
        Some(idx) => idx,
        None => {
            let at = lines
                .iter()
                .position(|l| l.starts_with("## "))
                .unwrap_or(lines.len());
            lines.splice(at..at, ["## Next Session".to_string(), String::new()]);
            at
        }
    };
    lines.insert(header_idx + 1, format!("- [ ] {}", text));
}

#[cfg(test)]
#[path = "triage_tests.rs"]
mod tests;
