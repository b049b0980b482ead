// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Conservative TODO.md reading and writing.
//!
//! The file is human-edited; the engine only performs small, targeted edits:
//! scanning the inventory, inserting one auto-detected block per app per
//! day, and the triage moves. Everything else is preserved byte-for-byte.

use crate::analysis::Recommendation;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Section the auto-detected blocks live under.
pub const AUTO_SECTION_HEADER: &str = "## Auto-Detected Issues (from troubleshooting log)";

/// Sections that stop checkbox collection.
const SUPPORT_CODES_PREFIX: &str = "Support Codes";
const AUTO_DETECTED_PREFIX: &str = "Auto-Detected";

/// Priority bucket derived from the containing section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    High,
    Medium,
    Low,
}

/// One TODO item (or auto-detected pseudo-item).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoItem {
    pub text: String,
    pub priority: Priority,
    pub section: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub marked_for_implement: bool,
    pub marked_parking: bool,
    pub is_auto_detected: bool,
    pub original_text: String,
}

/// Full inventory of TODO.md.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoInventory {
    pub count: usize,
    pub items: Vec<String>,
    pub items_with_priority: Vec<TodoItem>,
}

fn priority_for_section(section: &str) -> Priority {
    if section.starts_with("High") {
        Priority::High
    } else if section.starts_with("Low") {
        Priority::Low
    } else {
        Priority::Medium
    }
}

/// Text of a `- [ ]` checkbox line, if it is one.
pub(crate) fn checkbox_text(line: &str) -> Option<String> {
    line.trim_start()
        .strip_prefix("- [ ]")
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Scan the file into an inventory.
pub fn scan(content: &str) -> TodoInventory {
    let mut items_with_priority = Vec::new();
    let mut section = String::new();

    let lines: Vec<&str> = content.lines().collect();
    for (i, line) in lines.iter().enumerate() {
        if let Some(h) = line.strip_prefix("## ") {
            section = h.trim().to_string();
            continue;
        }

        if section.starts_with(AUTO_DETECTED_PREFIX) {
            // Auto-detected blocks surface as pseudo-items from their
            // `###` headers; their checkboxes are not counted separately.
            if let Some(h) = line.strip_prefix("### ") {
                items_with_priority.push(TodoItem {
                    text: format!("[Auto] {}", h.trim()),
                    priority: Priority::High,
                    section: section.clone(),
                    description: None,
                    marked_for_implement: false,
                    marked_parking: false,
                    is_auto_detected: true,
                    original_text: (*line).to_string(),
                });
            }
            continue;
        }
        if section.starts_with(SUPPORT_CODES_PREFIX) {
            continue;
        }

        if let Some(text) = checkbox_text(line) {
            let description = lines
                .get(i + 1)
                .map(|l| l.trim_start())
                .and_then(|l| l.strip_prefix('>'))
                .map(|d| d.trim().to_string());
            items_with_priority.push(TodoItem {
                text,
                priority: priority_for_section(&section),
                section: section.clone(),
                description,
                marked_for_implement: section == "Next Session",
                marked_parking: section == "Parking Lot",
                is_auto_detected: false,
                original_text: (*line).to_string(),
            });
        }
    }

    let items: Vec<String> = items_with_priority.iter().map(|i| i.text.clone()).collect();
    TodoInventory {
        count: items.len(),
        items,
        items_with_priority,
    }
}

/// Insert an auto-detected block for `app_name`, at most once per day.
///
/// Returns the new content, or `None` when today's entry already exists
/// (idempotency is keyed on the literal `[YYYY-MM-DD] <AppName>` prefix).
pub fn insert_auto_todo(
    content: &str,
    app_name: &str,
    today: NaiveDate,
    recommendation: &Recommendation,
) -> Option<String> {
    let marker = format!("[{}] {}", today.format("%Y-%m-%d"), app_name);
    if content.contains(&marker) {
        return None;
    }

    let mut entry = vec![
        format!("### {} - {}", marker, recommendation.message),
    ];
    for action in &recommendation.actions {
        entry.push(format!("- [ ] {}", action));
    }
    entry.push(String::new());

    let mut lines: Vec<String> = content.lines().map(String::from).collect();

    let header_idx = match lines.iter().position(|l| l.trim() == AUTO_SECTION_HEADER) {
        Some(idx) => idx,
        None => {
            // Create the section before any Support Codes section, else at
            // the end of the file.
            let at = lines
                .iter()
                .position(|l| {
                    l.strip_prefix("## ")
                        .is_some_and(|h| h.starts_with(SUPPORT_CODES_PREFIX))
                })
                .unwrap_or(lines.len());
            lines.splice(at..at, [AUTO_SECTION_HEADER.to_string(), String::new()]);
            at
        }
    };

    // Insert below the header, skipping the blank line directly under it.
    let mut insert_at = header_idx + 1;
    if insert_at < lines.len() && lines[insert_at].trim().is_empty() {
        insert_at += 1;
    }
    lines.splice(insert_at..insert_at, entry);

    Some(join_lines(&lines))
}

/// Remove the first unchecked item whose text contains `needle`, along with
/// its indented `>` description lines. Returns the new content if an item
/// was removed.
pub fn remove_first_matching(content: &str, needle: &str) -> Option<String> {
    let mut lines: Vec<String> = content.lines().map(String::from).collect();
    if remove_checkbox_line(&mut lines, needle) {
        Some(join_lines(&lines))
    } else {
        None
    }
}

/// Remove a checkbox line containing `needle` plus its description lines.
pub(crate) fn remove_checkbox_line(lines: &mut Vec<String>, needle: &str) -> bool {
    let Some(idx) = lines
        .iter()
        .position(|l| checkbox_text(l).is_some_and(|t| t.contains(needle)))
    else {
        return false;
    };
    lines.remove(idx);
    while idx < lines.len() && is_description_line(&lines[idx]) {
        lines.remove(idx);
    }
    true
}

fn is_description_line(line: &str) -> bool {
    line.starts_with(char::is_whitespace) && line.trim_start().starts_with('>')
}

pub(crate) fn join_lines(lines: &[String]) -> String {
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

#[cfg(test)]
#[path = "todo_tests.rs"]
mod tests;
