// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plain-text rendering of daemon responses.

use ql_core::{format_elapsed_ms, StartFailure};
use ql_daemon::protocol::{AppStatusEntry, ScheduleInfo, StartSuccess};
use ql_diag::{FailureAnalysis, TodoInventory};
use std::collections::HashMap;

/// Render the status map, managed entries first, sorted by key.
pub fn print_status(apps: &HashMap<String, AppStatusEntry>, now_ms: u64) {
    if apps.is_empty() {
        println!("No apps running.");
        return;
    }
    let mut keys: Vec<&String> = apps.keys().collect();
    keys.sort();
    for key in keys {
        let entry = &apps[key];
        let uptime = entry
            .start_time
            .map(|t| format!(" up {}", format_elapsed_ms(now_ms.saturating_sub(t))))
            .unwrap_or_default();
        let port = if entry.port > 0 {
            format!(" :{}", entry.port)
        } else {
            String::new()
        };
        let pid = entry
            .pid
            .map(|p| format!(" (pid {})", p))
            .unwrap_or_default();
        let external = if entry.external == Some(true) {
            " [external]"
        } else {
            ""
        };
        println!(
            "{:<24} {:<10} {}{}{}{}{}",
            key, entry.status, entry.name, port, pid, uptime, external
        );
    }
}

/// Render a start success, including the health-timeout warning case.
pub fn print_start_success(result: &StartSuccess, analysis: Option<&FailureAnalysis>) {
    match result.status {
        ql_core::ProcessStatus::Running => {
            let timing = result
                .health
                .as_ref()
                .filter(|h| h.healthy)
                .map(|h| format!(" (healthy in {})", format_elapsed_ms(h.elapsed_ms)))
                .unwrap_or_default();
            if result.port > 0 {
                println!("Started {} on port {}{}", result.name, result.port, timing);
            } else {
                println!("Started {}{}", result.name, timing);
            }
        }
        _ => {
            println!("Started {} (still starting)", result.name);
        }
    }
    if let Some(warning) = &result.warning {
        println!("warning: {}", warning);
    }
    print_advisory(analysis);
}

/// Render a structured start failure.
pub fn print_start_failure(failure: &StartFailure, analysis: Option<&FailureAnalysis>) {
    eprintln!("error [{}]: {}", failure.support_code, failure.message);
    if !failure.suggestion.is_empty() {
        eprintln!("  {}", failure.suggestion);
    }
    if let Some(alt) = failure.alternative_port {
        eprintln!("  alternative port: {} (pass --port {})", alt, alt);
    }
    if failure.can_retry {
        eprintln!("  pass --retry to free the port automatically");
    }
    if failure.needs_install == Some(true) {
        if let Some(pm) = &failure.package_manager {
            eprintln!("  run `ql deps install` ({} detected)", pm);
        }
    }
    if !failure.troubleshooting.is_empty() {
        eprintln!("troubleshooting:");
        for step in &failure.troubleshooting {
            eprintln!("  - {}", step);
        }
    }
    if !failure.recent_logs.is_empty() {
        eprintln!("recent output:");
        for line in &failure.recent_logs {
            eprintln!("  {}", line);
        }
    }
    print_advisory(analysis);
}

fn print_advisory(analysis: Option<&FailureAnalysis>) {
    let Some(rec) = analysis.and_then(|a| a.recommendation.as_ref()) else {
        return;
    };
    eprintln!("advisory ({:?}): {}", rec.level, rec.message);
    for action in &rec.actions {
        eprintln!("  - {}", action);
    }
}

/// Render the schedule overview.
pub fn print_schedules(schedules: &[ScheduleInfo]) {
    if schedules.is_empty() {
        println!("No scheduled apps.");
        return;
    }
    for info in schedules {
        let state = if info.schedule_enabled {
            "enabled"
        } else {
            "disabled"
        };
        let description = info
            .description
            .clone()
            .or_else(|| info.schedule.clone())
            .unwrap_or_default();
        println!("{:<20} {:<9} {}", info.id, state, description);
        if let Some(next) = &info.next_run {
            println!("{:<20} {:<9} next: {}", "", "", next);
        }
        if let Some(last) = &info.last_run {
            let outcome = match info.last_exit_code {
                Some(0) => "ok".to_string(),
                Some(code) => format!("exit {}", code),
                None => "unknown".to_string(),
            };
            println!("{:<20} {:<9} last: {} ({})", "", "", last, outcome);
        }
    }
}

/// Render the TODO inventory.
pub fn print_todos(inventory: &TodoInventory) {
    if inventory.items_with_priority.is_empty() {
        println!("No open TODO items.");
        return;
    }
    println!("{} open items", inventory.count);
    for item in &inventory.items_with_priority {
        let mut markers = Vec::new();
        if item.marked_for_implement {
            markers.push("next");
        }
        if item.marked_parking {
            markers.push("parked");
        }
        if item.is_auto_detected {
            markers.push("auto");
        }
        let suffix = if markers.is_empty() {
            String::new()
        } else {
            format!(" [{}]", markers.join(","))
        };
        println!("{:?}  {}{}", item.priority, item.text, suffix);
        if let Some(description) = &item.description {
            println!("        > {}", description);
        }
    }
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
