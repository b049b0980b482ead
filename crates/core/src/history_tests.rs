// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn attempt(ts: u64, result: AttemptResult) -> StartAttempt {
    StartAttempt {
        timestamp_ms: ts,
        steps: vec!["port check passed".to_string()],
        result,
    }
}

#[test]
fn records_per_app() {
    let mut history = StartupHistory::default();
    history.record("a", attempt(1, AttemptResult::Success));
    history.record("b", attempt(2, AttemptResult::Failed));

    let (attempts, last_error) = history.for_app("a");
    assert_eq!(attempts.len(), 1);
    assert_eq!(attempts[0].result, AttemptResult::Success);
    assert!(last_error.is_none());

    let (attempts, _) = history.for_app("b");
    assert_eq!(attempts[0].result, AttemptResult::Failed);
}

#[test]
fn unknown_app_is_empty() {
    let history = StartupHistory::default();
    let (attempts, last_error) = history.for_app("nope");
    assert!(attempts.is_empty());
    assert!(last_error.is_none());
}

#[test]
fn history_is_bounded() {
    let mut history = StartupHistory::default();
    for i in 0..(MAX_ATTEMPTS_KEPT as u64 + 5) {
        history.record("a", attempt(i, AttemptResult::Success));
    }
    let (attempts, _) = history.for_app("a");
    assert_eq!(attempts.len(), MAX_ATTEMPTS_KEPT);
    // Oldest were dropped
    assert_eq!(attempts[0].timestamp_ms, 5);
}

#[test]
fn last_error_tracked_separately() {
    let mut history = StartupHistory::default();
    history.record("a", attempt(1, AttemptResult::Failed));
    history.set_last_error("a", "Port 5173 in use");
    let (_, last_error) = history.for_app("a");
    assert_eq!(last_error.as_deref(), Some("Port 5173 in use"));
}

#[test]
fn attempt_result_wire_tags() {
    assert_eq!(
        serde_json::to_value(AttemptResult::NeedsInstall).unwrap(),
        "needs_install"
    );
    assert_eq!(
        serde_json::to_value(AttemptResult::Partial).unwrap(),
        "partial"
    );
}
