// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn fresh_tracker_allows_restart() {
    let tracker = RestartTracker::default();
    assert!(tracker.can_restart(3, 1_000));
}

#[test]
fn attempts_accumulate_until_budget() {
    let mut tracker = RestartTracker::default();

    tracker.record_attempt(3, 1_000);
    assert_eq!(tracker.attempts, 1);
    assert!(tracker.can_restart(3, 2_000));

    tracker.record_attempt(3, 2_000);
    assert!(tracker.can_restart(3, 3_000));

    tracker.record_attempt(3, 3_000);
    assert_eq!(tracker.attempts, 3);
    assert!(!tracker.can_restart(3, 4_000));
}

#[test]
fn cooldown_measured_from_blocking_attempt() {
    let mut tracker = RestartTracker::default();
    tracker.record_attempt(1, 10_000);

    assert_eq!(tracker.cooldown_until_ms, 10_000 + RESTART_COOLDOWN_MS);
    assert!(!tracker.can_restart(1, 10_000 + RESTART_COOLDOWN_MS - 1));
    // Budget is still exhausted after cooldown; only a stability reset
    // (tracker removal) restores it.
    assert!(!tracker.can_restart(1, 10_000 + RESTART_COOLDOWN_MS));
}

#[test]
fn cooldown_blocks_even_with_budget_remaining() {
    let mut tracker = RestartTracker {
        attempts: 1,
        last_attempt_ms: 5_000,
        cooldown_until_ms: 50_000,
    };
    assert!(!tracker.can_restart(3, 20_000));
    assert!(tracker.can_restart(3, 50_000));
    tracker.record_attempt(3, 50_000);
    assert_eq!(tracker.attempts, 2);
}

#[test]
fn cooldown_remaining_reports_time_left() {
    let tracker = RestartTracker {
        attempts: 3,
        last_attempt_ms: 0,
        cooldown_until_ms: 10_000,
    };
    assert_eq!(tracker.cooldown_remaining_ms(4_000), Some(6_000));
    assert_eq!(tracker.cooldown_remaining_ms(10_000), None);
}
