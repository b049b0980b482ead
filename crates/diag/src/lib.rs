// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ql-diag: Adaptive diagnostics for the QuickLaunch supervisor.
//!
//! Reads the troubleshooting log, discounts failures that precede a recorded
//! resolution, recommends action when a pattern recurs, and drives the
//! TODO.md triage workflow.

pub mod analysis;
pub mod error_type;
pub mod todo;
pub mod triage;

pub use analysis::{
    analyze, AdvisoryLevel, FailureAnalysis, PatternInfo, Recommendation, CRITICAL_THRESHOLD,
    RECENT_WINDOW_DAYS, WARNING_THRESHOLD,
};
pub use error_type::{classify_issue, classify_message, ErrorType};
pub use todo::{insert_auto_todo, remove_first_matching, scan, Priority, TodoInventory, TodoItem};
pub use triage::{apply_triage, CancelledItem, TriageAction, TriageCounts, TriageItem, TriageOutcome};
