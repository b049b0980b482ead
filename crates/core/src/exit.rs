// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Child exit classification.
//!
//! Distinguishes clean terminations from crashes, and crashes during startup
//! from crashes after the process had settled. The classification drives the
//! restart policy and how the exit is recorded in the troubleshooting log.

use std::time::Duration;

/// Exit codes that count as a normal termination: clean exit, Ctrl-C
/// (0xC000013A), and system logoff/shutdown (0x40010004).
pub const NORMAL_EXIT_CODES: [i64; 3] = [0, 0xC000_013A, 0x4001_0004];

/// A crash within this window of the spawn is a startup crash.
pub const STARTUP_CRASH_WINDOW: Duration = Duration::from_secs(5);

/// Whether an exit code is in the normal-termination set.
pub fn is_normal_exit(code: i64) -> bool {
    NORMAL_EXIT_CODES.contains(&code)
}

/// How a child exit is classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitClass {
    /// Clean exit or user/system-initiated termination. Never restarted.
    NormalTermination,
    /// Abnormal exit before [`STARTUP_CRASH_WINDOW`] elapsed. Never
    /// restarted — a process that cannot start will not start better the
    /// second time.
    StartupCrash,
    /// Abnormal exit after the process had been up. Eligible for
    /// auto-restart.
    RuntimeCrash,
}

/// Classify an exit.
///
/// A `None` exit code (killed by signal) is treated as abnormal.
pub fn classify(exit_code: Option<i64>, run_time: Duration) -> ExitClass {
    if exit_code.is_some_and(is_normal_exit) {
        return ExitClass::NormalTermination;
    }
    if run_time < STARTUP_CRASH_WINDOW {
        ExitClass::StartupCrash
    } else {
        ExitClass::RuntimeCrash
    }
}

#[cfg(test)]
#[path = "exit_tests.rs"]
mod tests;
