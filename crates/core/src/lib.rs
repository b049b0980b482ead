// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ql-core: Core library for the QuickLaunch (ql) process supervisor

pub mod app;
pub mod clock;
pub mod exit;
pub mod failure;
pub mod history;
pub mod process;
pub mod restart;
pub mod time_fmt;

pub use app::{AppConfig, AppPatch, StartOptions};
pub use clock::{Clock, FakeClock, SystemClock};
pub use exit::{is_normal_exit, ExitClass, NORMAL_EXIT_CODES, STARTUP_CRASH_WINDOW};
pub use failure::{FailureKind, ProcessIdent, StartFailure, SupportCode};
pub use history::{AttemptResult, StartAttempt, StartupHistory};
pub use process::{
    classify_output_line, looks_ready, LogLine, LogRing, LogStream, ProcessEntry, ProcessKey,
    ProcessStatus, StartupErrorInfo, StartupErrorKind,
};
pub use restart::{RestartTracker, RESTART_COOLDOWN_MS, RESTART_DELAY, STABILITY_WINDOW};
pub use time_fmt::{format_clock_ms, format_elapsed, format_elapsed_ms};
