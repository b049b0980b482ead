// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ql-storage: Persistence for the QuickLaunch supervisor.
//!
//! Four artifacts live in the supervisor's state directory:
//! - the config document (apps + reserved ports), rewritten whole;
//! - the schedule-state document (last run per scheduled app);
//! - the append-only troubleshooting log;
//! - the append-only resolutions log.

pub mod config_doc;
pub mod resolutions;
pub mod schedule_state;
pub mod trouble_log;

pub use config_doc::{
    ConfigDocument, ConfigError, ConfigStore, PortOwner, SUPERVISOR_PORT, SUPERVISOR_PORT_LABEL,
};
pub use resolutions::{Disposition, Resolution, ResolutionsLog, StorageError};
pub use schedule_state::{ScheduleRecord, ScheduleStateStore};
pub use trouble_log::{LogLevel, TroubleEntry, TroubleshootingLog};
