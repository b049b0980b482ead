// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! IPC Protocol for daemon communication.
//!
//! Wire format: 4-byte length prefix (big-endian) + JSON payload. One
//! request/response pair per connection. Body field names are camelCase to
//! match the dashboard's JSON shapes.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use ql_core::{AppConfig, AppPatch, StartAttempt, StartFailure};
use ql_diag::{FailureAnalysis, TodoInventory, TriageCounts, TriageItem};
use ql_storage::Resolution;
use serde::{Deserialize, Serialize};

#[path = "protocol_types.rs"]
mod types;
pub use types::{
    AppStatusEntry, DepsCheckResult, InstallState, InstallStatusEntry, MigrateResult,
    MigrateStatus, PortCheckResult, ScheduleInfo, StartSuccess,
};

#[path = "protocol_wire.rs"]
mod wire;
pub use wire::{
    read_frame, read_request, write_frame, write_response, ProtocolError, IPC_TIMEOUT,
    MAX_FRAME_BYTES, PROTOCOL_VERSION,
};

/// Request from CLI (or dashboard bridge) to daemon
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum Request {
    /// Health check ping
    Ping,

    /// Version handshake
    Hello { version: String },

    /// Request daemon shutdown
    Shutdown,

    /// Status of every configured app, including externally-detected ones
    Status,

    /// Startup attempt history for one app
    History { id: String },

    /// The config document: apps and reserved ports
    Apps,

    /// Add an app; rejects port conflicts with a suggestion
    AppAdd { app: AppConfig },

    /// Partial update; id immutable, port change re-validated
    AppUpdate { id: String, patch: AppPatch },

    /// Remove an app
    AppRemove { id: String },

    /// Bulk import with per-item outcomes
    AppsMigrate { apps: Vec<AppConfig> },

    /// PortBroker check: registry plus live OS occupancy
    PortCheck {
        port: u16,
        #[serde(default)]
        exclude: Option<String>,
    },

    /// Smallest registry-free port at or above `base`
    PortSuggest {
        #[serde(default)]
        base: Option<u16>,
    },

    /// Add a reservation
    PortReserve { port: u16, description: String },

    /// Remove a reservation; the supervisor's own port is refused
    PortRelease { port: u16 },

    /// Dependency preflight for a directory
    DepsCheck {
        path: PathBuf,
        #[serde(default)]
        command: Option<String>,
    },

    /// Start a dependency install for an app
    InstallStart { id: String },

    /// Status of a running or recently finished install
    InstallStatus { id: String },

    /// Start an app. Carries the app declaration inline plus per-request
    /// options, so the dashboard can launch unsaved edits.
    Start {
        id: String,
        name: String,
        #[serde(default)]
        port: u16,
        path: PathBuf,
        command: String,
        #[serde(default)]
        retry: bool,
        #[serde(default)]
        override_port: Option<u16>,
        #[serde(default)]
        health_check_url: Option<String>,
        #[serde(default)]
        startup_timeout: Option<u64>,
        #[serde(default)]
        auto_restart: Option<bool>,
        #[serde(default)]
        max_restart_attempts: Option<u32>,
    },

    /// Stop a managed process by composite key
    Stop { id: String },

    /// Schedule details for one app
    ScheduleGet { id: String },

    /// Enable or disable an app's schedule
    ScheduleEnable { id: String, enabled: bool },

    /// Run a scheduled app now (manual run)
    ScheduleRun { id: String },

    /// Update schedule fields (merged into the config document)
    ScheduleUpdate { id: String, patch: AppPatch },

    /// Schedule overview for every scheduled app
    Schedules,

    /// TODO.md inventory
    Todos,

    /// Apply triage actions to TODO.md
    Triage { items: Vec<TriageItem> },

    /// Read the resolutions log
    Resolutions,

    /// Append a resolution; also removes the matching TODO line
    ResolutionAdd {
        app: String,
        issue: String,
        #[serde(default)]
        error_type: Option<String>,
        #[serde(default)]
        explanation: String,
        #[serde(default)]
        notes: String,
    },
}

/// Response from daemon to client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum Response {
    Pong,

    Hello { version: String },

    ShuttingDown,

    Ok,

    /// Generic client error with a human message
    Error { message: String },

    Status { apps: HashMap<String, AppStatusEntry> },

    History {
        attempts: Vec<StartAttempt>,
        #[serde(default)]
        last_error: Option<String>,
    },

    Apps {
        apps: Vec<AppConfig>,
        reserved_ports: BTreeMap<u16, String>,
    },

    /// A single app (after add/update)
    App { app: AppConfig },

    /// Port conflict on add/update, with an alternative to offer
    PortConflict {
        message: String,
        #[serde(default)]
        suggested_port: Option<u16>,
    },

    Migrated { results: Vec<MigrateResult> },

    PortChecked { result: PortCheckResult },

    PortSuggested { port: u16 },

    DepsChecked { result: DepsCheckResult },

    InstallStarted {
        status: String,
        package_manager: String,
    },

    InstallStatus { result: InstallStatusEntry },

    Started {
        result: StartSuccess,
        #[serde(default)]
        analysis: Option<FailureAnalysis>,
    },

    /// Structured start failure (the 4xx/5xx envelope)
    StartFailed {
        failure: Box<StartFailure>,
        #[serde(default)]
        analysis: Option<FailureAnalysis>,
    },

    Stopped { id: String },

    Schedule { info: ScheduleInfo },

    Schedules { schedules: Vec<ScheduleInfo> },

    /// A manual scheduled run was spawned under this composite key
    ScheduleRunStarted { key: String },

    Todos { inventory: TodoInventory },

    Triaged { counts: TriageCounts },

    Resolutions { resolutions: Vec<Resolution> },

    ResolutionAdded {
        resolution: Resolution,
        todo_removed: bool,
    },
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
