// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire DTOs for status, start, port, install, and schedule responses.

use crate::health::HealthCheck;
use ql_core::{ProcessIdent, ProcessStatus};
use serde::{Deserialize, Serialize};

/// One app's row in the status map, including externally-detected apps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppStatusEntry {
    pub running: bool,
    pub port: u16,
    pub name: String,
    pub pid: Option<u32>,
    pub status: ProcessStatus,
    pub recent_logs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i64>,
    /// Present (and true) only for apps the supervisor did not start.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external: Option<bool>,
}

/// Successful start envelope. A health timeout still reports success, with
/// status `starting` and a warning attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSuccess {
    pub id: String,
    pub name: String,
    pub port: u16,
    pub pid: Option<u32>,
    pub status: ProcessStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health: Option<HealthCheck>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    pub elapsed_ms: u64,
}

/// PortBroker check result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortCheckResult {
    pub registry_available: bool,
    /// `"reserved"` or `"app"` when the registry owns the port.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry_used_by: Option<String>,
    pub system_in_use: bool,
    pub available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocking_process: Option<ProcessIdent>,
}

/// Per-item outcome of a bulk import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrateResult {
    pub id: String,
    pub status: MigrateStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MigrateStatus {
    Imported,
    Skipped,
}

/// Dependency preflight outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepsCheckResult {
    pub needs_install: bool,
    pub has_package_json: bool,
    pub package_manager: String,
}

/// State of a dependency install job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallState {
    Running,
    Completed,
    Failed,
}

/// Install job status (logs bounded to the last 20 lines).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallStatusEntry {
    pub status: InstallState,
    pub package_manager: String,
    pub logs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

/// Schedule surface for one app.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleInfo {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<String>,
    pub schedule_enabled: bool,
    pub run_if_missed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_run: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_exit_code: Option<i64>,
    pub was_manual: bool,
    /// A scheduled run is currently resident in the process table.
    pub running: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recent_logs: Vec<String>,
}
