// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Application declarations and start-request options.
//!
//! An [`AppConfig`] is the persisted declaration of a managed app: where it
//! lives, how to launch it, which port it owns, and (optionally) when to run
//! it on a schedule. The supervisor snapshots the config at spawn time so a
//! later edit never changes the semantics of an already-running process.

use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;

/// Default total health-check deadline for a starting app.
pub const DEFAULT_STARTUP_TIMEOUT_MS: u64 = 30_000;

/// Default auto-restart budget.
pub const DEFAULT_MAX_RESTART_ATTEMPTS: u32 = 3;

fn default_startup_timeout() -> u64 {
    DEFAULT_STARTUP_TIMEOUT_MS
}

fn default_max_restart_attempts() -> u32 {
    DEFAULT_MAX_RESTART_ATTEMPTS
}

/// A declared application from the config document.
///
/// `port == 0` marks a scheduled-only app with no long-running server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    /// Opaque unique identifier, chosen by the user.
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Declared server port (1-65535), or 0 for scheduled-only apps.
    #[serde(default)]
    pub port: u16,
    /// Absolute directory the command is spawned in.
    pub path: PathBuf,
    /// Command line, whitespace-split into argv at spawn time.
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colors: Option<Vec<String>>,
    /// Path appended to `http://localhost:<port>`; `None` probes the root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_check_url: Option<String>,
    /// Total health-check deadline in milliseconds.
    #[serde(default = "default_startup_timeout", rename = "startupTimeout")]
    pub startup_timeout_ms: u64,
    #[serde(default)]
    pub auto_restart: bool,
    #[serde(default = "default_max_restart_attempts")]
    pub max_restart_attempts: u32,
    /// `HH:MM` or a 5-field cron expression.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<String>,
    #[serde(default)]
    pub schedule_enabled: bool,
    /// Run today's missed execution at supervisor startup.
    #[serde(default)]
    pub run_if_missed: bool,
    /// Separate command for the periodic task of a hybrid app. When set, the
    /// scheduled run executes under the `<id>:sync` composite key so it can
    /// coexist with the long-running server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule_command: Option<String>,
}

impl AppConfig {
    /// Whitespace-split argv of the launch command.
    pub fn argv(&self) -> Vec<String> {
        self.command.split_whitespace().map(String::from).collect()
    }

    /// True when the app declares a long-running server port.
    pub fn has_server(&self) -> bool {
        self.port > 0
    }

    /// True when a schedule is declared (enabled or not).
    pub fn has_schedule(&self) -> bool {
        self.schedule.as_deref().is_some_and(|s| !s.is_empty())
    }

    /// Health-check path, defaulting to the root.
    pub fn health_path(&self) -> &str {
        match self.health_check_url.as_deref() {
            Some(p) if !p.is_empty() => p,
            _ => "/",
        }
    }

    /// Effective command for a scheduled execution.
    pub fn scheduled_command(&self) -> &str {
        self.schedule_command.as_deref().unwrap_or(&self.command)
    }
}

/// Per-request options carried alongside a start request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartOptions {
    /// Attempt to free a conflicting port before giving up.
    #[serde(default)]
    pub retry: bool,
    /// Start on this port instead of the declared one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_port: Option<u16>,
}

/// Distinguish an absent field from an explicit `null`: absent stays `None`
/// (leave alone), `null` becomes `Some(None)` (clear).
fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(de).map(Some)
}

/// Partial update for an existing app. `id` is immutable and therefore absent.
///
/// `None` leaves a field untouched; the nested `Option`s distinguish
/// "leave alone" from "clear".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub icon: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub icon_path: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub colors: Option<Option<Vec<String>>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub health_check_url: Option<Option<String>>,
    #[serde(
        default,
        rename = "startupTimeout",
        skip_serializing_if = "Option::is_none"
    )]
    pub startup_timeout_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_restart: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_restart_attempts: Option<u32>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub schedule: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_if_missed: Option<bool>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub schedule_command: Option<Option<String>>,
}

impl AppPatch {
    /// Apply the patch to an existing config.
    pub fn apply(&self, app: &mut AppConfig) {
        if let Some(v) = &self.name {
            app.name = v.clone();
        }
        if let Some(v) = &self.description {
            app.description = v.clone();
        }
        if let Some(v) = self.port {
            app.port = v;
        }
        if let Some(v) = &self.path {
            app.path = v.clone();
        }
        if let Some(v) = &self.command {
            app.command = v.clone();
        }
        if let Some(v) = &self.icon {
            app.icon = v.clone();
        }
        if let Some(v) = &self.icon_path {
            app.icon_path = v.clone();
        }
        if let Some(v) = &self.colors {
            app.colors = v.clone();
        }
        if let Some(v) = &self.health_check_url {
            app.health_check_url = v.clone();
        }
        if let Some(v) = self.startup_timeout_ms {
            app.startup_timeout_ms = v;
        }
        if let Some(v) = self.auto_restart {
            app.auto_restart = v;
        }
        if let Some(v) = self.max_restart_attempts {
            app.max_restart_attempts = v;
        }
        if let Some(v) = &self.schedule {
            app.schedule = v.clone();
        }
        if let Some(v) = self.schedule_enabled {
            app.schedule_enabled = v;
        }
        if let Some(v) = self.run_if_missed {
            app.run_if_missed = v;
        }
        if let Some(v) = &self.schedule_command {
            app.schedule_command = v.clone();
        }
    }
}

#[cfg(test)]
#[path = "app_tests.rs"]
mod tests;
