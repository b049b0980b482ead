// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Failure taxonomy, support codes, and the structured start-failure
//! envelope returned to clients.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kinds of start/lifecycle failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureKind {
    PortInUse,
    PathNotFound,
    MissingManifest,
    MissingDependencies,
    FileNotFound,
    StartupCrash,
    RuntimeCrash,
    /// Non-fatal: the response stays successful with status `starting`.
    HealthTimeout,
    AutoRestartExhausted,
    Exception,
}

/// Opaque client-facing identifiers surfaced verbatim to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SupportCode {
    #[serde(rename = "QL-PORT-001")]
    PortInUse,
    #[serde(rename = "QL-PORT-002")]
    PortInUseAfterRetry,
    #[serde(rename = "QL-PATH-001")]
    PathMissing,
    #[serde(rename = "QL-NPM-001")]
    ManifestMissing,
    #[serde(rename = "QL-MOD-001")]
    DependenciesMissing,
    #[serde(rename = "QL-FILE-001")]
    FileMissing,
    #[serde(rename = "QL-NET-001")]
    Network,
    #[serde(rename = "QL-ERR-000")]
    Unknown,
    #[serde(rename = "QL-ERR-500")]
    Server,
}

impl SupportCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SupportCode::PortInUse => "QL-PORT-001",
            SupportCode::PortInUseAfterRetry => "QL-PORT-002",
            SupportCode::PathMissing => "QL-PATH-001",
            SupportCode::ManifestMissing => "QL-NPM-001",
            SupportCode::DependenciesMissing => "QL-MOD-001",
            SupportCode::FileMissing => "QL-FILE-001",
            SupportCode::Network => "QL-NET-001",
            SupportCode::Unknown => "QL-ERR-000",
            SupportCode::Server => "QL-ERR-500",
        }
    }
}

impl fmt::Display for SupportCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A process attributed as the owner of a contested resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessIdent {
    pub pid: u32,
    pub name: String,
}

/// Structured failure returned from a start request.
///
/// Every failure carries a troubleshooting trace of the steps taken, a
/// human suggestion, and a support code; recovery hints (`can_retry`,
/// `alternative_port`, `needs_install`) let clients offer one-click fixes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartFailure {
    pub kind: FailureKind,
    pub message: String,
    pub support_code: SupportCode,
    pub troubleshooting: Vec<String>,
    pub suggestion: String,
    pub can_retry: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_use_alternative: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternative_port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub needs_install: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_manager: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocking_process: Option<ProcessIdent>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recent_logs: Vec<String>,
}

impl StartFailure {
    pub fn new(kind: FailureKind, code: SupportCode, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            support_code: code,
            troubleshooting: Vec::new(),
            suggestion: String::new(),
            can_retry: false,
            can_use_alternative: None,
            alternative_port: None,
            needs_install: None,
            package_manager: None,
            blocking_process: None,
            recent_logs: Vec::new(),
        }
    }

    pub fn with_trace(mut self, troubleshooting: Vec<String>) -> Self {
        self.troubleshooting = troubleshooting;
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = suggestion.into();
        self
    }

    pub fn retryable(mut self) -> Self {
        self.can_retry = true;
        self
    }

    pub fn with_alternative(mut self, port: u16) -> Self {
        self.can_use_alternative = Some(true);
        self.alternative_port = Some(port);
        self
    }

    pub fn with_install_hint(mut self, package_manager: impl Into<String>) -> Self {
        self.needs_install = Some(true);
        self.package_manager = Some(package_manager.into());
        self
    }

    pub fn with_blocking_process(mut self, ident: ProcessIdent) -> Self {
        self.blocking_process = Some(ident);
        self
    }

    pub fn with_logs(mut self, recent_logs: Vec<String>) -> Self {
        self.recent_logs = recent_logs;
        self
    }
}

#[cfg(test)]
#[path = "failure_tests.rs"]
mod tests;
