// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP liveness probing for starting and external apps.
//!
//! Any HTTP response counts as healthy, 4xx included: a server answering
//! 404 on `/` is up. Connection refused and per-attempt timeouts are
//! non-fatal and just trigger the next poll.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::debug;

/// Default total deadline for a starting app.
pub const DEFAULT_STARTUP_TIMEOUT: Duration = Duration::from_secs(30);

/// Default delay between polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Default per-attempt timeout.
pub const DEFAULT_SINGLE_CHECK_TIMEOUT: Duration = Duration::from_secs(2);

/// Deadline for the fast probe used by external-app detection.
pub const EXTERNAL_PROBE_TIMEOUT: Duration = Duration::from_millis(500);

/// Options for [`wait_for_healthy`].
#[derive(Debug, Clone)]
pub struct HealthOptions {
    /// Path appended to `http://localhost:<port>`.
    pub health_url: String,
    pub startup_timeout: Duration,
    pub poll_interval: Duration,
    pub single_check_timeout: Duration,
}

impl Default for HealthOptions {
    fn default() -> Self {
        Self {
            health_url: "/".to_string(),
            startup_timeout: DEFAULT_STARTUP_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            single_check_timeout: DEFAULT_SINGLE_CHECK_TIMEOUT,
        }
    }
}

/// Outcome of a health poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheck {
    pub healthy: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    pub elapsed_ms: u64,
    pub attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timed_out: Option<bool>,
}

fn probe_url(port: u16, path: &str) -> String {
    let path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    };
    format!("http://localhost:{}{}", port, path)
}

/// Poll `GET http://localhost:<port><health_url>` until a response arrives
/// or the total deadline passes.
///
/// `cancelled` is consulted between polls; it lets a stop of a `starting`
/// process abandon the poll instead of racing it.
pub async fn wait_for_healthy(
    client: &reqwest::Client,
    port: u16,
    opts: &HealthOptions,
    cancelled: impl Fn() -> bool,
) -> HealthCheck {
    let url = probe_url(port, &opts.health_url);
    let started = Instant::now();
    let mut attempts = 0u32;
    let mut last_error = None;

    loop {
        if cancelled() {
            return HealthCheck {
                healthy: false,
                status_code: None,
                elapsed_ms: started.elapsed().as_millis() as u64,
                attempts,
                error: Some("cancelled".to_string()),
                timed_out: None,
            };
        }

        attempts += 1;
        match client
            .get(&url)
            .timeout(opts.single_check_timeout)
            .send()
            .await
        {
            Ok(resp) => {
                let status = resp.status().as_u16();
                debug!(port, status, attempts, "health probe answered");
                return HealthCheck {
                    healthy: true,
                    status_code: Some(status),
                    elapsed_ms: started.elapsed().as_millis() as u64,
                    attempts,
                    error: None,
                    timed_out: None,
                };
            }
            Err(e) => {
                last_error = Some(e.to_string());
            }
        }

        if started.elapsed() + opts.poll_interval >= opts.startup_timeout {
            return HealthCheck {
                healthy: false,
                status_code: None,
                elapsed_ms: started.elapsed().as_millis() as u64,
                attempts,
                error: last_error,
                timed_out: Some(true),
            };
        }
        tokio::time::sleep(opts.poll_interval).await;
    }
}

/// Single fast probe; `Some(status)` when anything answers within
/// [`EXTERNAL_PROBE_TIMEOUT`].
pub async fn probe_once(client: &reqwest::Client, port: u16, path: &str) -> Option<u16> {
    let url = probe_url(port, path);
    client
        .get(&url)
        .timeout(EXTERNAL_PROBE_TIMEOUT)
        .send()
        .await
        .ok()
        .map(|r| r.status().as_u16())
}

#[cfg(test)]
#[path = "health_tests.rs"]
mod tests;
