// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Status assembly, including detection of externally-started apps.
//!
//! For every configured app with a port that the table does not hold as
//! active, a fast probe checks whether something answers anyway. Apps
//! started outside the supervisor surface as `external` rows with no pid —
//! visible on the dashboard, but not stoppable.

use super::Supervisor;
use crate::health;
use crate::protocol::AppStatusEntry;
use ql_core::{ProcessKey, ProcessStatus};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinSet;

/// Log lines surfaced per status row.
const STATUS_LOG_TAIL: usize = 10;

/// Build the full status map: managed entries plus external detection.
pub async fn status_map(sup: &Arc<Supervisor>) -> HashMap<String, AppStatusEntry> {
    sup.table.prune_aged_sync_entries(sup.now_ms());

    let mut map: HashMap<String, AppStatusEntry> = HashMap::new();
    for entry in sup.table.snapshot() {
        map.insert(
            entry.key.to_string(),
            AppStatusEntry {
                running: entry.status == ProcessStatus::Running,
                port: entry.port,
                name: entry.name.clone(),
                pid: entry.pid,
                status: entry.status,
                recent_logs: entry.logs.tail_formatted(STATUS_LOG_TAIL),
                start_time: Some(entry.started_at_ms),
                exit_code: entry.exit_code,
                external: None,
            },
        );
    }

    // Probe configured-but-unmanaged ports concurrently.
    let doc = sup.config_store.snapshot();
    let mut probes = JoinSet::new();
    for app in doc.apps {
        if app.port == 0 {
            continue;
        }
        let key = ProcessKey::app(&app.id);
        if sup.table.is_active(&key) {
            continue;
        }
        let client = sup.http.clone();
        let path = app.health_path().to_string();
        probes.spawn(async move {
            let answered = health::probe_once(&client, app.port, &path).await.is_some();
            (app, answered)
        });
    }

    while let Some(joined) = probes.join_next().await {
        let Ok((app, answered)) = joined else {
            continue;
        };
        if !answered {
            continue;
        }
        // Managed terminal entries are overridden: something is listening.
        map.insert(
            app.id.clone(),
            AppStatusEntry {
                running: true,
                port: app.port,
                name: app.name,
                pid: None,
                status: ProcessStatus::External,
                recent_logs: Vec::new(),
                start_time: None,
                exit_code: None,
                external: Some(true),
            },
        );
    }

    map
}

#[cfg(test)]
#[path = "external_tests.rs"]
mod tests;
