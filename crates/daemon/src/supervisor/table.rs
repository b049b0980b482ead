// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The canonical in-memory process table.
//!
//! Every mutation happens under one mutex. Status changes go through
//! [`ProcessTable::transition`], which refuses to revive terminal entries —
//! the exit observer may terminate any state at any moment, but nothing
//! upgrades a `failed` entry back to `running`.

use parking_lot::Mutex;
use ql_core::{
    classify_output_line, looks_ready, LogStream, ProcessEntry, ProcessKey, ProcessStatus,
};
use std::collections::HashMap;
use tracing::debug;

/// Terminal sync entries age out of the table after this long.
pub const SYNC_ENTRY_TTL_MS: u64 = 60 * 60 * 1000;

#[derive(Default)]
pub struct ProcessTable {
    entries: Mutex<HashMap<ProcessKey, ProcessEntry>>,
}

impl ProcessTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert (or replace) an entry.
    pub fn insert(&self, entry: ProcessEntry) {
        self.entries.lock().insert(entry.key.clone(), entry);
    }

    /// Remove an entry, returning it. Stop uses this *before* killing so a
    /// late exit observer finds nothing and no-ops.
    pub fn remove(&self, key: &ProcessKey) -> Option<ProcessEntry> {
        self.entries.lock().remove(key)
    }

    /// Clone of an entry.
    pub fn get(&self, key: &ProcessKey) -> Option<ProcessEntry> {
        self.entries.lock().get(key).cloned()
    }

    pub fn contains(&self, key: &ProcessKey) -> bool {
        self.entries.lock().contains_key(key)
    }

    /// Whether an active (starting/running/restarting) entry holds the key.
    pub fn is_active(&self, key: &ProcessKey) -> bool {
        self.entries
            .lock()
            .get(key)
            .is_some_and(|e| e.status.is_active())
    }

    /// Compare-and-set status change. Returns false when the entry is gone
    /// or the transition is illegal (e.g. reviving a terminal entry).
    pub fn transition(&self, key: &ProcessKey, to: ProcessStatus) -> bool {
        let mut entries = self.entries.lock();
        match entries.get_mut(key) {
            Some(entry) if entry.status.can_transition_to(to) => {
                debug!(key = %key, from = %entry.status, to = %to, "status transition");
                entry.status = to;
                true
            }
            Some(entry) => {
                debug!(key = %key, from = %entry.status, to = %to, "transition refused");
                false
            }
            None => false,
        }
    }

    /// Record the exit outcome on an entry (status via [`Self::transition`]).
    pub fn set_exit(&self, key: &ProcessKey, exit_code: Option<i64>, finished_at_ms: u64) {
        let mut entries = self.entries.lock();
        if let Some(entry) = entries.get_mut(key) {
            entry.exit_code = exit_code;
            entry.finished_at_ms = Some(finished_at_ms);
            entry.pid = None;
        }
    }

    /// Append a captured output line, classifying well-known markers.
    pub fn append_log(&self, key: &ProcessKey, ts_ms: u64, stream: LogStream, line: &str) {
        let mut entries = self.entries.lock();
        let Some(entry) = entries.get_mut(key) else {
            return;
        };
        entry.logs.push(ts_ms, stream, line.to_string());
        if entry.error.is_none() {
            if let Some(info) = classify_output_line(line) {
                entry.error = Some(info);
            }
        }
        if !entry.ready_seen && looks_ready(line) {
            entry.ready_seen = true;
        }
    }

    /// Snapshot of every entry.
    pub fn snapshot(&self) -> Vec<ProcessEntry> {
        self.entries.lock().values().cloned().collect()
    }

    /// Drop terminal sync entries older than [`SYNC_ENTRY_TTL_MS`].
    pub fn prune_aged_sync_entries(&self, now_ms: u64) {
        self.entries.lock().retain(|_, e| {
            if !e.is_sync || !e.status.is_terminal() {
                return true;
            }
            match e.finished_at_ms {
                Some(finished) => now_ms.saturating_sub(finished) < SYNC_ENTRY_TTL_MS,
                None => true,
            }
        });
    }
}

#[cfg(test)]
#[path = "table_tests.rs"]
mod tests;
