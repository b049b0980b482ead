// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persisted last-run state per scheduled app.
//!
//! Written after every scheduled or manual execution completes; consulted at
//! startup for missed-run recovery.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::resolutions::StorageError;

/// Last-run record for one scheduled app.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_exit_code: Option<i64>,
    #[serde(default)]
    pub was_manual: bool,
}

/// Handle on the persisted schedule-state document.
pub struct ScheduleStateStore {
    path: PathBuf,
    state: Mutex<HashMap<String, ScheduleRecord>>,
}

impl ScheduleStateStore {
    /// Load the document; a missing or corrupt file yields an empty state
    /// (corrupt files are moved aside to `.bak`).
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let state = load_tolerant(&path)?;
        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    pub fn get(&self, app_id: &str) -> Option<ScheduleRecord> {
        self.state.lock().get(app_id).cloned()
    }

    pub fn snapshot(&self) -> HashMap<String, ScheduleRecord> {
        self.state.lock().clone()
    }

    /// Record a completed execution and persist.
    pub fn record_run(
        &self,
        app_id: &str,
        completed_at: DateTime<Utc>,
        exit_code: Option<i64>,
        was_manual: bool,
    ) -> Result<(), StorageError> {
        let mut state = self.state.lock();
        state.insert(
            app_id.to_string(),
            ScheduleRecord {
                last_run: Some(completed_at),
                last_exit_code: exit_code,
                was_manual,
            },
        );
        save_atomic(&self.path, &state)
    }

    /// Drop the record for a removed app and persist.
    pub fn forget(&self, app_id: &str) -> Result<(), StorageError> {
        let mut state = self.state.lock();
        if state.remove(app_id).is_some() {
            save_atomic(&self.path, &state)?;
        }
        Ok(())
    }
}

fn load_tolerant(path: &Path) -> Result<HashMap<String, ScheduleRecord>, StorageError> {
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let file = File::open(path)?;
    match serde_json::from_reader(BufReader::new(file)) {
        Ok(state) => Ok(state),
        Err(e) => {
            let bak = path.with_extension("bak");
            warn!(
                error = %e,
                path = %path.display(),
                "Corrupt schedule state, moving to .bak and starting empty",
            );
            fs::rename(path, &bak)?;
            Ok(HashMap::new())
        }
    }
}

fn save_atomic(path: &Path, state: &HashMap<String, ScheduleRecord>) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp_path = path.with_extension("tmp");
    {
        let file = File::create(&tmp_path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, state)?;
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
    }
    fs::rename(&tmp_path, path)?;
    Ok(())
}

#[cfg(test)]
#[path = "schedule_state_tests.rs"]
mod tests;
