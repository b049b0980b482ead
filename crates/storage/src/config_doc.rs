// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The declarative config document: app declarations plus port reservations.
//!
//! The document is always rewritten whole (write to `.tmp`, fsync, rename)
//! so a crash mid-save never leaves a partially written file. Concurrent
//! writers are serialized by [`ConfigStore::mutate`], which holds the
//! document lock across the mutation and the save.

use parking_lot::Mutex;
use ql_core::{AppConfig, AppPatch};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// The supervisor's own port. Its reservation is always present and may not
/// be removed.
pub const SUPERVISOR_PORT: u16 = 8000;

/// Description attached to the supervisor's reservation.
pub const SUPERVISOR_PORT_LABEL: &str = "QuickLaunch supervisor";

/// Errors from config document operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown app: {0}")]
    UnknownApp(String),

    #[error("app id already exists: {0}")]
    DuplicateApp(String),

    #[error("port {port} is reserved: {description}")]
    PortReserved { port: u16, description: String },

    #[error("port {port} is already assigned to app '{used_by}'")]
    PortAssigned { port: u16, used_by: String },

    #[error("the supervisor reservation on port {SUPERVISOR_PORT} may not be removed")]
    SupervisorReservation,
}

/// What owns a port in the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortOwner {
    Reserved { description: String },
    App { id: String, name: String },
}

/// The persisted document: every declared app and every reservation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigDocument {
    #[serde(default)]
    pub apps: Vec<AppConfig>,
    #[serde(default)]
    pub reserved_ports: BTreeMap<u16, String>,
}

impl ConfigDocument {
    /// Fresh document containing only the supervisor's reservation.
    pub fn initial() -> Self {
        let mut reserved_ports = BTreeMap::new();
        reserved_ports.insert(SUPERVISOR_PORT, SUPERVISOR_PORT_LABEL.to_string());
        Self {
            apps: Vec::new(),
            reserved_ports,
        }
    }

    pub fn app(&self, id: &str) -> Option<&AppConfig> {
        self.apps.iter().find(|a| a.id == id)
    }

    /// Who owns `port`, ignoring the app named by `exclude`.
    pub fn port_owner(&self, port: u16, exclude: Option<&str>) -> Option<PortOwner> {
        if let Some(description) = self.reserved_ports.get(&port) {
            return Some(PortOwner::Reserved {
                description: description.clone(),
            });
        }
        self.apps
            .iter()
            .filter(|a| a.port == port && port > 0)
            .find(|a| exclude != Some(a.id.as_str()))
            .map(|a| PortOwner::App {
                id: a.id.clone(),
                name: a.name.clone(),
            })
    }

    /// Validate that `port` can be claimed by `app_id` (or a reservation when
    /// `app_id` is `None`).
    pub fn validate_port(&self, port: u16, exclude: Option<&str>) -> Result<(), ConfigError> {
        if port == 0 {
            return Ok(());
        }
        match self.port_owner(port, exclude) {
            Some(PortOwner::Reserved { description }) => {
                Err(ConfigError::PortReserved { port, description })
            }
            Some(PortOwner::App { name, .. }) => Err(ConfigError::PortAssigned {
                port,
                used_by: name,
            }),
            None => Ok(()),
        }
    }

    /// Add a new app after checking the document invariants.
    pub fn add_app(&mut self, app: AppConfig) -> Result<(), ConfigError> {
        if self.app(&app.id).is_some() {
            return Err(ConfigError::DuplicateApp(app.id));
        }
        self.validate_port(app.port, None)?;
        self.apps.push(app);
        Ok(())
    }

    /// Apply a partial update. The id is immutable; a port change is
    /// re-validated against the registry.
    pub fn update_app(&mut self, id: &str, patch: &AppPatch) -> Result<AppConfig, ConfigError> {
        if let Some(port) = patch.port {
            self.validate_port(port, Some(id))?;
        }
        let app = self
            .apps
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| ConfigError::UnknownApp(id.to_string()))?;
        patch.apply(app);
        Ok(app.clone())
    }

    pub fn remove_app(&mut self, id: &str) -> Result<AppConfig, ConfigError> {
        let idx = self
            .apps
            .iter()
            .position(|a| a.id == id)
            .ok_or_else(|| ConfigError::UnknownApp(id.to_string()))?;
        Ok(self.apps.remove(idx))
    }

    pub fn reserve_port(&mut self, port: u16, description: String) -> Result<(), ConfigError> {
        self.validate_port(port, None)?;
        self.reserved_ports.insert(port, description);
        Ok(())
    }

    pub fn release_port(&mut self, port: u16) -> Result<(), ConfigError> {
        if port == SUPERVISOR_PORT {
            return Err(ConfigError::SupervisorReservation);
        }
        self.reserved_ports.remove(&port);
        Ok(())
    }
}

/// Handle on the persisted config document.
///
/// Reads are cheap snapshots; every mutation rewrites the whole file
/// atomically while the document lock is held.
pub struct ConfigStore {
    path: PathBuf,
    doc: Mutex<ConfigDocument>,
}

impl ConfigStore {
    /// Load the document, creating one with the supervisor's reservation if
    /// the file is absent. A corrupt file is moved aside to `.bak` and
    /// replaced with a fresh document rather than aborting startup.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let doc = match Self::load(&path)? {
            Some(mut doc) => {
                // The supervisor reservation is an invariant, even if the
                // human-edited file dropped it.
                doc.reserved_ports
                    .entry(SUPERVISOR_PORT)
                    .or_insert_with(|| SUPERVISOR_PORT_LABEL.to_string());
                doc
            }
            None => {
                let doc = ConfigDocument::initial();
                save_atomic(&path, &doc)?;
                doc
            }
        };
        Ok(Self {
            path,
            doc: Mutex::new(doc),
        })
    }

    fn load(path: &Path) -> Result<Option<ConfigDocument>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }
        let file = File::open(path)?;
        match serde_json::from_reader(BufReader::new(file)) {
            Ok(doc) => Ok(Some(doc)),
            Err(e) => {
                let bak = path.with_extension("bak");
                warn!(
                    error = %e,
                    path = %path.display(),
                    bak = %bak.display(),
                    "Corrupt config document, moving to .bak and starting fresh",
                );
                fs::rename(path, &bak)?;
                Ok(None)
            }
        }
    }

    /// Best-effort snapshot of the current document.
    pub fn snapshot(&self) -> ConfigDocument {
        self.doc.lock().clone()
    }

    /// Apply a mutation and persist the result atomically.
    ///
    /// The lock is held across mutation and save so concurrent writers are
    /// serialized. A failed mutation leaves the document untouched.
    pub fn mutate<T>(
        &self,
        f: impl FnOnce(&mut ConfigDocument) -> Result<T, ConfigError>,
    ) -> Result<T, ConfigError> {
        let mut doc = self.doc.lock();
        let mut working = doc.clone();
        let out = f(&mut working)?;
        save_atomic(&self.path, &working)?;
        *doc = working;
        Ok(out)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Write the document to `.tmp`, fsync, then rename over the target.
fn save_atomic(path: &Path, doc: &ConfigDocument) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = path.with_extension("tmp");
    {
        let file = File::create(&tmp_path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, doc)?;
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
    }
    fs::rename(&tmp_path, path)?;
    Ok(())
}

#[cfg(test)]
#[path = "config_doc_tests.rs"]
mod tests;
