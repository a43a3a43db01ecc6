//! Local state storage
//!
//! One JSON document mapping a label to the last observed state of the
//! resource behind it.

use crate::resource::ResourceData;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const STATE_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateEntry {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub data: ResourceData,
    /// RFC 3339 time of the last successful sync
    pub synced_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateFile {
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub resources: BTreeMap<String, StateEntry>,
}

impl Default for StateFile {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            resources: BTreeMap::new(),
        }
    }
}

impl StateFile {
    pub fn get(&self, label: &str) -> Option<&StateEntry> {
        self.resources.get(label)
    }

    /// Record `data` under `label`; an absent resource is dropped instead
    pub fn put(&mut self, label: &str, resource_type: &str, data: ResourceData) {
        if data.is_absent() {
            self.resources.remove(label);
            return;
        }

        self.resources.insert(
            label.to_string(),
            StateEntry {
                resource_type: resource_type.to_string(),
                data,
                synced_at: chrono::Utc::now().to_rfc3339(),
            },
        );
    }

    pub fn remove(&mut self, label: &str) -> Option<StateEntry> {
        self.resources.remove(label)
    }
}

/// Reads and writes the state file
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load state, empty if the file does not exist yet
    pub fn load(&self) -> Result<StateFile> {
        if !self.path.exists() {
            return Ok(StateFile::default());
        }

        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read state {:?}", self.path))?;
        let state: StateFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse state {:?}", self.path))?;

        if state.version > STATE_VERSION {
            return Err(anyhow::anyhow!(
                "State {:?} has version {}, this build understands up to {}",
                self.path,
                state.version,
                STATE_VERSION
            ));
        }
        Ok(state)
    }

    /// Write state through a temporary file so a crash never leaves it half written
    pub fn save(&self, state: &StateFile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let tmp = self.path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(state)?;
        std::fs::write(&tmp, content)
            .with_context(|| format!("Failed to write state {:?}", tmp))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace state {:?}", self.path))?;

        tracing::debug!("Saved {} resources to {:?}", state.resources.len(), self.path);
        Ok(())
    }
}
