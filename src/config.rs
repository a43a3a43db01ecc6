//! Configuration Management
//!
//! Handles persistent configuration storage for azrm-lngw.

use crate::azure::{auth, client};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Subscription to manage resources in
    #[serde(default)]
    pub subscription_id: Option<String>,
    /// Management endpoint (sovereign clouds, test servers)
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Network provider API version
    #[serde(default)]
    pub api_version: Option<String>,
    /// Seconds between long-running operation polls
    #[serde(default)]
    pub poll_interval_secs: Option<u64>,
    /// Where resource state is kept
    #[serde(default)]
    pub state_path: Option<PathBuf>,
}

impl Config {
    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("azrm-lngw").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        Self::load_from(&path)
    }

    /// Load configuration from a specific file, defaults if missing or unreadable
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring unreadable config {:?}: {}", path, e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config {:?}", path))?;

        Ok(())
    }

    /// Get effective subscription (config > environment > Azure CLI profile)
    /// An explicitly configured id must be a GUID; it never falls through.
    pub fn effective_subscription(&self) -> Result<Option<String>> {
        match &self.subscription_id {
            Some(subscription) if auth::validate_subscription_id(subscription) => {
                Ok(Some(subscription.clone()))
            }
            Some(subscription) => Err(anyhow::anyhow!(
                "Invalid subscription id '{}': expected a GUID",
                subscription
            )),
            None => Ok(auth::get_default_subscription()),
        }
    }

    pub fn effective_endpoint(&self) -> String {
        self.endpoint
            .clone()
            .unwrap_or_else(|| client::DEFAULT_ENDPOINT.to_string())
    }

    pub fn effective_api_version(&self) -> String {
        self.api_version
            .clone()
            .unwrap_or_else(|| client::DEFAULT_API_VERSION.to_string())
    }

    pub fn effective_poll_interval(&self) -> Duration {
        self.poll_interval_secs
            .map(Duration::from_secs)
            .unwrap_or(client::DEFAULT_POLL_INTERVAL)
    }

    /// Get effective state path (config > data dir > working directory)
    pub fn effective_state_path(&self) -> PathBuf {
        if let Some(path) = &self.state_path {
            return path.clone();
        }
        dirs::data_dir()
            .map(|p| p.join("azrm-lngw").join("state.json"))
            .unwrap_or_else(|| PathBuf::from("azrm-lngw.state.json"))
    }
}
