//! Configuration management for syncboard
//!
//! This module handles loading, validating, and persisting the sync
//! configuration. The persisted form is JSON so the WebUI can POST the
//! same shape back through `/api/config`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error reading or writing the config file
    #[error("Failed to access config file: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing or serialization error
    #[error("Failed to parse config JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Validation error
    #[error("Config validation failed: {0}")]
    Validation(String),
}

/// Sync configuration, persisted as JSON
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// WebDAV endpoint URL; empty means no remote store is configured
    #[serde(default)]
    pub webdav_url: String,

    /// WebDAV username
    #[serde(default)]
    pub webdav_username: String,

    /// WebDAV password
    #[serde(default)]
    pub webdav_password: String,

    /// Seconds between scheduled sync attempts
    #[serde(default = "default_sync_interval")]
    pub sync_interval: u64,

    /// Whether scheduled sync is enabled
    #[serde(default)]
    pub enabled: bool,
}

fn default_sync_interval() -> u64 {
    60
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            webdav_url: String::new(),
            webdav_username: String::new(),
            webdav_password: String::new(),
            sync_interval: default_sync_interval(),
            enabled: false,
        }
    }
}

impl SyncConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: SyncConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file, creating parent directories
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;

        Ok(())
    }

    /// Validate configuration values
    ///
    /// An enabled configuration must carry a positive interval.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.enabled && self.sync_interval == 0 {
            return Err(ConfigError::Validation(
                "sync_interval must be positive when sync is enabled".to_string(),
            ));
        }

        Ok(())
    }
}

/// Default configuration file path
///
/// Uses the platform data directory when one resolves, otherwise the
/// Magisk module location used on rooted Android devices.
pub fn default_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("syncboard").join("config.json"))
        .unwrap_or_else(|| PathBuf::from("/data/adb/syncboard/config.json"))
}
