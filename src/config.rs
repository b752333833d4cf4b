//! Bootstrap configuration
//!
//! Supplied by the page as a plain JS object (or JSON). Every field has a
//! default, so `{}` and `undefined` are both valid.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::snapshot::{STATE_CACHE_KEY, StorageKey};

/// Service worker registration settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WorkerConfig {
    /// Register the worker. When false, any existing registration is removed.
    pub enabled: bool,
    /// Worker script URL
    pub script_url: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            script_url: "/service-worker.js".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BridgeConfig {
    /// Key the application state is persisted under
    pub storage_key: String,
    /// Console log level (error, warn, info, debug, trace)
    pub log_level: String,
    pub service_worker: WorkerConfig,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            storage_key: STATE_CACHE_KEY.to_string(),
            log_level: "info".to_string(),
            service_worker: WorkerConfig::default(),
        }
    }
}

impl BridgeConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn storage_key(&self) -> StorageKey {
        StorageKey::new(self.storage_key.as_str())
    }

    pub fn log_level(&self) -> Result<log::Level, ConfigError> {
        self.log_level
            .parse()
            .map_err(|_| ConfigError::LogLevel(self.log_level.clone()))
    }
}
