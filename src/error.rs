//! Error types for the storage layer and the state bridge

use thiserror::Error;

/// Failure raised by a [`KeyValueStore`](crate::storage::KeyValueStore) call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The store refused the write because it is full (or disabled and
    /// reporting itself as full)
    #[error("storage quota exceeded")]
    QuotaExceeded,
    /// Any other failure: access denied, security error, missing store
    #[error("storage access failed: {0}")]
    Access(String),
}

impl StoreError {
    pub fn is_quota(&self) -> bool {
        matches!(self, StoreError::QuotaExceeded)
    }
}

#[derive(Debug, Error)]
pub enum BridgeError {
    /// The snapshot key would be clobbered by the availability probe
    #[error("storage key {0:?} collides with the probe key")]
    KeyCollision(String),
    #[error("failed to serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unknown log level {0:?}")]
    LogLevel(String),
}
