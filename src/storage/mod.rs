//! Key-value store abstraction
//!
//! The bridge talks to storage only through [`KeyValueStore`]:
//! - `LocalStorage` wraps `window.localStorage` (wasm32 only)
//! - [`MemoryStore`] backs the native build and the tests

#[cfg(target_arch = "wasm32")]
mod web;

#[cfg(target_arch = "wasm32")]
pub use web::LocalStorage;

use std::collections::BTreeMap;

use crate::error::StoreError;

/// Synchronous string key-value store with `Storage`-like semantics
pub trait KeyValueStore {
    /// Read a value. `Ok(None)` when the key is absent.
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a value, replacing any previous one
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove a key. Removing an absent key is not an error.
    fn remove_item(&mut self, key: &str) -> Result<(), StoreError>;

    /// Number of stored entries
    fn len(&self) -> Result<usize, StoreError>;

    fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

/// DOMException codes browsers use for a full store
const QUOTA_CODES: [u16; 2] = [
    22,   // everything except Firefox
    1014, // Firefox
];

/// DOMException names browsers use for a full store (checked when the code
/// is missing)
const QUOTA_NAMES: [&str; 2] = ["QuotaExceededError", "NS_ERROR_DOM_QUOTA_REACHED"];

/// Whether a DOMException `code`/`name` pair means "quota exceeded"
pub fn is_quota_exception(code: u16, name: &str) -> bool {
    QUOTA_CODES.contains(&code) || QUOTA_NAMES.contains(&name)
}

/// Failure mode for a [`MemoryStore`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Mode {
    #[default]
    Open,
    /// Writes beyond this many bytes (keys + values) fail with `QuotaExceeded`
    Quota(usize),
    /// Every call fails with `Access`, like a store blocked by privacy settings
    Blocked,
}

/// In-memory store.
///
/// Can emulate a full or blocked browser store so the bridge's degraded
/// paths run natively.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
    mode: Mode,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that rejects writes once `bytes` would be exceeded
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            entries: BTreeMap::new(),
            mode: Mode::Quota(bytes),
        }
    }

    /// Store that fails every operation
    pub fn blocked() -> Self {
        Self {
            entries: BTreeMap::new(),
            mode: Mode::Blocked,
        }
    }

    /// Seed an entry directly, bypassing quota checks
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    fn used_bytes(&self) -> usize {
        self.entries.iter().map(|(k, v)| k.len() + v.len()).sum()
    }

    fn check_access(&self) -> Result<(), StoreError> {
        match self.mode {
            Mode::Blocked => Err(StoreError::Access("store is blocked".to_string())),
            _ => Ok(()),
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.check_access()?;
        Ok(self.entries.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.check_access()?;
        if let Mode::Quota(limit) = self.mode {
            let replaced = self.entries.get(key).map(|v| key.len() + v.len()).unwrap_or(0);
            let used = self.used_bytes() - replaced;
            if used + key.len() + value.len() > limit {
                return Err(StoreError::QuotaExceeded);
            }
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StoreError> {
        self.check_access()?;
        self.entries.remove(key);
        Ok(())
    }

    fn len(&self) -> Result<usize, StoreError> {
        self.check_access()?;
        Ok(self.entries.len())
    }
}
