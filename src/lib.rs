//! Flash Buddy browser bootstrap
//!
//! Core modules:
//! - `bridge`: State bridge between LocalStorage and the app runtime
//! - `storage`: Key-value store abstraction (LocalStorage on web)
//! - `port`: Runtime message payloads and the persistence channel
//! - `worker`: Service worker registration and update notices
//! - `config`: Bootstrap configuration

pub mod bridge;
pub mod config;
pub mod error;
pub mod port;
pub mod snapshot;
pub mod storage;
pub mod worker;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use bridge::{Availability, StateBridge, Subscription};
pub use config::{BridgeConfig, WorkerConfig};
pub use error::{BridgeError, ConfigError, StoreError};
pub use port::{RuntimeMessage, RuntimePort};
pub use snapshot::{STATE_CACHE_KEY, Snapshot, StorageKey};
pub use storage::{KeyValueStore, MemoryStore};
