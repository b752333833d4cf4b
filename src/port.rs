//! Message boundary between the bridge and the application runtime
//!
//! Outbound: [`RuntimeMessage`] values delivered through a [`RuntimePort`].
//! Inbound: snapshots to persist, pushed by the runtime into a one-way
//! channel (no acknowledgement, no backpressure).

use std::sync::mpsc;

use serde_json::{Value, json};

use crate::snapshot::Snapshot;

/// Payload delivered to the runtime
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeMessage {
    /// State recovered from storage
    Restored(Snapshot),
    /// Storage works but holds nothing usable
    Placeholder,
    /// Storage cannot be used this session
    StorageNotAvailable,
    /// A new service worker is installed and waiting
    UpdateAvailable,
}

impl RuntimeMessage {
    /// JSON form the runtime receives
    pub fn to_payload(&self) -> Value {
        match self {
            RuntimeMessage::Restored(snapshot) => snapshot.value().clone(),
            RuntimeMessage::Placeholder => json!({ "localStorage": "available" }),
            RuntimeMessage::StorageNotAvailable => json!({ "localStorage": "not_available" }),
            RuntimeMessage::UpdateAvailable => json!({ "serviceWorker": "update_available" }),
        }
    }

    pub fn is_sentinel(&self) -> bool {
        !matches!(self, RuntimeMessage::Restored(_))
    }
}

/// Outbound side of the runtime boundary
pub trait RuntimePort {
    fn deliver(&self, message: RuntimeMessage);
}

impl<F: Fn(RuntimeMessage)> RuntimePort for F {
    fn deliver(&self, message: RuntimeMessage) {
        self(message)
    }
}

/// Producer half held by the runtime
pub type PersistSender = mpsc::Sender<Snapshot>;

/// Consumer half owned by the bridge
pub type PersistReceiver = mpsc::Receiver<Snapshot>;

/// Create the inbound persistence channel
pub fn persist_channel() -> (PersistSender, PersistReceiver) {
    mpsc::channel()
}
