//! State bridge between persistent storage and the application runtime
//!
//! Startup runs once:
//! 1. Probe the store
//! 2. Unavailable → tell the runtime and stop (no subscription)
//! 3. Available → keep the persistence channel open
//! 4. Deliver the recovered snapshot, or a placeholder, exactly once
//!
//! Storage failures never cross this boundary: availability becomes an
//! [`Availability`], reads become `Option<Snapshot>`.

use crate::error::BridgeError;
use crate::port::{PersistReceiver, RuntimeMessage, RuntimePort};
use crate::snapshot::{PROBE_KEY, Snapshot, StorageKey};
use crate::storage::KeyValueStore;

/// Result of the startup probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Available,
    Unavailable,
}

impl Availability {
    pub fn is_available(&self) -> bool {
        *self == Availability::Available
    }
}

/// Check that the store accepts a write and a delete.
///
/// A quota failure on a store that already holds data means "full", which
/// still counts as available. On an empty store it means storage is disabled.
pub fn probe_availability<S: KeyValueStore>(store: &mut S) -> Availability {
    let result = store
        .set_item(PROBE_KEY, PROBE_KEY)
        .and_then(|_| store.remove_item(PROBE_KEY));

    match result {
        Ok(()) => Availability::Available,
        Err(e) if e.is_quota() && store.len().map(|n| n > 0).unwrap_or(false) => {
            log::warn!("Local storage is full, keeping it enabled");
            Availability::Available
        }
        Err(e) => {
            log::warn!("Local storage not available: {}", e);
            Availability::Unavailable
        }
    }
}

/// Read and parse the snapshot at `key`.
///
/// A corrupt entry is deleted so the next startup begins clean.
pub fn load_snapshot<S: KeyValueStore>(store: &mut S, key: &StorageKey) -> Option<Snapshot> {
    let json = match store.get_item(key.as_str()) {
        Ok(Some(json)) => json,
        Ok(None) => return None,
        Err(e) => {
            log::warn!("Failed to read {}: {}", key, e);
            return None;
        }
    };

    match Snapshot::from_json(&json) {
        Ok(snapshot) => Some(snapshot),
        Err(e) => {
            log::warn!("Encountered: {}, clearing local cache", e);
            if let Err(e) = store.remove_item(key.as_str()) {
                log::warn!("Failed to clear {}: {}", key, e);
            }
            None
        }
    }
}

/// Serialize `snapshot` over whatever is stored at `key`
pub fn store_snapshot<S: KeyValueStore>(
    store: &mut S,
    key: &StorageKey,
    snapshot: &Snapshot,
) -> Result<(), BridgeError> {
    let json = snapshot.to_json()?;
    store.set_item(key.as_str(), &json)?;
    log::debug!("Stored {} ({} bytes)", key, json.len());
    Ok(())
}

/// Bridge before startup
#[derive(Debug)]
pub struct StateBridge<S> {
    store: S,
    key: StorageKey,
}

impl<S: KeyValueStore> StateBridge<S> {
    pub fn new(store: S, key: StorageKey) -> Result<Self, BridgeError> {
        if key.as_str() == PROBE_KEY {
            return Err(BridgeError::KeyCollision(key.as_str().to_string()));
        }
        Ok(Self { store, key })
    }

    pub fn key(&self) -> &StorageKey {
        &self.key
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn probe(&mut self) -> Availability {
        probe_availability(&mut self.store)
    }

    pub fn load_snapshot(&mut self) -> Option<Snapshot> {
        load_snapshot(&mut self.store, &self.key)
    }

    pub fn store_snapshot(&mut self, snapshot: &Snapshot) -> Result<(), BridgeError> {
        store_snapshot(&mut self.store, &self.key, snapshot)
    }

    /// Run the startup sequence.
    ///
    /// Returns the live subscription, or `None` when storage is unavailable.
    /// In that case `requests` is dropped, so runtime sends fail.
    pub fn start<P: RuntimePort + ?Sized>(
        mut self,
        port: &P,
        requests: PersistReceiver,
    ) -> Option<Subscription<S>> {
        if !self.probe().is_available() {
            port.deliver(RuntimeMessage::StorageNotAvailable);
            return None;
        }

        let message = match self.load_snapshot() {
            Some(snapshot) => {
                log::info!("Restored state from {}", self.key);
                RuntimeMessage::Restored(snapshot)
            }
            None => RuntimeMessage::Placeholder,
        };
        port.deliver(message);

        Some(Subscription {
            bridge: self,
            requests,
        })
    }
}

/// Bridge after a successful startup, consuming persistence requests
#[derive(Debug)]
pub struct Subscription<S> {
    bridge: StateBridge<S>,
    requests: PersistReceiver,
}

impl<S: KeyValueStore> Subscription<S> {
    /// Write every queued request in arrival order. Returns how many landed.
    ///
    /// Failed writes are logged and dropped; there is no retry.
    pub fn pump(&mut self) -> usize {
        let mut written = 0;
        while let Ok(snapshot) = self.requests.try_recv() {
            match self.bridge.store_snapshot(&snapshot) {
                Ok(()) => written += 1,
                Err(e) => log::warn!("Dropped state write: {}", e),
            }
        }
        written
    }

    pub fn bridge(&self) -> &StateBridge<S> {
        &self.bridge
    }

    pub fn bridge_mut(&mut self) -> &mut StateBridge<S> {
        &mut self.bridge
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::port::persist_channel;
    use crate::snapshot::STATE_CACHE_KEY;
    use crate::storage::MemoryStore;
    use proptest::prelude::*;
    use serde_json::json;
    use std::cell::RefCell;

    fn key() -> StorageKey {
        StorageKey::new(STATE_CACHE_KEY)
    }

    /// Run startup and collect what the runtime was told
    fn start(store: MemoryStore) -> (Option<Subscription<MemoryStore>>, Vec<RuntimeMessage>) {
        let seen = RefCell::new(Vec::new());
        let port = |m: RuntimeMessage| seen.borrow_mut().push(m);
        let (_tx, rx) = persist_channel();
        let bridge = StateBridge::new(store, key()).unwrap();
        let sub = bridge.start(&port, rx);
        (sub, seen.into_inner())
    }

    #[test]
    fn test_probe_open_store_leaves_no_marker() {
        let mut store = MemoryStore::new();
        assert_eq!(probe_availability(&mut store), Availability::Available);
        assert!(!store.contains_key(PROBE_KEY));
        assert_eq!(store.len().unwrap(), 0);
    }

    #[test]
    fn test_probe_access_failure_is_unavailable() {
        let mut store = MemoryStore::blocked();
        assert_eq!(probe_availability(&mut store), Availability::Unavailable);
    }

    #[test]
    fn test_probe_quota_on_empty_store_is_unavailable() {
        let mut store = MemoryStore::with_quota(0);
        assert_eq!(probe_availability(&mut store), Availability::Unavailable);
    }

    #[test]
    fn test_probe_quota_on_full_store_is_available() {
        let mut store = MemoryStore::with_quota(8);
        store.insert("deck", "spanish");
        assert_eq!(probe_availability(&mut store), Availability::Available);
        assert!(!store.contains_key(PROBE_KEY));
    }

    #[test]
    fn test_probe_key_collision_rejected() {
        let result = StateBridge::new(MemoryStore::new(), StorageKey::new(PROBE_KEY));
        assert!(matches!(result, Err(BridgeError::KeyCollision(_))));
    }

    #[test]
    fn test_load_absent_does_not_touch_store() {
        let mut store = MemoryStore::new();
        store.insert("other", "1");
        assert_eq!(load_snapshot(&mut store, &key()), None);
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_load_corrupt_clears_entry() {
        let mut store = MemoryStore::new();
        store.insert(STATE_CACHE_KEY, "{not json");

        assert_eq!(load_snapshot(&mut store, &key()), None);
        assert!(!store.contains_key(STATE_CACHE_KEY));
        // Second load is quiet
        assert_eq!(load_snapshot(&mut store, &key()), None);
    }

    #[test]
    fn test_load_read_failure_is_empty() {
        let mut store = MemoryStore::blocked();
        assert_eq!(load_snapshot(&mut store, &key()), None);
    }

    #[test]
    fn test_store_overwrites() {
        let mut store = MemoryStore::new();
        store_snapshot(&mut store, &key(), &Snapshot::new(json!({"v": 1}))).unwrap();
        store_snapshot(&mut store, &key(), &Snapshot::new(json!({"v": 2}))).unwrap();
        assert_eq!(
            load_snapshot(&mut store, &key()),
            Some(Snapshot::new(json!({"v": 2})))
        );
    }

    #[test]
    fn test_store_failure_is_returned() {
        let mut store = MemoryStore::with_quota(4);
        let result = store_snapshot(&mut store, &key(), &Snapshot::new(json!("too big")));
        assert!(matches!(
            result,
            Err(BridgeError::Store(StoreError::QuotaExceeded))
        ));
    }

    #[test]
    fn test_startup_restores_snapshot() {
        let mut store = MemoryStore::new();
        store.insert(STATE_CACHE_KEY, r#"{"decks":["verbs"]}"#);
        let (sub, seen) = start(store);
        assert!(sub.is_some());
        assert_eq!(
            seen,
            vec![RuntimeMessage::Restored(Snapshot::new(json!({"decks": ["verbs"]})))]
        );
    }

    #[test]
    fn test_startup_empty_store_sends_placeholder() {
        let (sub, seen) = start(MemoryStore::new());
        assert!(sub.is_some());
        assert_eq!(seen, vec![RuntimeMessage::Placeholder]);
    }

    #[test]
    fn test_startup_corrupt_snapshot() {
        let mut store = MemoryStore::new();
        store.insert("flashBuddyState", "{not json");
        let (sub, seen) = start(store);

        assert_eq!(seen, vec![RuntimeMessage::Placeholder]);
        let sub = sub.unwrap();
        assert!(!sub.bridge().store().contains_key("flashBuddyState"));
    }

    #[test]
    fn test_startup_unavailable_has_no_subscription() {
        let seen = RefCell::new(Vec::new());
        let port = |m: RuntimeMessage| seen.borrow_mut().push(m);
        let (tx, rx) = persist_channel();
        let bridge = StateBridge::new(MemoryStore::blocked(), key()).unwrap();

        assert!(bridge.start(&port, rx).is_none());
        assert_eq!(seen.into_inner(), vec![RuntimeMessage::StorageNotAvailable]);
        assert_eq!(
            RuntimeMessage::StorageNotAvailable.to_payload(),
            json!({"localStorage": "not_available"})
        );
        // Nobody is listening for persistence requests
        assert!(tx.send(Snapshot::new(json!({}))).is_err());
    }

    #[test]
    fn test_pump_last_write_wins() {
        let port = |_: RuntimeMessage| {};
        let (tx, rx) = persist_channel();
        let bridge = StateBridge::new(MemoryStore::new(), key()).unwrap();
        let mut sub = bridge.start(&port, rx).unwrap();

        for round in 1..=3 {
            tx.send(Snapshot::new(json!({ "round": round }))).unwrap();
        }
        assert_eq!(sub.pump(), 3);
        assert_eq!(sub.pump(), 0);
        assert_eq!(
            sub.bridge_mut().load_snapshot(),
            Some(Snapshot::new(json!({"round": 3})))
        );
    }

    #[test]
    fn test_pump_drops_failed_write() {
        let port = |_: RuntimeMessage| {};
        let (tx, rx) = persist_channel();
        // Room for the probe marker but not much else
        let store = MemoryStore::with_quota(PROBE_KEY.len() * 2);
        let bridge = StateBridge::new(store, key()).unwrap();
        let mut sub = bridge.start(&port, rx).unwrap();

        tx.send(Snapshot::new(json!({"cards": ["a", "b", "c"]})))
            .unwrap();
        assert_eq!(sub.pump(), 0);
        assert!(!sub.bridge().store().contains_key(STATE_CACHE_KEY));
    }

    fn arb_json() -> impl Strategy<Value = serde_json::Value> {
        let leaf = prop_oneof![
            Just(serde_json::Value::Null),
            any::<bool>().prop_map(serde_json::Value::Bool),
            any::<i64>().prop_map(serde_json::Value::from),
            "[a-zA-Z0-9 áé\"\\\\]{0,12}".prop_map(serde_json::Value::String),
        ];
        leaf.prop_recursive(3, 32, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(serde_json::Value::Array),
                prop::collection::btree_map("[a-z]{1,8}", inner, 0..4)
                    .prop_map(|m| serde_json::Value::Object(m.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn test_store_then_load_returns_same_snapshot(value in arb_json()) {
            let mut store = MemoryStore::new();
            let snapshot = Snapshot::new(value);
            store_snapshot(&mut store, &key(), &snapshot).unwrap();
            prop_assert_eq!(load_snapshot(&mut store, &key()), Some(snapshot));
        }
    }
}
