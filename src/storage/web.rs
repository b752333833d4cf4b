//! `window.localStorage` backend

use wasm_bindgen::{JsCast, JsValue};

use super::{KeyValueStore, is_quota_exception};
use crate::error::StoreError;

/// Browser LocalStorage
pub struct LocalStorage {
    storage: web_sys::Storage,
}

impl LocalStorage {
    /// Open `window.localStorage`.
    ///
    /// Merely touching the property throws in some privacy modes, so this can
    /// fail before any read or write happens.
    pub fn open() -> Result<Self, StoreError> {
        let window =
            web_sys::window().ok_or_else(|| StoreError::Access("no window".to_string()))?;
        let storage = window
            .local_storage()
            .map_err(to_store_error)?
            .ok_or_else(|| StoreError::Access("localStorage is null".to_string()))?;
        Ok(Self { storage })
    }
}

/// Map a thrown JS value onto the store error taxonomy
fn to_store_error(err: JsValue) -> StoreError {
    match err.dyn_ref::<web_sys::DomException>() {
        Some(ex) if is_quota_exception(ex.code(), &ex.name()) => StoreError::QuotaExceeded,
        Some(ex) => StoreError::Access(format!("{}: {}", ex.name(), ex.message())),
        None => StoreError::Access(format!("{:?}", err)),
    }
}

impl KeyValueStore for LocalStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.storage.get_item(key).map_err(to_store_error)
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.storage.set_item(key, value).map_err(to_store_error)
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StoreError> {
        self.storage.remove_item(key).map_err(to_store_error)
    }

    fn len(&self) -> Result<usize, StoreError> {
        self.storage
            .length()
            .map(|n| n as usize)
            .map_err(to_store_error)
    }
}
