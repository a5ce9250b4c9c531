//! Key-value storage backends
//!
//! Everything the app persists goes through [`KeyValueStore`]: string keys,
//! string values, synchronous calls. On the web this is `window.localStorage`;
//! natively (and in tests) it is a shared in-memory map.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

/// A read or write against the backend failed (quota exceeded, storage
/// disabled, ...). Carries the backend's own description.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("storage backend failure: {0}")]
pub struct StorageFailure(pub String);

/// Synchronous string key-value storage.
///
/// Handles are cheap to clone and every clone sees the same data, the way
/// every `localStorage` handle in a tab sees the same origin storage.
pub trait KeyValueStore: Clone {
    fn get(&self, key: &str) -> Result<Option<String>, StorageFailure>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageFailure>;
    fn remove(&self, key: &str) -> Result<(), StorageFailure>;
}

/// In-memory backend used on native targets and in tests
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    items: Rc<RefCell<BTreeMap<String, String>>>,
    read_only: Rc<Cell<bool>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail, like a full quota
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.set(read_only);
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    /// Stored keys in sorted order
    pub fn keys(&self) -> Vec<String> {
        self.items.borrow().keys().cloned().collect()
    }

    fn check_writable(&self) -> Result<(), StorageFailure> {
        if self.read_only.get() {
            return Err(StorageFailure("store is read-only".to_string()));
        }
        Ok(())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageFailure> {
        Ok(self.items.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageFailure> {
        self.check_writable()?;
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageFailure> {
        self.check_writable()?;
        self.items.borrow_mut().remove(key);
        Ok(())
    }
}

/// `window.localStorage` backend (WASM only)
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone)]
pub struct LocalStorage {
    storage: web_sys::Storage,
}

#[cfg(target_arch = "wasm32")]
impl LocalStorage {
    /// Open the origin's LocalStorage, if the browser exposes one
    pub fn open() -> Option<Self> {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()?;
        Some(Self { storage })
    }
}

#[cfg(target_arch = "wasm32")]
fn js_failure(err: wasm_bindgen::JsValue) -> StorageFailure {
    StorageFailure(format!("{:?}", err))
}

#[cfg(target_arch = "wasm32")]
impl KeyValueStore for LocalStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageFailure> {
        self.storage.get_item(key).map_err(js_failure)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageFailure> {
        self.storage.set_item(key, value).map_err(js_failure)
    }

    fn remove(&self, key: &str) -> Result<(), StorageFailure> {
        self.storage.remove_item(key).map_err(js_failure)
    }
}
