//! `window.localStorage` backend

use playdeck_core::{Error, KeyValueStore, MemoryStore, Result, StorageKey};
use web_sys::Storage;

/// Persists player records in local storage
pub struct LocalStorage {
    storage: Storage,
}

impl LocalStorage {
    pub fn open() -> Option<Self> {
        let storage = web_sys::window()?.local_storage().ok()??;
        Some(Self { storage })
    }

    /// Local storage, or an in-memory store when the browser denies it
    /// (private mode, sandboxed iframes)
    pub fn open_or_memory() -> Box<dyn KeyValueStore> {
        match Self::open() {
            Some(storage) => Box::new(storage),
            None => {
                crate::warn("localStorage unavailable; positions and bookmarks will not persist");
                Box::new(MemoryStore::new())
            }
        }
    }
}

impl KeyValueStore for LocalStorage {
    fn get(&self, key: &StorageKey) -> Result<Option<String>> {
        self.storage
            .get_item(key.as_str())
            .map_err(|e| Error::storage(crate::describe(&e)))
    }

    fn set(&mut self, key: &StorageKey, value: &str) -> Result<()> {
        self.storage
            .set_item(key.as_str(), value)
            .map_err(|e| Error::storage(crate::describe(&e)))
    }
}
