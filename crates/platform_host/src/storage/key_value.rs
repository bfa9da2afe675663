//! Small-capacity synchronous key-value storage contracts and in-memory adapters.
//!
//! This is the contract behind browser `localStorage`: string keys, raw JSON text values, and a
//! hard capacity limit that surfaces as [`StorageError::QuotaExceeded`].

use std::{cell::RefCell, collections::BTreeMap, rc::Rc};

use super::error::StorageError;

/// Host service for fast, synchronous key-value storage (JSON stored as text per key).
pub trait KeyValueStore {
    /// Loads the raw text stored under `key`.
    fn get_raw(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Stores raw text under `key`, replacing any previous value.
    fn set_raw(&self, key: &str, raw: &str) -> Result<(), StorageError>;

    /// Removes `key`. Removing an absent key succeeds.
    fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Lists all keys currently present, sorted.
    fn keys(&self) -> Result<Vec<String>, StorageError>;
}

#[derive(Debug, Clone, Default)]
/// In-memory key-value store with an optional byte quota.
///
/// The quota counts key and value bytes of every entry, mirroring how browsers account for
/// `localStorage` usage. Clones share the same underlying map.
pub struct MemoryKeyValueStore {
    inner: Rc<RefCell<BTreeMap<String, String>>>,
    quota_bytes: Option<usize>,
}

impl MemoryKeyValueStore {
    /// Creates a store that rejects writes once `quota_bytes` would be exceeded.
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            inner: Rc::default(),
            quota_bytes: Some(quota_bytes),
        }
    }

    /// Returns the number of bytes currently in use.
    pub fn used_bytes(&self) -> usize {
        self.inner
            .borrow()
            .iter()
            .map(|(key, value)| key.len() + value.len())
            .sum()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get_raw(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.inner.borrow().get(key).cloned())
    }

    fn set_raw(&self, key: &str, raw: &str) -> Result<(), StorageError> {
        if let Some(quota) = self.quota_bytes {
            let replaced = self
                .inner
                .borrow()
                .get(key)
                .map(|old| key.len() + old.len())
                .unwrap_or(0);
            let projected = self.used_bytes() - replaced + key.len() + raw.len();
            if projected > quota {
                return Err(StorageError::QuotaExceeded);
            }
        }
        self.inner
            .borrow_mut()
            .insert(key.to_string(), raw.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.inner.borrow_mut().remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.inner.borrow().keys().cloned().collect())
    }
}
