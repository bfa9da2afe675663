//! Two-tier storage façade: a small synchronous store with transparent overflow into a large
//! asynchronous one.
//!
//! Writes go to the fast store unless the serialized value exceeds
//! [`StorageConfig::overflow_threshold_bytes`] or the fast store reports a quota failure. In
//! either case the value is written to the large store in the background and the fast store keeps
//! an overflow marker under the same key. Overflowed values are mirrored in memory so synchronous
//! reads keep working for the rest of the session; after a reload they become readable again
//! once [`TieredStorage::hydrate_overflow`] has run.

use std::{cell::RefCell, collections::HashMap, rc::Rc};

use leptos::logging;
use platform_host::{AppStateEnvelope, AppStateStore, KeyValueStore, TaskSpawner};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

/// Schema version stamped on overflow envelopes.
pub const OVERFLOW_SCHEMA_VERSION: u32 = 1;
/// Default size above which values skip the fast store (256 KiB).
pub const DEFAULT_OVERFLOW_THRESHOLD_BYTES: usize = 256 * 1024;
/// Default fast-store marker. Not valid JSON, so it can never collide with a stored value.
pub const DEFAULT_OVERFLOW_MARKER: &str = "@@webtop:overflow@@";

#[derive(Debug, Clone, PartialEq, Eq)]
/// Routing configuration for [`TieredStorage`].
pub struct StorageConfig {
    /// Serialized size (bytes) above which a value is written to the large store.
    pub overflow_threshold_bytes: usize,
    /// Raw text written to the fast store in place of an overflowed value.
    pub overflow_marker: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            overflow_threshold_bytes: DEFAULT_OVERFLOW_THRESHOLD_BYTES,
            overflow_marker: DEFAULT_OVERFLOW_MARKER.to_string(),
        }
    }
}

#[derive(Clone)]
/// Key-value persistence backend used by the state store.
///
/// Clones share the same backends and overflow mirror.
pub struct TieredStorage {
    fast: Rc<dyn KeyValueStore>,
    large: Rc<dyn AppStateStore>,
    spawner: Rc<dyn TaskSpawner>,
    config: StorageConfig,
    overflow: Rc<RefCell<HashMap<String, Value>>>,
}

impl TieredStorage {
    /// Creates a storage façade over explicit backends.
    pub fn new(
        fast: Rc<dyn KeyValueStore>,
        large: Rc<dyn AppStateStore>,
        spawner: Rc<dyn TaskSpawner>,
        config: StorageConfig,
    ) -> Self {
        Self {
            fast,
            large,
            spawner,
            config,
            overflow: Rc::default(),
        }
    }

    /// Returns the routing configuration.
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Reads `key`, returning `default` when it is absent, unreadable, or not yet hydrated.
    pub fn get<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.get_opt(key).unwrap_or(default)
    }

    /// Reads and decodes `key` synchronously.
    pub fn get_opt<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        decode(key, self.read_value(key)?)
    }

    /// Reads `key`, loading it from the large store when it is not available synchronously.
    pub async fn get_async<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        if let Some(value) = self.read_value(key) {
            return decode(key, value);
        }
        match self.large.load_app_state_envelope(key).await {
            Ok(Some(envelope)) => {
                self.overflow
                    .borrow_mut()
                    .insert(key.to_string(), envelope.payload.clone());
                decode(key, envelope.payload)
            }
            Ok(None) => None,
            Err(err) => {
                logging::warn!("large store read for `{key}` failed: {err}");
                None
            }
        }
    }

    /// Loads every overflowed value from the large store into the in-memory mirror.
    ///
    /// Keys whose fast-store entry holds a real value are skipped, since that value is newer.
    /// Returns the number of values loaded.
    pub async fn hydrate_overflow(&self) -> usize {
        let namespaces = match self.large.list_app_state_namespaces().await {
            Ok(namespaces) => namespaces,
            Err(err) => {
                logging::warn!("large store listing failed: {err}");
                return 0;
            }
        };

        let mut loaded = 0;
        for namespace in namespaces {
            if self.fast_holds_value(&namespace) {
                continue;
            }
            match self.large.load_app_state_envelope(&namespace).await {
                Ok(Some(envelope)) => {
                    self.overflow
                        .borrow_mut()
                        .insert(namespace, envelope.payload);
                    loaded += 1;
                }
                Ok(None) => {}
                Err(err) => logging::warn!("large store read for `{namespace}` failed: {err}"),
            }
        }
        loaded
    }

    /// Serializes and writes `value` under `key`. Returns `false` when the value could not be
    /// stored anywhere.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> bool {
        let value = match serde_json::to_value(value) {
            Ok(value) => value,
            Err(err) => {
                logging::warn!("serialize `{key}` failed: {err}");
                return false;
            }
        };
        let raw = value.to_string();

        if raw.len() > self.config.overflow_threshold_bytes {
            return self.write_overflow(key, value);
        }

        match self.fast.set_raw(key, &raw) {
            Ok(()) => {
                let was_overflowed = self.overflow.borrow_mut().remove(key).is_some();
                if was_overflowed {
                    self.delete_overflow_envelope(key);
                }
                true
            }
            Err(err) if err.is_quota() => {
                logging::warn!("fast store full; routing `{key}` to large store");
                self.write_overflow(key, value)
            }
            Err(err) => {
                logging::warn!("fast store write for `{key}` failed: {err}");
                false
            }
        }
    }

    /// Removes `key` from both tiers.
    pub fn remove(&self, key: &str) -> bool {
        let removed = match self.fast.remove(key) {
            Ok(()) => true,
            Err(err) => {
                logging::warn!("fast store remove for `{key}` failed: {err}");
                false
            }
        };
        if self.overflow.borrow_mut().remove(key).is_some() {
            self.delete_overflow_envelope(key);
        }
        removed
    }

    /// Returns `true` when the current value of `key` lives in the large store.
    pub fn is_overflowed(&self, key: &str) -> bool {
        self.overflow.borrow().contains_key(key)
    }

    fn read_value(&self, key: &str) -> Option<Value> {
        match self.fast.get_raw(key) {
            Ok(Some(raw)) if raw == self.config.overflow_marker => self.mirrored(key),
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => Some(value),
                Err(err) => {
                    logging::warn!("stored value for `{key}` is not valid JSON: {err}");
                    None
                }
            },
            Ok(None) => self.mirrored(key),
            Err(err) => {
                logging::warn!("fast store read for `{key}` failed: {err}");
                self.mirrored(key)
            }
        }
    }

    fn mirrored(&self, key: &str) -> Option<Value> {
        self.overflow.borrow().get(key).cloned()
    }

    fn fast_holds_value(&self, key: &str) -> bool {
        matches!(
            self.fast.get_raw(key),
            Ok(Some(raw)) if raw != self.config.overflow_marker
        )
    }

    fn write_overflow(&self, key: &str, value: Value) -> bool {
        let envelope = AppStateEnvelope::new(key, OVERFLOW_SCHEMA_VERSION, value.clone());
        self.overflow.borrow_mut().insert(key.to_string(), value);

        if let Err(err) = self.fast.set_raw(key, &self.config.overflow_marker) {
            // A stale fast-store copy would shadow the overflowed value after reload.
            logging::warn!("overflow marker for `{key}` not written: {err}");
            let _ = self.fast.remove(key);
        }

        let large = self.large.clone();
        self.spawner.spawn(Box::pin(async move {
            if let Err(err) = large.save_app_state_envelope(&envelope).await {
                logging::warn!(
                    "large store write for `{}` failed: {err}",
                    envelope.namespace
                );
            }
        }));
        true
    }

    fn delete_overflow_envelope(&self, key: &str) {
        let large = self.large.clone();
        let key = key.to_string();
        self.spawner.spawn(Box::pin(async move {
            if let Err(err) = large.delete_app_state(&key).await {
                logging::warn!("large store delete for `{key}` failed: {err}");
            }
        }));
    }
}

fn decode<T: DeserializeOwned>(key: &str, value: Value) -> Option<T> {
    match serde_json::from_value(value) {
        Ok(decoded) => Some(decoded),
        Err(err) => {
            logging::warn!("stored value for `{key}` has an unexpected shape: {err}");
            None
        }
    }
}
