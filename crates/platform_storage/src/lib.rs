//! Tiered persistence for the webtop desktop.
//!
//! Small values live in the host's synchronous key-value store (`localStorage` in the browser).
//! Values that are too large, or that hit the host quota, spill into the asynchronous envelope
//! store (IndexedDB) while a marker stays behind in the fast store.
//!
//! # Example
//!
//! ```rust
//! use std::rc::Rc;
//!
//! use platform_storage::{
//!     InlineSpawner, MemoryAppStateStore, MemoryKeyValueStore, StorageConfig, TieredStorage,
//! };
//!
//! let storage = TieredStorage::new(
//!     Rc::new(MemoryKeyValueStore::default()),
//!     Rc::new(MemoryAppStateStore::default()),
//!     Rc::new(InlineSpawner),
//!     StorageConfig::default(),
//! );
//! assert!(storage.set("counter", &3_u32));
//! assert_eq!(storage.get("counter", 0_u32), 3);
//! ```

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

mod host_adapters;
mod tiered;

pub use platform_host::{
    next_monotonic_timestamp_ms, unix_time_ms_now, AppStateEnvelope, AppStateStore,
    InlineSpawner, KeyValueStore, MemoryAppStateStore, MemoryKeyValueStore, StorageError,
    TaskSpawner,
};
pub use tiered::{
    StorageConfig, TieredStorage, DEFAULT_OVERFLOW_MARKER, DEFAULT_OVERFLOW_THRESHOLD_BYTES,
    OVERFLOW_SCHEMA_VERSION,
};

/// Builds tiered storage over the browser backends (or in-memory ones under
/// `desktop-host-stub`).
pub fn host_storage(config: StorageConfig) -> TieredStorage {
    host_adapters::host_tiered_storage(config)
}
