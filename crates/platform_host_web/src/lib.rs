//! Browser (`wasm32`) implementations of [`platform_host`] service contracts.
//!
//! This crate is the concrete browser-side host wiring layer: `localStorage` for the fast
//! key-value store, IndexedDB for large envelopes, `requestAnimationFrame` for frame scheduling,
//! and `spawn_local` for background persistence. Non-wasm builds compile to inert fallbacks so
//! downstream crates stay testable on the host.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

/// Compile-time host-strategy selection and concrete adapter factories for runtime wiring.
pub mod adapters;
mod bridge;
pub mod event_loop;
pub mod storage;

pub use adapters::{
    app_state_store, frame_scheduler, host_strategy_name, key_value_store,
    selected_host_strategy, task_spawner, AppStateStoreAdapter, HostStrategy,
    KeyValueStoreAdapter,
};
pub use event_loop::{viewport_size, WebFrameScheduler, WebTaskSpawner, FALLBACK_VIEWPORT};
pub use storage::indexed_db::WebAppStateStore;
pub use storage::local_storage::WebKeyValueStore;
