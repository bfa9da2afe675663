//! Typed host-domain contracts shared by the desktop runtime and browser adapters.
//!
//! This crate is the API-first boundary for platform services: the synchronous key-value store,
//! the large asynchronous envelope store, animation-frame scheduling, and background task
//! spawning. Concrete browser adapters live in `platform_host_web`; in-memory and no-op
//! implementations here keep the runtime testable on host targets.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod frame;
pub mod spawn;
pub mod storage;
pub mod time;

pub use frame::{FrameCallback, FrameScheduler, ManualFrameScheduler};
pub use spawn::{InlineSpawner, TaskSpawner};
pub use storage::app_state::{
    build_app_state_envelope, decode_envelope_payload, AppStateEnvelope, AppStateStore,
    AppStateStoreFuture, MemoryAppStateStore, APP_STATE_ENVELOPE_VERSION,
    DESKTOP_STATE_NAMESPACE,
};
pub use storage::error::StorageError;
pub use storage::key_value::{KeyValueStore, MemoryKeyValueStore};
pub use time::{next_monotonic_timestamp_ms, unix_time_ms_now};
