//! Browser desktop core: a persisted shared state store and a window manager with pointer-driven
//! drag and resize, plus the Leptos shell that renders the taskbar.
//!
//! ```
//! use desktop_runtime::{AppState, StateStore, Tasks};
//! use serde_json::json;
//!
//! let store = StateStore::in_memory(AppState::default());
//! let added = store.dispatch_json(&json!({
//!     "type": "TASKS_ADD",
//!     "payload": { "id": "t1", "text": "water plants" }
//! }));
//! assert!(added);
//! assert_eq!(store.slice::<Tasks>()[0].text, "water plants");
//! assert!(!store.dispatch_json(&json!({ "type": "BOGUS" })));
//! ```

pub mod components;
pub mod config;
pub mod geometry;
pub mod interaction;
pub mod launchers;
pub mod model;
pub mod persistence;
mod runtime_context;
pub mod slices;
pub mod store;
pub mod surface;
pub mod window_manager;

pub use components::{use_desktop_runtime, DesktopProvider, DesktopRuntimeContext, DesktopShell};
pub use config::{DesktopConfig, CASCADE_STEP, SNAPSHOT_KEY, TASKBAR_HEIGHT_PX};
pub use geometry::{ResizeEdges, Viewport, MIN_WINDOW_HEIGHT, MIN_WINDOW_WIDTH};
pub use model::*;
pub use slices::{Ai, Notes, Settings, Slice, SliceKey, Tasks, Weather, Windows};
pub use store::{
    reduce_store, ListenerResult, StatePatch, StateStore, StoreAction, StoreError, Subscription,
};
pub use window_manager::{WindowError, WindowHandle, WindowHost, WindowManager};
