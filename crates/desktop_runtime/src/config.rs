//! Runtime configuration shared by the state store, window manager, and shell.

use platform_storage::StorageConfig;

use crate::geometry::{Viewport, MIN_WINDOW_HEIGHT, MIN_WINDOW_WIDTH};

/// Height reserved for the taskbar at the bottom of the viewport.
pub const TASKBAR_HEIGHT_PX: i32 = 38;
/// Offset applied when a new window would open exactly on top of another.
pub const CASCADE_STEP: i32 = 30;
/// Storage key holding the unified state snapshot.
pub const SNAPSHOT_KEY: &str = "webtop.state.snapshot";

#[derive(Debug, Clone, PartialEq, Eq)]
/// Tunables for one desktop instance. [`Default`] matches the browser shell.
pub struct DesktopConfig {
    /// Viewport assumed when the host cannot report one.
    pub viewport_fallback: (i32, i32),
    pub taskbar_height: i32,
    pub cascade_step: i32,
    /// Minimum window size as `(width, height)`.
    pub min_window_size: (i32, i32),
    pub snapshot_key: String,
    pub storage: StorageConfig,
}

impl DesktopConfig {
    /// Builds a [`Viewport`] of the given size using this config's taskbar reservation.
    pub fn viewport(&self, width: i32, height: i32) -> Viewport {
        Viewport {
            width,
            height,
            taskbar_height: self.taskbar_height,
        }
    }

    pub fn fallback_viewport(&self) -> Viewport {
        self.viewport(self.viewport_fallback.0, self.viewport_fallback.1)
    }
}

impl Default for DesktopConfig {
    fn default() -> Self {
        Self {
            viewport_fallback: platform_host_web::FALLBACK_VIEWPORT,
            taskbar_height: TASKBAR_HEIGHT_PX,
            cascade_step: CASCADE_STEP,
            min_window_size: (MIN_WINDOW_WIDTH, MIN_WINDOW_HEIGHT),
            snapshot_key: SNAPSHOT_KEY.to_string(),
            storage: StorageConfig::default(),
        }
    }
}
