//! Browser event-loop services: background task spawning, animation frames, viewport queries.

use futures::future::LocalBoxFuture;
use platform_host::{FrameCallback, FrameScheduler, TaskSpawner};
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::{closure::Closure, JsCast};

/// Viewport size used when no browser window is available.
pub const FALLBACK_VIEWPORT: (i32, i32) = (1024, 768);

#[derive(Debug, Clone, Copy, Default)]
/// Spawns futures onto the browser microtask queue.
pub struct WebTaskSpawner;

impl TaskSpawner for WebTaskSpawner {
    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        #[cfg(target_arch = "wasm32")]
        {
            wasm_bindgen_futures::spawn_local(task);
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            futures::executor::block_on(task);
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
/// Schedules callbacks through `window.requestAnimationFrame`.
pub struct WebFrameScheduler;

impl FrameScheduler for WebFrameScheduler {
    fn request_frame(&self, callback: FrameCallback) {
        #[cfg(target_arch = "wasm32")]
        {
            let Some(window) = web_sys::window() else {
                callback();
                return;
            };
            let closure = Closure::once_into_js(move || callback());
            let _ = window.request_animation_frame(closure.unchecked_ref());
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            callback();
        }
    }
}

/// Returns the current browser viewport size in CSS pixels.
pub fn viewport_size() -> (i32, i32) {
    #[cfg(target_arch = "wasm32")]
    {
        if let Some(window) = web_sys::window() {
            let width = window
                .inner_width()
                .ok()
                .and_then(|value| value.as_f64())
                .map(|value| value as i32)
                .unwrap_or(FALLBACK_VIEWPORT.0);
            let height = window
                .inner_height()
                .ok()
                .and_then(|value| value.as_f64())
                .map(|value| value as i32)
                .unwrap_or(FALLBACK_VIEWPORT.1);
            return (width, height);
        }
    }

    FALLBACK_VIEWPORT
}
