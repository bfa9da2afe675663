//! Window surfaces and document pointer listeners.
//!
//! The window manager never touches the DOM directly. It asks a [`SurfaceFactory`] for a
//! [`WindowSurface`] per window and a [`PointerListenerBinder`] for gesture-scoped document
//! listeners. The browser implementations live in [`dom`]; [`recording`] provides in-memory
//! doubles used by tests and non-browser hosts.

use std::rc::Rc;

use crate::{
    geometry::ResizeEdges,
    model::{PointerPosition, WindowContent, WindowFlags, WindowId, WindowRect},
};

pub mod dom;
pub mod recording;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// Visual state flags mirrored onto a surface.
pub struct SurfaceState {
    pub active: bool,
    pub minimized: bool,
    pub maximized: bool,
}

#[derive(Debug, Clone, PartialEq)]
/// User input raised by a surface's chrome.
pub enum SurfaceEvent {
    /// Pointer pressed anywhere in the window.
    Focus,
    /// Primary pointer pressed on the title bar.
    TitlebarPointerDown(PointerPosition),
    /// Primary pointer pressed on a resize handle.
    ResizePointerDown {
        edges: ResizeEdges,
        pointer: PointerPosition,
    },
    Minimize,
    ToggleMaximize,
    Close,
}

/// Callback a surface uses to report [`SurfaceEvent`]s back to its manager.
pub type SurfaceEventSink = Rc<dyn Fn(SurfaceEvent)>;

#[derive(Debug, Clone, PartialEq)]
/// Everything a factory needs to build a surface.
pub struct SurfaceSpec {
    pub id: WindowId,
    pub title: String,
    pub icon: Option<String>,
    pub class: Option<String>,
    pub content: WindowContent,
    pub rect: WindowRect,
    pub z_index: u32,
    pub flags: WindowFlags,
}

/// One rendered window.
pub trait WindowSurface {
    /// Geometry as currently rendered.
    fn geometry(&self) -> WindowRect;

    fn set_geometry(&self, rect: WindowRect);

    fn set_z_index(&self, z_index: u32);

    fn set_state(&self, state: SurfaceState);

    /// Element apps mount their content into, when rendered in a document.
    fn content_root(&self) -> Option<web_sys::Element>;

    /// Detaches the surface and releases its listeners.
    fn remove(&self);
}

/// Builds surfaces for new windows.
pub trait SurfaceFactory {
    fn create(&self, spec: &SurfaceSpec, events: SurfaceEventSink) -> Rc<dyn WindowSurface>;
}

/// Handlers attached for the duration of one gesture.
#[derive(Clone)]
pub struct PointerHandlers {
    pub on_move: Rc<dyn Fn(PointerPosition)>,
    pub on_up: Rc<dyn Fn(PointerPosition)>,
    pub on_cancel: Rc<dyn Fn()>,
}

/// Attaches document-level pointer listeners for one gesture.
pub trait PointerListenerBinder {
    /// Attaches `handlers`; they stay attached until the returned guard is dropped.
    fn bind(&self, handlers: PointerHandlers) -> ListenerGuard;
}

#[must_use = "listeners detach as soon as the guard is dropped"]
/// Detaches gesture listeners when dropped.
pub struct ListenerGuard {
    detach: Option<Box<dyn FnOnce()>>,
}

impl ListenerGuard {
    pub fn new(detach: impl FnOnce() + 'static) -> Self {
        Self {
            detach: Some(Box::new(detach)),
        }
    }

    /// Guard with nothing to detach.
    pub fn inert() -> Self {
        Self { detach: None }
    }
}

impl std::fmt::Debug for ListenerGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerGuard")
            .field("attached", &self.detach.is_some())
            .finish()
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn guard_detaches_exactly_once_on_drop() {
        let detached = Rc::new(Cell::new(0));
        let counter = detached.clone();
        let guard = ListenerGuard::new(move || counter.set(counter.get() + 1));
        assert_eq!(detached.get(), 0);
        drop(guard);
        assert_eq!(detached.get(), 1);

        drop(ListenerGuard::inert());
        assert_eq!(detached.get(), 1);
    }
}
