//! Pointer gesture state machine for window drag and resize.
//!
//! A gesture owns the [`ListenerGuard`] for its document listeners, so leaving a gesture state
//! detaches them. Pointer moves only record the latest geometry; the window manager applies it to
//! the surface at most once per animation frame and persists it when the gesture ends.

use crate::{
    geometry::{drag_rect, resize_rect, ResizeEdges},
    model::{PointerPosition, WindowId, WindowRect},
    surface::ListenerGuard,
};

#[derive(Debug)]
pub struct DragSession {
    pub window_id: WindowId,
    pub pointer_start: PointerPosition,
    pub rect_start: WindowRect,
    latest: WindowRect,
    frame_pending: bool,
    listeners: ListenerGuard,
}

#[derive(Debug)]
pub struct ResizeSession {
    pub window_id: WindowId,
    pub edges: ResizeEdges,
    pub pointer_start: PointerPosition,
    pub rect_start: WindowRect,
    latest: WindowRect,
    frame_pending: bool,
    listeners: ListenerGuard,
}

#[derive(Debug, Default)]
pub enum GestureState {
    #[default]
    Idle,
    Dragging(DragSession),
    Resizing(ResizeSession),
}

#[derive(Debug)]
/// What is left of a gesture once it ends.
pub struct GestureEnd {
    pub window_id: WindowId,
    /// Latest geometry computed during the gesture, applied or not.
    pub rect: WindowRect,
    /// Drop after releasing any borrow of the gesture state.
    pub listeners: ListenerGuard,
}

impl GestureState {
    pub fn begin_drag(
        window_id: WindowId,
        pointer: PointerPosition,
        rect: WindowRect,
        listeners: ListenerGuard,
    ) -> Self {
        Self::Dragging(DragSession {
            window_id,
            pointer_start: pointer,
            rect_start: rect,
            latest: rect,
            frame_pending: false,
            listeners,
        })
    }

    pub fn begin_resize(
        window_id: WindowId,
        edges: ResizeEdges,
        pointer: PointerPosition,
        rect: WindowRect,
        listeners: ListenerGuard,
    ) -> Self {
        Self::Resizing(ResizeSession {
            window_id,
            edges,
            pointer_start: pointer,
            rect_start: rect,
            latest: rect,
            frame_pending: false,
            listeners,
        })
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn window_id(&self) -> Option<&WindowId> {
        match self {
            Self::Idle => None,
            Self::Dragging(session) => Some(&session.window_id),
            Self::Resizing(session) => Some(&session.window_id),
        }
    }

    /// Latest geometry of the active gesture.
    pub fn latest(&self) -> Option<WindowRect> {
        match self {
            Self::Idle => None,
            Self::Dragging(session) => Some(session.latest),
            Self::Resizing(session) => Some(session.latest),
        }
    }

    /// Records the geometry for `pointer` within `area`.
    ///
    /// Returns `None` when idle, `Some(true)` when the caller must request a frame, and
    /// `Some(false)` when a frame is already pending.
    pub fn track(
        &mut self,
        pointer: PointerPosition,
        area: WindowRect,
        min: (i32, i32),
    ) -> Option<bool> {
        let frame_pending = match self {
            Self::Idle => return None,
            Self::Dragging(session) => {
                session.latest = drag_rect(session.rect_start, session.pointer_start, pointer, area);
                &mut session.frame_pending
            }
            Self::Resizing(session) => {
                session.latest = resize_rect(
                    session.rect_start,
                    session.edges,
                    pointer.x - session.pointer_start.x,
                    pointer.y - session.pointer_start.y,
                    area,
                    min,
                );
                &mut session.frame_pending
            }
        };
        let request = !*frame_pending;
        *frame_pending = true;
        Some(request)
    }

    /// Consumes the pending frame, returning the geometry to apply.
    pub fn take_frame(&mut self) -> Option<(WindowId, WindowRect)> {
        let (window_id, latest, frame_pending) = match self {
            Self::Idle => return None,
            Self::Dragging(session) => (
                &session.window_id,
                session.latest,
                &mut session.frame_pending,
            ),
            Self::Resizing(session) => (
                &session.window_id,
                session.latest,
                &mut session.frame_pending,
            ),
        };
        if !std::mem::take(frame_pending) {
            return None;
        }
        Some((window_id.clone(), latest))
    }

    /// Leaves the gesture, returning to [`GestureState::Idle`].
    pub fn finish(&mut self) -> Option<GestureEnd> {
        match std::mem::take(self) {
            Self::Idle => None,
            Self::Dragging(session) => Some(GestureEnd {
                window_id: session.window_id,
                rect: session.latest,
                listeners: session.listeners,
            }),
            Self::Resizing(session) => Some(GestureEnd {
                window_id: session.window_id,
                rect: session.latest,
                listeners: session.listeners,
            }),
        }
    }
}
