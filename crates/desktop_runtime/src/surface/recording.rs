//! In-memory surfaces and listener binder that record what the window manager asked for.

use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use super::{
    ListenerGuard, PointerHandlers, PointerListenerBinder, SurfaceEvent, SurfaceEventSink,
    SurfaceFactory, SurfaceSpec, SurfaceState, WindowSurface,
};
use crate::model::{PointerPosition, WindowId, WindowRect};

#[derive(Debug)]
/// Surface that keeps its geometry and state in cells.
pub struct RecordingSurface {
    spec: SurfaceSpec,
    rect: Cell<WindowRect>,
    z_index: Cell<u32>,
    state: Cell<SurfaceState>,
    removed: Cell<bool>,
    geometry_writes: Cell<usize>,
}

impl RecordingSurface {
    pub fn new(spec: SurfaceSpec) -> Self {
        Self {
            rect: Cell::new(spec.rect),
            z_index: Cell::new(spec.z_index),
            state: Cell::new(SurfaceState::default()),
            removed: Cell::new(false),
            geometry_writes: Cell::new(0),
            spec,
        }
    }

    pub fn spec(&self) -> &SurfaceSpec {
        &self.spec
    }

    pub fn z_index(&self) -> u32 {
        self.z_index.get()
    }

    pub fn state(&self) -> SurfaceState {
        self.state.get()
    }

    pub fn is_removed(&self) -> bool {
        self.removed.get()
    }

    /// Number of `set_geometry` calls since creation.
    pub fn geometry_writes(&self) -> usize {
        self.geometry_writes.get()
    }
}

impl WindowSurface for RecordingSurface {
    fn geometry(&self) -> WindowRect {
        self.rect.get()
    }

    fn set_geometry(&self, rect: WindowRect) {
        self.rect.set(rect);
        self.geometry_writes.set(self.geometry_writes.get() + 1);
    }

    fn set_z_index(&self, z_index: u32) {
        self.z_index.set(z_index);
    }

    fn set_state(&self, state: SurfaceState) {
        self.state.set(state);
    }

    fn content_root(&self) -> Option<web_sys::Element> {
        None
    }

    fn remove(&self) {
        self.removed.set(true);
    }
}

#[derive(Clone, Default)]
/// Factory producing [`RecordingSurface`]s and keeping their event sinks so input can be replayed.
pub struct RecordingSurfaceFactory {
    created: Rc<RefCell<Vec<(Rc<RecordingSurface>, SurfaceEventSink)>>>,
}

impl RecordingSurfaceFactory {
    /// Total surfaces created so far, including removed ones.
    pub fn created_count(&self) -> usize {
        self.created.borrow().len()
    }

    /// Latest live surface for `id`.
    pub fn surface(&self, id: &str) -> Option<Rc<RecordingSurface>> {
        self.created
            .borrow()
            .iter()
            .rev()
            .find(|(surface, _)| surface.spec.id.as_str() == id && !surface.is_removed())
            .map(|(surface, _)| surface.clone())
    }

    /// Raises `event` from the live surface for `id`. Returns `false` when there is none.
    pub fn emit(&self, id: &str, event: SurfaceEvent) -> bool {
        let sink = self
            .created
            .borrow()
            .iter()
            .rev()
            .find(|(surface, _)| surface.spec.id.as_str() == id && !surface.is_removed())
            .map(|(_, sink)| sink.clone());
        match sink {
            Some(sink) => {
                sink(event);
                true
            }
            None => false,
        }
    }

    /// Ids of live surfaces in creation order.
    pub fn live_ids(&self) -> Vec<WindowId> {
        self.created
            .borrow()
            .iter()
            .filter(|(surface, _)| !surface.is_removed())
            .map(|(surface, _)| surface.spec.id.clone())
            .collect()
    }
}

impl SurfaceFactory for RecordingSurfaceFactory {
    fn create(&self, spec: &SurfaceSpec, events: SurfaceEventSink) -> Rc<dyn WindowSurface> {
        let surface = Rc::new(RecordingSurface::new(spec.clone()));
        self.created.borrow_mut().push((surface.clone(), events));
        surface
    }
}

#[derive(Clone, Default)]
/// Binder that stores handlers so tests can fire document pointer events by hand.
pub struct RecordingBinder {
    bindings: Rc<RefCell<Vec<(u64, PointerHandlers)>>>,
    next_id: Rc<Cell<u64>>,
}

impl RecordingBinder {
    /// Number of gestures currently holding listeners.
    pub fn active(&self) -> usize {
        self.bindings.borrow().len()
    }

    pub fn pointer_move(&self, x: i32, y: i32) {
        for handlers in self.snapshot() {
            (handlers.on_move)(PointerPosition { x, y });
        }
    }

    pub fn pointer_up(&self, x: i32, y: i32) {
        for handlers in self.snapshot() {
            (handlers.on_up)(PointerPosition { x, y });
        }
    }

    pub fn pointer_cancel(&self) {
        for handlers in self.snapshot() {
            (handlers.on_cancel)();
        }
    }

    fn snapshot(&self) -> Vec<PointerHandlers> {
        self.bindings
            .borrow()
            .iter()
            .map(|(_, handlers)| handlers.clone())
            .collect()
    }
}

impl PointerListenerBinder for RecordingBinder {
    fn bind(&self, handlers: PointerHandlers) -> ListenerGuard {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.bindings.borrow_mut().push((id, handlers));

        let bindings = Rc::downgrade(&self.bindings);
        ListenerGuard::new(move || {
            if let Some(bindings) = bindings.upgrade() {
                bindings.borrow_mut().retain(|(bound, _)| *bound != id);
            }
        })
    }
}
