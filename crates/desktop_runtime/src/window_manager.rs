//! Window lifecycle, stacking, and pointer-driven drag/resize.
//!
//! The manager owns one [`WindowSurface`] per open window and keeps the authoritative stacking and
//! focus state in memory. Geometry is written through the [`StateStore`] `windows` slice only when
//! a gesture ends (or a window is maximized/restored), so reopening a window restores its last
//! committed position.

use std::{
    cell::{Cell, RefCell},
    rc::{Rc, Weak},
};

use leptos::logging;
use platform_host::FrameScheduler;
use thiserror::Error;

use crate::{
    config::DesktopConfig,
    geometry::{cascade_origin, centered_rect, clamp_to_area, ResizeEdges, Viewport},
    interaction::GestureState,
    model::{PointerPosition, WindowConfig, WindowGeometry, WindowId, WindowRecord, WindowRect},
    slices::Windows,
    store::StateStore,
    surface::{
        dom::{DocumentPointerBinder, DomSurfaceFactory},
        PointerHandlers, PointerListenerBinder, SurfaceEvent, SurfaceFactory, SurfaceSpec,
        SurfaceState, WindowSurface,
    },
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Window operations that could not be applied.
pub enum WindowError {
    #[error("no open window `{0}`")]
    UnknownWindow(WindowId),
    #[error("window `{0}` cannot be maximized")]
    NotMaximizable(WindowId),
    #[error("window `{0}` cannot be resized")]
    NotResizable(WindowId),
}

#[derive(Clone)]
/// Host services the window manager renders through.
pub struct WindowHost {
    pub surfaces: Rc<dyn SurfaceFactory>,
    pub pointers: Rc<dyn PointerListenerBinder>,
    pub frames: Rc<dyn FrameScheduler>,
}

impl WindowHost {
    /// DOM surfaces in the default window layer, document pointer listeners, and
    /// `requestAnimationFrame` scheduling.
    pub fn browser() -> Self {
        Self {
            surfaces: Rc::new(DomSurfaceFactory::default()),
            pointers: Rc::new(DocumentPointerBinder),
            frames: Rc::new(platform_host_web::frame_scheduler()),
        }
    }
}

#[derive(Clone)]
/// Handle returned to the code that opened a window.
pub struct WindowHandle {
    id: WindowId,
    surface: Rc<dyn WindowSurface>,
}

impl WindowHandle {
    pub fn id(&self) -> &WindowId {
        &self.id
    }

    /// Element app content mounts into. `None` when the surface is not rendered in a document.
    pub fn content_root(&self) -> Option<web_sys::Element> {
        self.surface.content_root()
    }

    /// First element under the content root matching `selector`.
    pub fn query_selector(&self, selector: &str) -> Option<web_sys::Element> {
        self.content_root()?.query_selector(selector).ok().flatten()
    }

    /// Whether both handles refer to the same rendered surface.
    pub fn same_surface(&self, other: &WindowHandle) -> bool {
        Rc::ptr_eq(&self.surface, &other.surface)
    }
}

impl std::fmt::Debug for WindowHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowHandle").field("id", &self.id).finish()
    }
}

type WindowListener = Rc<dyn Fn(&[WindowRecord])>;

struct OpenWindow {
    record: WindowRecord,
    surface: Rc<dyn WindowSurface>,
    opened: u64,
}

struct Inner {
    store: StateStore,
    host: WindowHost,
    config: DesktopConfig,
    viewport: Cell<Viewport>,
    /// Stacking order, bottom first.
    stack: RefCell<Vec<OpenWindow>>,
    next_opened: Cell<u64>,
    gesture: RefCell<GestureState>,
    listeners: RefCell<Vec<(u64, WindowListener)>>,
    next_listener_id: Cell<u64>,
}

#[derive(Clone)]
/// Creates, stacks, moves, and destroys desktop windows. Clones share the same windows.
pub struct WindowManager {
    inner: Rc<Inner>,
}

impl WindowManager {
    /// Creates a manager rendering through `host`, sized to the config's fallback viewport until
    /// [`WindowManager::set_viewport`] is called.
    pub fn new(store: StateStore, host: WindowHost, config: DesktopConfig) -> Self {
        let viewport = config.fallback_viewport();
        Self {
            inner: Rc::new(Inner {
                store,
                host,
                config,
                viewport: Cell::new(viewport),
                stack: RefCell::new(Vec::new()),
                next_opened: Cell::new(1),
                gesture: RefCell::new(GestureState::Idle),
                listeners: RefCell::new(Vec::new()),
                next_listener_id: Cell::new(1),
            }),
        }
    }

    /// Creates a browser-backed manager sized to the current window.
    pub fn browser(store: StateStore, config: DesktopConfig) -> Self {
        let manager = Self::new(store, WindowHost::browser(), config);
        let (width, height) = platform_host_web::viewport_size();
        manager.set_viewport(manager.inner.config.viewport(width, height));
        manager
    }

    fn from_inner(inner: Rc<Inner>) -> Self {
        Self { inner }
    }

    pub fn store(&self) -> &StateStore {
        &self.inner.store
    }

    pub fn config(&self) -> &DesktopConfig {
        &self.inner.config
    }

    pub fn viewport(&self) -> Viewport {
        self.inner.viewport.get()
    }

    fn work_area(&self) -> WindowRect {
        self.inner.viewport.get().work_area()
    }

    /// Opens window `id`, or focuses it when it is already open.
    ///
    /// A new window takes its persisted geometry when one exists, otherwise the configured size
    /// centered in the work area and cascaded off any window at the same origin. The result is
    /// always clamped into the work area.
    pub fn create_window(&self, id: impl Into<WindowId>, config: WindowConfig) -> WindowHandle {
        let id = id.into();
        if let Some(handle) = self.handle(id.as_str()) {
            self.focus(id.as_str());
            return handle;
        }

        let area = self.work_area();
        let min = self.inner.config.min_window_size;
        let persisted = self.inner.store.get_state().windows.get(id.as_str()).copied();
        let flags = config.flags();

        let (geometry, restore_rect, maximized) = match persisted {
            Some(saved) => {
                let rect = clamp_to_area(saved.rect(), area, min);
                if saved.maximized && flags.maximizable {
                    (clamp_to_area(area, area, min), Some(rect), true)
                } else {
                    (rect, None, false)
                }
            }
            None => {
                let occupied: Vec<WindowRect> = self
                    .inner
                    .stack
                    .borrow()
                    .iter()
                    .map(|open| open.surface.geometry())
                    .collect();
                let centered = centered_rect(config.width, config.height, area);
                let cascaded =
                    cascade_origin(centered, &occupied, self.inner.config.cascade_step, area);
                (clamp_to_area(cascaded, area, min), None, false)
            }
        };

        let z_index = self.inner.stack.borrow().len() as u32 + 1;
        let spec = SurfaceSpec {
            id: id.clone(),
            title: config.title.clone(),
            icon: config.icon.clone(),
            class: config.class.clone(),
            content: config.content,
            rect: geometry,
            z_index,
            flags,
        };
        let surface = self.inner.host.surfaces.create(&spec, self.event_sink(&id));

        let opened = self.inner.next_opened.get();
        self.inner.next_opened.set(opened + 1);
        self.inner.stack.borrow_mut().push(OpenWindow {
            record: WindowRecord {
                id: id.clone(),
                title: config.title,
                icon: config.icon,
                class: config.class,
                geometry,
                restore_rect,
                z_index,
                is_focused: false,
                minimized: false,
                maximized,
                flags,
            },
            surface: surface.clone(),
            opened,
        });

        if let Err(err) = focus_window_internal(&mut self.inner.stack.borrow_mut(), &id) {
            logging::warn!("new window not focused: {err}");
        }
        self.sync_surfaces();
        self.notify();
        WindowHandle { id, surface }
    }

    /// Removes window `id` and its surface. Persisted geometry is kept. Closing an unknown id is a
    /// no-op.
    pub fn close_window(&self, id: &str) -> bool {
        if self.inner.gesture.borrow().window_id().map(WindowId::as_str) == Some(id) {
            let ended = self.inner.gesture.borrow_mut().finish();
            drop(ended);
        }

        let removed = {
            let mut stack = self.inner.stack.borrow_mut();
            let Some(index) = stack.iter().position(|open| open.record.id.as_str() == id) else {
                return false;
            };
            let removed = stack.remove(index);
            normalize_window_stack(&mut stack);
            removed
        };

        removed.surface.remove();
        self.sync_surfaces();
        self.notify();
        true
    }

    /// Raises window `id` above every other window and makes it the active one.
    pub fn focus(&self, id: &str) -> bool {
        let result = focus_window_internal(&mut self.inner.stack.borrow_mut(), &WindowId::new(id));
        match result {
            Ok(changed) => {
                if changed {
                    self.sync_surfaces();
                    self.notify();
                }
                true
            }
            Err(err) => {
                logging::warn!("focus ignored: {err}");
                false
            }
        }
    }

    /// Writes the live geometry of window `id` into the `windows` slice.
    ///
    /// A maximized window is stored with its restore geometry and `maximized: true`.
    pub fn save_window_position(&self, id: &str) -> bool {
        let geometry = {
            let mut stack = self.inner.stack.borrow_mut();
            let Some(open) = stack.iter_mut().find(|open| open.record.id.as_str() == id) else {
                logging::warn!("save_window_position ignored: no open window `{id}`");
                return false;
            };
            open.record.geometry = open.surface.geometry();
            match (open.record.maximized, open.record.restore_rect) {
                (true, Some(restore)) => WindowGeometry {
                    maximized: true,
                    ..WindowGeometry::from(restore)
                },
                _ => WindowGeometry::from(open.record.geometry),
            }
        };

        let mut windows = self.inner.store.slice::<Windows>();
        if windows.get(id) == Some(&geometry) {
            return true;
        }
        windows.insert(id.to_string(), geometry);
        self.inner.store.update_slice::<Windows>(windows);
        true
    }

    /// Hides window `id`; the next window down becomes active.
    pub fn minimize(&self, id: &str) -> bool {
        let changed = self.update_window(id, |open| {
            if open.record.minimized {
                return Ok(false);
            }
            open.record.minimized = true;
            open.record.is_focused = false;
            Ok(true)
        });
        if changed {
            self.end_gesture_for(id);
        }
        changed
    }

    /// Fills the work area with window `id`, remembering its geometry for [`Self::restore`].
    pub fn maximize(&self, id: &str) -> bool {
        let work_area = self.work_area();
        let area = clamp_to_area(work_area, work_area, self.inner.config.min_window_size);
        self.end_gesture_for(id);
        let changed = self.update_window(id, |open| {
            if !open.record.flags.maximizable {
                return Err(WindowError::NotMaximizable(open.record.id.clone()));
            }
            if open.record.maximized {
                return Ok(false);
            }
            open.record.restore_rect = Some(open.surface.geometry());
            open.record.maximized = true;
            open.surface.set_geometry(area);
            Ok(true)
        });
        if changed {
            self.focus(id);
            self.save_window_position(id);
        }
        changed
    }

    /// Brings a minimized window back, or returns a maximized one to its previous geometry.
    pub fn restore(&self, id: &str) -> bool {
        let area = self.work_area();
        let min = self.inner.config.min_window_size;
        let mut unmaximized = false;
        let changed = self.update_window(id, |open| {
            if open.record.minimized {
                open.record.minimized = false;
                return Ok(true);
            }
            if !open.record.maximized {
                return Ok(false);
            }
            let previous = open.record.restore_rect.take().unwrap_or(open.record.geometry);
            open.record.maximized = false;
            open.surface.set_geometry(clamp_to_area(previous, area, min));
            unmaximized = true;
            Ok(true)
        });
        if changed {
            self.focus(id);
        }
        if unmaximized {
            self.save_window_position(id);
        }
        changed
    }

    pub fn toggle_maximize(&self, id: &str) -> bool {
        let maximized = self
            .inner
            .stack
            .borrow()
            .iter()
            .find(|open| open.record.id.as_str() == id)
            .map(|open| open.record.maximized);
        match maximized {
            Some(true) => self.restore(id),
            Some(false) => self.maximize(id),
            None => false,
        }
    }

    /// Open windows in the order they were opened.
    pub fn windows(&self) -> Vec<WindowRecord> {
        let stack = self.inner.stack.borrow();
        let mut open: Vec<&OpenWindow> = stack.iter().collect();
        open.sort_by_key(|open| open.opened);
        open.into_iter().map(|open| open.record.clone()).collect()
    }

    pub fn active_window(&self) -> Option<WindowId> {
        self.inner
            .stack
            .borrow()
            .iter()
            .find(|open| open.record.is_focused)
            .map(|open| open.record.id.clone())
    }

    pub fn handle(&self, id: &str) -> Option<WindowHandle> {
        self.inner
            .stack
            .borrow()
            .iter()
            .find(|open| open.record.id.as_str() == id)
            .map(|open| WindowHandle {
                id: open.record.id.clone(),
                surface: open.surface.clone(),
            })
    }

    /// Applies a new viewport and pulls every open window back inside the work area.
    pub fn set_viewport(&self, viewport: Viewport) {
        if self.inner.viewport.get() == viewport {
            return;
        }
        self.inner.viewport.set(viewport);
        let area = viewport.work_area();
        let min = self.inner.config.min_window_size;

        let mut changed = false;
        for open in self.inner.stack.borrow_mut().iter_mut() {
            let current = open.surface.geometry();
            let next = if open.record.maximized {
                clamp_to_area(area, area, min)
            } else {
                clamp_to_area(current, area, min)
            };
            if let Some(restore) = open.record.restore_rect.as_mut() {
                *restore = clamp_to_area(*restore, area, min);
            }
            if next != current {
                open.surface.set_geometry(next);
                open.record.geometry = next;
                changed = true;
            }
        }
        if changed {
            self.notify();
        }
    }

    /// Registers `listener` for window-list changes. Returns an id for [`Self::unsubscribe`].
    pub fn subscribe(&self, listener: impl Fn(&[WindowRecord]) + 'static) -> u64 {
        let id = self.inner.next_listener_id.get();
        self.inner.next_listener_id.set(id + 1);
        self.inner.listeners.borrow_mut().push((id, Rc::new(listener)));
        id
    }

    pub fn unsubscribe(&self, id: u64) -> bool {
        let mut listeners = self.inner.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        listeners.len() != before
    }

    /// Starts dragging window `id` from `pointer`. Maximized and minimized windows only focus.
    pub fn begin_drag(&self, id: &str, pointer: PointerPosition) -> bool {
        self.end_gesture();
        let Some(rect) = self.gesture_start_rect(id, false) else {
            self.focus(id);
            return false;
        };
        self.focus(id);
        let listeners = self.inner.host.pointers.bind(self.pointer_handlers());
        *self.inner.gesture.borrow_mut() =
            GestureState::begin_drag(WindowId::new(id), pointer, rect, listeners);
        true
    }

    /// Starts resizing window `id` along `edges` from `pointer`.
    pub fn begin_resize(&self, id: &str, edges: ResizeEdges, pointer: PointerPosition) -> bool {
        self.end_gesture();
        if edges.is_empty() {
            return false;
        }
        let Some(rect) = self.gesture_start_rect(id, true) else {
            self.focus(id);
            return false;
        };
        self.focus(id);
        let listeners = self.inner.host.pointers.bind(self.pointer_handlers());
        *self.inner.gesture.borrow_mut() =
            GestureState::begin_resize(WindowId::new(id), edges, pointer, rect, listeners);
        true
    }

    /// Records a pointer move for the active gesture and schedules one surface update per frame.
    pub fn pointer_move(&self, pointer: PointerPosition) {
        let request = self.inner.gesture.borrow_mut().track(
            pointer,
            self.work_area(),
            self.inner.config.min_window_size,
        );
        if request != Some(true) {
            return;
        }
        let weak = Rc::downgrade(&self.inner);
        self.inner.host.frames.request_frame(Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                WindowManager::from_inner(inner).apply_frame();
            }
        }));
    }

    /// Applies the final pointer position, ends the gesture, and persists the geometry.
    pub fn pointer_up(&self, pointer: PointerPosition) {
        self.inner.gesture.borrow_mut().track(
            pointer,
            self.work_area(),
            self.inner.config.min_window_size,
        );
        self.end_gesture();
    }

    /// Ends the active gesture, flushing its latest geometry to the surface and the store.
    pub fn end_gesture(&self) {
        let ended = self.inner.gesture.borrow_mut().finish();
        let Some(ended) = ended else {
            return;
        };
        if let Some(handle) = self.handle(ended.window_id.as_str()) {
            handle.surface.set_geometry(ended.rect);
            self.save_window_position(ended.window_id.as_str());
        }
    }

    pub fn is_gesture_active(&self) -> bool {
        !self.inner.gesture.borrow().is_idle()
    }

    fn end_gesture_for(&self, id: &str) {
        if self.inner.gesture.borrow().window_id().map(WindowId::as_str) == Some(id) {
            self.end_gesture();
        }
    }

    fn gesture_start_rect(&self, id: &str, resizing: bool) -> Option<WindowRect> {
        let stack = self.inner.stack.borrow();
        let open = stack.iter().find(|open| open.record.id.as_str() == id)?;
        if open.record.maximized || open.record.minimized {
            return None;
        }
        if resizing && !open.record.flags.resizable {
            logging::warn!("{}", WindowError::NotResizable(open.record.id.clone()));
            return None;
        }
        Some(open.surface.geometry())
    }

    fn apply_frame(&self) {
        let frame = self.inner.gesture.borrow_mut().take_frame();
        if let Some((id, rect)) = frame {
            if let Some(handle) = self.handle(id.as_str()) {
                handle.surface.set_geometry(rect);
            }
        }
    }

    fn pointer_handlers(&self) -> PointerHandlers {
        let on_move = Rc::downgrade(&self.inner);
        let on_up = on_move.clone();
        let on_cancel = on_move.clone();
        PointerHandlers {
            on_move: Rc::new(move |pointer| {
                with_manager(&on_move, |manager| manager.pointer_move(pointer));
            }),
            on_up: Rc::new(move |pointer| {
                with_manager(&on_up, |manager| manager.pointer_up(pointer));
            }),
            on_cancel: Rc::new(move || {
                with_manager(&on_cancel, WindowManager::end_gesture);
            }),
        }
    }

    fn event_sink(&self, id: &WindowId) -> Rc<dyn Fn(SurfaceEvent)> {
        let weak = Rc::downgrade(&self.inner);
        let id = id.clone();
        Rc::new(move |event| {
            with_manager(&weak, |manager| manager.handle_surface_event(id.as_str(), event));
        })
    }

    fn handle_surface_event(&self, id: &str, event: SurfaceEvent) {
        match event {
            SurfaceEvent::Focus => {
                self.focus(id);
            }
            SurfaceEvent::TitlebarPointerDown(pointer) => {
                self.begin_drag(id, pointer);
            }
            SurfaceEvent::ResizePointerDown { edges, pointer } => {
                self.begin_resize(id, edges, pointer);
            }
            SurfaceEvent::Minimize => {
                self.minimize(id);
            }
            SurfaceEvent::ToggleMaximize => {
                self.toggle_maximize(id);
            }
            SurfaceEvent::Close => {
                self.close_window(id);
            }
        }
    }

    /// Runs `apply` on window `id`, then renormalizes the stack and notifies when it reports a
    /// change.
    fn update_window(
        &self,
        id: &str,
        apply: impl FnOnce(&mut OpenWindow) -> Result<bool, WindowError>,
    ) -> bool {
        let result = {
            let mut stack = self.inner.stack.borrow_mut();
            let result = match stack.iter_mut().find(|open| open.record.id.as_str() == id) {
                Some(open) => apply(open),
                None => Err(WindowError::UnknownWindow(WindowId::new(id))),
            };
            if matches!(result, Ok(true)) {
                normalize_window_stack(&mut stack);
            }
            result
        };
        match result {
            Ok(true) => {
                self.sync_surfaces();
                self.notify();
                true
            }
            Ok(false) => false,
            Err(err) => {
                logging::warn!("window operation ignored: {err}");
                false
            }
        }
    }

    fn sync_surfaces(&self) {
        let updates: Vec<(Rc<dyn WindowSurface>, u32, SurfaceState)> = self
            .inner
            .stack
            .borrow()
            .iter()
            .map(|open| {
                (
                    open.surface.clone(),
                    open.record.z_index,
                    SurfaceState {
                        active: open.record.is_focused,
                        minimized: open.record.minimized,
                        maximized: open.record.maximized,
                    },
                )
            })
            .collect();
        for (surface, z_index, state) in updates {
            surface.set_z_index(z_index);
            surface.set_state(state);
        }
    }

    fn notify(&self) {
        let listeners: Vec<WindowListener> = self
            .inner
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        if listeners.is_empty() {
            return;
        }
        let records = self.windows();
        for listener in listeners {
            listener(&records);
        }
    }
}

fn with_manager(weak: &Weak<Inner>, run: impl FnOnce(&WindowManager)) {
    if let Some(inner) = weak.upgrade() {
        run(&WindowManager::from_inner(inner));
    }
}

/// Focuses and raises `window_id`, un-minimizing it.
///
/// Returns `Ok(false)` when it already was the focused top window.
fn focus_window_internal(
    stack: &mut Vec<OpenWindow>,
    window_id: &WindowId,
) -> Result<bool, WindowError> {
    let Some(index) = stack.iter().position(|open| &open.record.id == window_id) else {
        return Err(WindowError::UnknownWindow(window_id.clone()));
    };

    let already_focused_top = index + 1 == stack.len()
        && stack
            .get(index)
            .map(|open| open.record.is_focused && !open.record.minimized)
            .unwrap_or(false);
    if already_focused_top {
        return Ok(false);
    }

    for open in stack.iter_mut() {
        open.record.is_focused = false;
    }
    let mut open = stack.remove(index);
    open.record.is_focused = true;
    open.record.minimized = false;
    stack.push(open);
    normalize_window_stack(stack);
    Ok(true)
}

/// Renumbers z-indexes bottom-up and keeps exactly one focused window: the top-most
/// non-minimized one unless another valid window already holds focus.
fn normalize_window_stack(stack: &mut [OpenWindow]) {
    let mut has_focused = false;
    for (idx, open) in stack.iter_mut().enumerate() {
        open.record.z_index = (idx + 1) as u32;
        if open.record.minimized {
            open.record.is_focused = false;
        }
        if open.record.is_focused {
            if has_focused {
                open.record.is_focused = false;
            } else {
                has_focused = true;
            }
        }
    }

    if !has_focused {
        if let Some(top) = stack.iter_mut().rev().find(|open| !open.record.minimized) {
            top.record.is_focused = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use platform_host::ManualFrameScheduler;
    use platform_storage::{
        InlineSpawner, MemoryAppStateStore, MemoryKeyValueStore, StorageConfig, TieredStorage,
    };
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        model::AppState,
        surface::recording::{RecordingBinder, RecordingSurfaceFactory},
    };

    const KEY: &str = "webtop.state.snapshot";

    struct Desk {
        manager: WindowManager,
        store: StateStore,
        surfaces: RecordingSurfaceFactory,
        pointers: RecordingBinder,
        frames: ManualFrameScheduler,
    }

    fn desk_with(store: StateStore) -> Desk {
        let surfaces = RecordingSurfaceFactory::default();
        let pointers = RecordingBinder::default();
        let frames = ManualFrameScheduler::default();
        let host = WindowHost {
            surfaces: Rc::new(surfaces.clone()),
            pointers: Rc::new(pointers.clone()),
            frames: Rc::new(frames.clone()),
        };
        let config = DesktopConfig::default();
        let manager = WindowManager::new(store.clone(), host, config.clone());
        manager.set_viewport(config.viewport(1920, 1080));
        Desk {
            manager,
            store,
            surfaces,
            pointers,
            frames,
        }
    }

    fn desk() -> Desk {
        desk_with(StateStore::in_memory(AppState::default()))
    }

    fn calc() -> WindowConfig {
        WindowConfig {
            resizable: false,
            maximizable: false,
            ..WindowConfig::new("Calculator", 400, 550)
        }
    }

    fn rect(x: i32, y: i32, w: i32, h: i32) -> WindowRect {
        WindowRect { x, y, w, h }
    }

    fn at(x: i32, y: i32) -> PointerPosition {
        PointerPosition { x, y }
    }

    fn saved(desk: &Desk, id: &str) -> Option<WindowRect> {
        desk.store
            .slice::<Windows>()
            .get(id)
            .map(|geometry| geometry.rect())
    }

    fn live(desk: &Desk, id: &str) -> WindowRect {
        desk.surfaces.surface(id).expect("live surface").geometry()
    }

    #[test]
    fn calc_drag_updates_surface_per_frame_and_persists_on_pointer_up() {
        let desk = desk();
        desk.manager.create_window("calc", calc());
        assert_eq!(live(&desk, "calc"), rect(760, 246, 400, 550));

        let before = desk.store.get_state();
        assert!(desk
            .surfaces
            .emit("calc", SurfaceEvent::TitlebarPointerDown(at(800, 260))));
        assert_eq!(desk.pointers.active(), 1);

        desk.pointers.pointer_move(820, 270);
        desk.pointers.pointer_move(850, 290);
        assert_eq!(desk.frames.pending(), 1);
        assert_eq!(live(&desk, "calc"), rect(760, 246, 400, 550));

        assert_eq!(desk.frames.run_frame(), 1);
        assert_eq!(live(&desk, "calc"), rect(810, 276, 400, 550));

        desk.pointers.pointer_move(870, 300);
        desk.frames.run_frame();
        assert_eq!(live(&desk, "calc"), rect(830, 286, 400, 550));
        assert!(Rc::ptr_eq(&before, &desk.store.get_state()));
        assert_eq!(saved(&desk, "calc"), None);

        desk.pointers.pointer_up(900, 310);
        assert_eq!(live(&desk, "calc"), rect(860, 296, 400, 550));
        assert_eq!(saved(&desk, "calc"), Some(rect(860, 296, 400, 550)));
        assert_eq!(desk.pointers.active(), 0);
        assert!(!desk.manager.is_gesture_active());
    }

    #[test]
    fn pointer_up_before_any_frame_still_persists_final_geometry() {
        let desk = desk();
        desk.manager.create_window("calc", calc());
        desk.surfaces
            .emit("calc", SurfaceEvent::TitlebarPointerDown(at(800, 260)));
        desk.pointers.pointer_move(850, 290);
        desk.pointers.pointer_up(900, 310);

        assert_eq!(saved(&desk, "calc"), Some(rect(860, 296, 400, 550)));
        let writes = desk.surfaces.surface("calc").expect("surface").geometry_writes();
        desk.frames.run_frame();
        assert_eq!(
            desk.surfaces.surface("calc").expect("surface").geometry_writes(),
            writes
        );
    }

    #[test]
    fn drag_is_clamped_to_work_area() {
        let desk = desk();
        desk.manager.create_window("calc", calc());
        desk.manager.begin_drag("calc", at(800, 260));
        desk.manager.pointer_up(at(5000, 5000));
        assert_eq!(saved(&desk, "calc"), Some(rect(1520, 492, 400, 550)));
    }

    #[test]
    fn reopening_an_open_window_focuses_the_same_surface() {
        let desk = desk();
        let first = desk.manager.create_window("calc", calc());
        desk.manager.create_window("notes", WindowConfig::new("Notes", 500, 400));
        let again = desk.manager.create_window("calc", calc());

        assert!(first.same_surface(&again));
        assert_eq!(desk.surfaces.created_count(), 2);
        assert_eq!(desk.manager.active_window(), Some(WindowId::new("calc")));
        assert_eq!(desk.manager.windows().len(), 2);
    }

    #[test]
    fn geometry_round_trips_through_close_and_recreate() {
        let desk = desk();
        desk.manager.create_window("calc", calc());
        desk.manager.begin_drag("calc", at(800, 260));
        desk.manager.pointer_up(at(700, 200));
        let moved = live(&desk, "calc");

        assert!(desk.manager.close_window("calc"));
        assert!(desk.surfaces.surface("calc").is_none());
        assert_eq!(saved(&desk, "calc"), Some(moved));
        assert!(!desk.manager.close_window("calc"));

        desk.manager.create_window("calc", calc());
        assert_eq!(live(&desk, "calc"), moved);
        assert_eq!(desk.surfaces.created_count(), 2);
    }

    #[test]
    fn geometry_survives_a_reload_from_storage() {
        let fast = MemoryKeyValueStore::default();
        let storage = || {
            TieredStorage::new(
                Rc::new(fast.clone()),
                Rc::new(MemoryAppStateStore::default()),
                Rc::new(InlineSpawner),
                StorageConfig::default(),
            )
        };

        let first = desk_with(StateStore::load(storage(), KEY));
        first.manager.create_window("calc", calc());
        first.manager.begin_drag("calc", at(800, 260));
        first.manager.pointer_up(at(600, 100));
        let moved = live(&first, "calc");

        let second = desk_with(StateStore::load(storage(), KEY));
        second.manager.create_window("calc", calc());
        assert_eq!(live(&second, "calc"), moved);
    }

    #[test]
    fn off_screen_persisted_geometry_is_clamped_on_create() {
        let mut state = AppState::default();
        state.windows = BTreeMap::from([(
            "calc".to_string(),
            WindowGeometry::from(rect(5000, -200, 400, 550)),
        )]);
        let desk = desk_with(StateStore::in_memory(state));

        desk.manager.create_window("calc", calc());
        assert_eq!(live(&desk, "calc"), rect(1520, 0, 400, 550));
    }

    #[test]
    fn new_windows_cascade_off_an_occupied_origin() {
        let desk = desk();
        desk.manager.create_window("a", WindowConfig::new("A", 400, 300));
        desk.manager.create_window("b", WindowConfig::new("B", 400, 300));
        assert_eq!(live(&desk, "a"), rect(760, 371, 400, 300));
        assert_eq!(live(&desk, "b"), rect(790, 401, 400, 300));
    }

    #[test]
    fn each_new_window_opens_on_top_and_active() {
        let desk = desk();
        desk.manager.create_window("a", WindowConfig::new("A", 300, 200));
        assert_eq!(desk.manager.active_window(), Some(WindowId::new("a")));

        desk.manager.create_window("b", WindowConfig::new("B", 300, 200));
        assert_eq!(desk.manager.active_window(), Some(WindowId::new("b")));
        let z = |id: &str| desk.surfaces.surface(id).expect("surface").z_index();
        assert!(z("b") > z("a"));
        assert!(desk.surfaces.surface("b").expect("b").state().active);
        assert!(!desk.surfaces.surface("a").expect("a").state().active);
    }

    #[test]
    fn focus_raises_and_close_hands_focus_to_top_remaining_window() {
        let desk = desk();
        for id in ["a", "b", "c"] {
            desk.manager.create_window(id, WindowConfig::new(id, 300, 200));
        }
        assert!(desk.manager.focus("a"));
        let z = |id: &str| desk.surfaces.surface(id).expect("surface").z_index();
        assert!(z("a") > z("c") && z("c") > z("b"));
        assert!(desk.surfaces.surface("a").expect("a").state().active);

        desk.manager.close_window("a");
        assert_eq!(desk.manager.active_window(), Some(WindowId::new("c")));

        desk.manager.minimize("c");
        assert_eq!(desk.manager.active_window(), Some(WindowId::new("b")));
        assert!(desk.surfaces.surface("c").expect("c").state().minimized);

        desk.manager.focus("c");
        assert_eq!(desk.manager.active_window(), Some(WindowId::new("c")));
        let active = desk
            .manager
            .windows()
            .iter()
            .filter(|window| window.is_focused)
            .count();
        assert_eq!(active, 1);

        assert!(!desk.manager.focus("missing"));
    }

    #[test]
    fn closing_during_a_gesture_detaches_listeners() {
        let desk = desk();
        desk.manager.create_window("calc", calc());
        desk.manager.begin_drag("calc", at(800, 260));
        assert_eq!(desk.pointers.active(), 1);

        desk.surfaces.emit("calc", SurfaceEvent::Close);
        assert_eq!(desk.pointers.active(), 0);
        assert!(desk.manager.windows().is_empty());

        desk.pointers.pointer_move(900, 300);
        assert_eq!(desk.frames.pending(), 0);
    }

    #[test]
    fn pointer_cancel_ends_gesture_at_last_tracked_geometry() {
        let desk = desk();
        desk.manager.create_window("calc", calc());
        desk.manager.begin_drag("calc", at(800, 260));
        desk.pointers.pointer_move(810, 270);
        desk.pointers.pointer_cancel();

        assert_eq!(desk.pointers.active(), 0);
        assert_eq!(saved(&desk, "calc"), Some(rect(770, 256, 400, 550)));
    }

    #[test]
    fn northwest_resize_keeps_bottom_right_anchored() {
        let desk = desk();
        desk.manager.create_window("notes", WindowConfig::new("Notes", 400, 300));
        assert_eq!(live(&desk, "notes"), rect(760, 371, 400, 300));

        desk.surfaces.emit(
            "notes",
            SurfaceEvent::ResizePointerDown {
                edges: ResizeEdges::from_handle_class("window-resize-handle edge-nw")
                    .expect("nw"),
                pointer: at(760, 371),
            },
        );
        desk.pointers.pointer_move(700, 331);
        desk.frames.run_frame();
        assert_eq!(live(&desk, "notes"), rect(700, 331, 460, 340));

        desk.pointers.pointer_up(1000, 600);
        let stored = saved(&desk, "notes").expect("saved");
        assert_eq!(stored, rect(940, 531, 220, 140));
        assert_eq!(stored.right(), 1160);
        assert_eq!(stored.bottom(), 671);
    }

    #[test]
    fn fixed_size_windows_ignore_resize_and_maximize() {
        let desk = desk();
        desk.manager.create_window("calc", calc());
        assert!(!desk
            .manager
            .begin_resize("calc", ResizeEdges::from_handle_class("se").expect("se"), at(0, 0)));
        assert!(!desk.manager.maximize("calc"));
        assert_eq!(desk.pointers.active(), 0);
    }

    #[test]
    fn maximize_and_restore_persist_restore_geometry() {
        let desk = desk();
        desk.manager.create_window("notes", WindowConfig::new("Notes", 400, 300));

        desk.surfaces.emit("notes", SurfaceEvent::ToggleMaximize);
        assert_eq!(live(&desk, "notes"), rect(0, 0, 1920, 1042));
        let stored = desk.store.slice::<Windows>()["notes"];
        assert!(stored.maximized);
        assert_eq!(stored.rect(), rect(760, 371, 400, 300));

        // Dragging a maximized window does nothing.
        assert!(!desk.manager.begin_drag("notes", at(10, 10)));

        desk.surfaces.emit("notes", SurfaceEvent::ToggleMaximize);
        assert_eq!(live(&desk, "notes"), rect(760, 371, 400, 300));
        assert!(!desk.store.slice::<Windows>()["notes"].maximized);
    }

    #[test]
    fn persisted_maximized_window_reopens_maximized() {
        let mut state = AppState::default();
        state.windows.insert(
            "notes".to_string(),
            WindowGeometry {
                maximized: true,
                ..WindowGeometry::from(rect(100, 100, 400, 300))
            },
        );
        let desk = desk_with(StateStore::in_memory(state));
        desk.manager.create_window("notes", WindowConfig::new("Notes", 400, 300));

        assert_eq!(live(&desk, "notes"), rect(0, 0, 1920, 1042));
        desk.manager.restore("notes");
        assert_eq!(live(&desk, "notes"), rect(100, 100, 400, 300));
    }

    #[test]
    fn viewport_shrink_pulls_windows_back_on_screen() {
        let desk = desk();
        desk.manager.create_window("calc", calc());
        desk.manager
            .set_viewport(DesktopConfig::default().viewport(800, 600));
        assert_eq!(live(&desk, "calc"), rect(400, 12, 400, 550));
    }

    #[test]
    fn subscribers_see_window_list_changes() {
        let desk = desk();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let id = desk.manager.subscribe(move |windows| {
            sink.borrow_mut()
                .push(windows.iter().map(|w| w.id.to_string()).collect::<Vec<_>>());
        });

        desk.manager.create_window("a", WindowConfig::new("A", 300, 200));
        desk.manager.create_window("b", WindowConfig::new("B", 300, 200));
        desk.manager.focus("a");
        assert!(desk.manager.unsubscribe(id));
        desk.manager.close_window("a");

        let seen = seen.borrow();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[2], vec!["a".to_string(), "b".to_string()]);
    }
}
