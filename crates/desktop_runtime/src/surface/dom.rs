//! Browser DOM surfaces and document pointer listeners.
//!
//! On non-`wasm32` targets the factory hands out detached in-memory surfaces and the binder
//! attaches nothing, so the shell wiring stays buildable on the host.

use std::rc::Rc;

use super::{
    recording::RecordingSurface, ListenerGuard, PointerHandlers, PointerListenerBinder,
    SurfaceEventSink, SurfaceFactory, SurfaceSpec, WindowSurface,
};
use crate::model::WindowRect;

/// DOM id of the element windows are appended to.
pub const WINDOW_LAYER_ID: &str = "desktop-window-layer";

#[derive(Debug, Clone)]
/// Builds `<section class="desktop-window">` surfaces inside a layer element.
pub struct DomSurfaceFactory {
    layer_id: String,
}

impl DomSurfaceFactory {
    pub fn new(layer_id: impl Into<String>) -> Self {
        Self {
            layer_id: layer_id.into(),
        }
    }
}

impl Default for DomSurfaceFactory {
    fn default() -> Self {
        Self::new(WINDOW_LAYER_ID)
    }
}

impl SurfaceFactory for DomSurfaceFactory {
    fn create(&self, spec: &SurfaceSpec, events: SurfaceEventSink) -> Rc<dyn WindowSurface> {
        #[cfg(target_arch = "wasm32")]
        {
            match imp::DomSurface::build(&self.layer_id, spec, events) {
                Ok(surface) => return Rc::new(surface),
                Err(err) => leptos::logging::warn!(
                    "window `{}` surface build failed: {err:?}; using a detached surface",
                    spec.id
                ),
            }
        }

        #[cfg(not(target_arch = "wasm32"))]
        let _ = (&self.layer_id, events);

        Rc::new(RecordingSurface::new(spec.clone()))
    }
}

#[derive(Debug, Clone, Copy, Default)]
/// Attaches gesture listeners to `document`.
pub struct DocumentPointerBinder;

impl PointerListenerBinder for DocumentPointerBinder {
    fn bind(&self, handlers: PointerHandlers) -> ListenerGuard {
        #[cfg(target_arch = "wasm32")]
        {
            imp::bind_document(handlers)
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = handlers;
            ListenerGuard::inert()
        }
    }
}

/// Reads the inline `left/top/width/height` a surface wrote. Layout boxes (`offsetWidth` and
/// friends) include borders and padding, so they would not round-trip through `set_geometry`.
/// Missing or non-pixel values keep the matching field of `last`.
#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
fn inline_style_rect(read: impl Fn(&str) -> String, last: WindowRect) -> WindowRect {
    let px = |property: &str, fallback: i32| parse_px(&read(property)).unwrap_or(fallback);
    WindowRect {
        x: px("left", last.x),
        y: px("top", last.y),
        w: px("width", last.w),
        h: px("height", last.h),
    }
}

fn parse_px(raw: &str) -> Option<i32> {
    let value: f64 = raw.trim().strip_suffix("px")?.trim().parse().ok()?;
    value.is_finite().then(|| value.round() as i32)
}

#[cfg(target_arch = "wasm32")]
mod imp {
    use std::cell::{Cell, RefCell};

    use wasm_bindgen::{closure::Closure, JsCast, JsValue};
    use web_sys::{Element, Event, EventTarget, HtmlElement, PointerEvent};

    use super::super::{SurfaceEvent, SurfaceState};
    use super::*;
    use crate::{
        geometry::ResizeEdges,
        model::{PointerPosition, ResizeEdge, WindowContent, WindowRect},
    };

    type Listener = (EventTarget, &'static str, Closure<dyn FnMut(Event)>);

    fn pointer_position(ev: &web_sys::MouseEvent) -> PointerPosition {
        PointerPosition {
            x: ev.client_x(),
            y: ev.client_y(),
        }
    }

    fn is_primary_press(ev: &PointerEvent) -> bool {
        if ev.pointer_type() == "mouse" {
            ev.button() == 0
        } else {
            ev.is_primary()
        }
    }

    fn try_set_pointer_capture(ev: &PointerEvent) {
        if let Some(target) = ev.current_target() {
            if let Ok(element) = target.dyn_into::<Element>() {
                let _ = element.set_pointer_capture(ev.pointer_id());
            }
        }
    }

    fn targets_button(ev: &Event) -> bool {
        ev.target()
            .and_then(|target| target.dyn_into::<Element>().ok())
            .and_then(|element| element.closest("button").ok().flatten())
            .is_some()
    }

    fn attach(
        target: &EventTarget,
        kind: &'static str,
        handler: impl FnMut(Event) + 'static,
    ) -> Result<Listener, JsValue> {
        let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
        target.add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref())?;
        Ok((target.clone(), kind, closure))
    }

    /// Removes listeners now and frees their closures on the next task, since one of them may be
    /// the handler currently running.
    fn release(listeners: Vec<Listener>) {
        for (target, kind, closure) in &listeners {
            let _ = target.remove_event_listener_with_callback(kind, closure.as_ref().unchecked_ref());
        }
        let Some(window) = web_sys::window() else {
            std::mem::forget(listeners);
            return;
        };
        let deferred = Closure::once_into_js(move || drop(listeners));
        let _ = window.set_timeout_with_callback(deferred.unchecked_ref());
    }

    pub(super) struct DomSurface {
        root: HtmlElement,
        body: Element,
        last_rect: Cell<WindowRect>,
        listeners: RefCell<Vec<Listener>>,
    }

    impl DomSurface {
        pub(super) fn build(
            layer_id: &str,
            spec: &SurfaceSpec,
            events: SurfaceEventSink,
        ) -> Result<Self, JsValue> {
            let document = web_sys::window()
                .and_then(|window| window.document())
                .ok_or_else(|| JsValue::from_str("document unavailable"))?;
            let layer: Element = match document.get_element_by_id(layer_id) {
                Some(layer) => layer,
                None => document
                    .body()
                    .map(Into::into)
                    .ok_or_else(|| JsValue::from_str("document has no body"))?,
            };

            let root: HtmlElement = document.create_element("section")?.dyn_into()?;
            let mut class_name = String::from("desktop-window");
            if let Some(extra) = &spec.class {
                class_name.push(' ');
                class_name.push_str(extra);
            }
            root.set_class_name(&class_name);
            root.set_attribute("role", "dialog")?;
            root.set_attribute("aria-label", &spec.title)?;
            root.set_attribute("data-window-id", spec.id.as_str())?;

            let header = document.create_element("header")?;
            header.set_class_name("titlebar");
            let title_group = document.create_element("div")?;
            title_group.set_class_name("titlebar-title");
            if let Some(icon) = &spec.icon {
                let icon_el = document.create_element("span")?;
                icon_el.set_class_name("titlebar-app-icon");
                icon_el.set_attribute("aria-hidden", "true")?;
                icon_el.set_text_content(Some(icon));
                title_group.append_child(&icon_el)?;
            }
            let title_el = document.create_element("span")?;
            title_el.set_text_content(Some(&spec.title));
            title_group.append_child(&title_el)?;
            header.append_child(&title_group)?;

            let controls = document.create_element("div")?;
            controls.set_class_name("titlebar-controls");
            let mut buttons = Vec::new();
            for (label, glyph, event, enabled) in [
                ("Minimize window", "\u{2013}", SurfaceEvent::Minimize, true),
                (
                    "Maximize window",
                    "\u{25a1}",
                    SurfaceEvent::ToggleMaximize,
                    spec.flags.maximizable,
                ),
                ("Close window", "\u{2715}", SurfaceEvent::Close, true),
            ] {
                let button = document.create_element("button")?;
                button.set_attribute("type", "button")?;
                button.set_attribute("aria-label", label)?;
                button.set_text_content(Some(glyph));
                if !enabled {
                    button.set_attribute("disabled", "")?;
                }
                controls.append_child(&button)?;
                buttons.push((button, event));
            }
            header.append_child(&controls)?;
            root.append_child(&header)?;

            let body = document.create_element("div")?;
            body.set_class_name("window-body");
            match &spec.content {
                WindowContent::Empty => {}
                WindowContent::Text(text) => body.set_text_content(Some(text)),
                WindowContent::Html(html) => body.set_inner_html(html),
            }
            root.append_child(&body)?;

            let mut handles = Vec::new();
            if spec.flags.resizable {
                for edge in ResizeEdge::ALL {
                    let handle = document.create_element("div")?;
                    handle.set_class_name(&format!("window-resize-handle edge-{}", edge.token()));
                    handle.set_attribute("aria-hidden", "true")?;
                    root.append_child(&handle)?;
                    handles.push(handle);
                }
            }

            layer.append_child(&root)?;

            let surface = Self {
                root: root.clone(),
                body,
                last_rect: Cell::new(spec.rect),
                listeners: RefCell::new(Vec::new()),
            };
            surface.set_geometry(spec.rect);
            surface.set_z_index(spec.z_index);

            let mut listeners = Vec::new();

            let sink = events.clone();
            listeners.push(attach(&root, "pointerdown", move |_| sink(SurfaceEvent::Focus))?);

            let sink = events.clone();
            listeners.push(attach(&header, "pointerdown", move |ev| {
                if targets_button(&ev) {
                    return;
                }
                let Some(ev) = ev.dyn_ref::<PointerEvent>() else {
                    return;
                };
                if !is_primary_press(ev) {
                    return;
                }
                try_set_pointer_capture(ev);
                ev.prevent_default();
                sink(SurfaceEvent::TitlebarPointerDown(pointer_position(ev)));
            })?);

            let sink = events.clone();
            listeners.push(attach(&header, "dblclick", move |ev| {
                if targets_button(&ev) {
                    return;
                }
                ev.prevent_default();
                sink(SurfaceEvent::ToggleMaximize);
            })?);

            for (button, event) in buttons {
                let sink = events.clone();
                listeners.push(attach(&button, "click", move |ev| {
                    ev.prevent_default();
                    ev.stop_propagation();
                    sink(event.clone());
                })?);
            }

            for handle in handles {
                let sink = events.clone();
                listeners.push(attach(&handle.clone(), "pointerdown", move |ev| {
                    let Some(pointer_ev) = ev.dyn_ref::<PointerEvent>() else {
                        return;
                    };
                    if !is_primary_press(pointer_ev) {
                        return;
                    }
                    let Some(edges) = ResizeEdges::from_handle_class(&handle.class_name()) else {
                        return;
                    };
                    try_set_pointer_capture(pointer_ev);
                    ev.prevent_default();
                    ev.stop_propagation();
                    sink(SurfaceEvent::ResizePointerDown {
                        edges,
                        pointer: pointer_position(pointer_ev),
                    });
                })?);
            }

            *surface.listeners.borrow_mut() = listeners;
            Ok(surface)
        }
    }

    impl WindowSurface for DomSurface {
        fn geometry(&self) -> WindowRect {
            let style = self.root.style();
            inline_style_rect(
                |property| style.get_property_value(property).unwrap_or_default(),
                self.last_rect.get(),
            )
        }

        fn set_geometry(&self, rect: WindowRect) {
            self.last_rect.set(rect);
            let style = self.root.style();
            let _ = style.set_property("left", &format!("{}px", rect.x));
            let _ = style.set_property("top", &format!("{}px", rect.y));
            let _ = style.set_property("width", &format!("{}px", rect.w));
            let _ = style.set_property("height", &format!("{}px", rect.h));
        }

        fn set_z_index(&self, z_index: u32) {
            let _ = self.root.style().set_property("z-index", &z_index.to_string());
        }

        fn set_state(&self, state: SurfaceState) {
            let classes = self.root.class_list();
            let _ = classes.toggle_with_force("focused", state.active);
            let _ = classes.toggle_with_force("minimized", state.minimized);
            let _ = classes.toggle_with_force("maximized", state.maximized);
        }

        fn content_root(&self) -> Option<Element> {
            Some(self.body.clone())
        }

        fn remove(&self) {
            release(std::mem::take(&mut *self.listeners.borrow_mut()));
            self.root.remove();
        }
    }

    pub(super) fn bind_document(handlers: PointerHandlers) -> ListenerGuard {
        let Some(document) = web_sys::window().and_then(|window| window.document()) else {
            return ListenerGuard::inert();
        };
        let target: EventTarget = document.into();

        let on_move = handlers.on_move.clone();
        let on_up = handlers.on_up.clone();
        let on_cancel = handlers.on_cancel.clone();
        let attached = [
            attach(&target, "pointermove", move |ev| {
                if let Some(ev) = ev.dyn_ref::<PointerEvent>() {
                    on_move(pointer_position(ev));
                }
            }),
            attach(&target, "pointerup", move |ev| {
                if let Some(ev) = ev.dyn_ref::<PointerEvent>() {
                    on_up(pointer_position(ev));
                }
            }),
            attach(&target, "pointercancel", move |_| on_cancel()),
        ];

        let mut listeners = Vec::new();
        for listener in attached {
            match listener {
                Ok(listener) => listeners.push(listener),
                Err(err) => leptos::logging::warn!("gesture listener attach failed: {err:?}"),
            }
        }
        ListenerGuard::new(move || release(listeners))
    }
}
