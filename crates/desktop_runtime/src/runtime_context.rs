//! Runtime provider and context wiring for the desktop shell.
//!
//! The composition root builds the [`StateStore`] and [`WindowManager`] and hands them to
//! [`DesktopProvider`], which mirrors both into Leptos signals for the shell components.

use std::rc::Rc;

use leptos::*;

use crate::{
    launchers,
    model::{AppState, WindowRecord},
    store::StateStore,
    window_manager::{WindowHandle, WindowManager},
};

#[derive(Clone, Copy)]
/// Leptos context for reading desktop state and driving windows.
pub struct DesktopRuntimeContext {
    store: StoredValue<StateStore>,
    window_manager: StoredValue<WindowManager>,
    /// Latest store snapshot.
    pub state: RwSignal<Rc<AppState>>,
    /// Open windows in the order they were opened.
    pub windows: RwSignal<Vec<WindowRecord>>,
    pub start_menu_open: RwSignal<bool>,
}

impl DesktopRuntimeContext {
    pub fn store(&self) -> StateStore {
        self.store.get_value()
    }

    pub fn window_manager(&self) -> WindowManager {
        self.window_manager.get_value()
    }

    /// Opens (or focuses) the window for catalog launcher `id`.
    pub fn open_launcher(&self, id: &str) -> Option<WindowHandle> {
        let Some(entry) = launchers::launcher(id) else {
            logging::warn!("no launcher `{id}`");
            return None;
        };
        Some(
            self.window_manager()
                .create_window(entry.id.as_str(), entry.window_config()),
        )
    }
}

#[component]
/// Provides [`DesktopRuntimeContext`] to descendant components.
pub fn DesktopProvider(
    /// Booted state store.
    store: StateStore,
    /// Window manager writing through `store`.
    window_manager: WindowManager,
    children: Children,
) -> impl IntoView {
    let state = create_rw_signal(store.get_state());
    let windows = create_rw_signal(window_manager.windows());

    let reader = store.clone();
    let subscription = store.subscribe(move |_, _| {
        state.set(reader.get_state());
        Ok(())
    });
    on_cleanup(move || subscription.unsubscribe());

    let listener = window_manager.subscribe(move |records| windows.set(records.to_vec()));
    let manager = window_manager.clone();
    on_cleanup(move || {
        manager.unsubscribe(listener);
    });

    let manager = window_manager.clone();
    let resize_listener = window_event_listener(ev::resize, move |_| {
        let (width, height) = platform_host_web::viewport_size();
        manager.set_viewport(manager.config().viewport(width, height));
    });
    on_cleanup(move || resize_listener.remove());

    let runtime = DesktopRuntimeContext {
        store: store_value(store),
        window_manager: store_value(window_manager),
        state,
        windows,
        start_menu_open: create_rw_signal(false),
    };
    provide_context(runtime);

    children().into_view()
}

/// Returns the current [`DesktopRuntimeContext`].
///
/// # Panics
///
/// Panics if called outside [`DesktopProvider`].
pub fn use_desktop_runtime() -> DesktopRuntimeContext {
    use_context::<DesktopRuntimeContext>().expect("DesktopRuntimeContext not provided")
}
