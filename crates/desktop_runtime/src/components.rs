//! Desktop shell UI: the window layer windows render into, plus the taskbar.

mod taskbar;

use leptos::*;

use self::taskbar::Taskbar;
use crate::surface::dom::WINDOW_LAYER_ID;

pub use crate::runtime_context::{use_desktop_runtime, DesktopProvider, DesktopRuntimeContext};

#[component]
/// Full-viewport desktop: wallpaper, window layer, and taskbar.
pub fn DesktopShell() -> impl IntoView {
    let runtime = use_desktop_runtime();
    let theme = move || runtime.state.get().settings.theme.clone();
    let wallpaper = move || runtime.state.get().settings.wallpaper_id.clone();
    let reduced_motion = move || runtime.state.get().settings.reduced_motion;

    let escape_listener = window_event_listener(ev::keydown, move |ev| {
        if ev.key() == "Escape" && runtime.start_menu_open.get_untracked() {
            runtime.start_menu_open.set(false);
        }
    });
    on_cleanup(move || escape_listener.remove());

    view! {
        <div
            class="desktop-shell"
            class:reduced-motion=reduced_motion
            data-theme=theme
            data-wallpaper=wallpaper
        >
            <div
                id=WINDOW_LAYER_ID
                class="desktop-window-layer"
                on:pointerdown=move |_| runtime.start_menu_open.set(false)
            />
            <Taskbar />
        </div>
    }
}
