use std::time::Duration;

use leptos::*;

use super::use_desktop_runtime;
use crate::{launchers::launchers, model::WindowRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TaskbarButtonAction {
    Minimize,
    Focus,
}

/// Clicking the active window's button hides it; any other click brings the window forward.
fn taskbar_button_action(window: &WindowRecord) -> TaskbarButtonAction {
    if window.is_focused && !window.minimized {
        TaskbarButtonAction::Minimize
    } else {
        TaskbarButtonAction::Focus
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ClockSnapshot {
    hour: u32,
    minute: u32,
}

impl ClockSnapshot {
    fn now() -> Self {
        #[cfg(target_arch = "wasm32")]
        {
            let date = js_sys::Date::new_0();
            Self {
                hour: date.get_hours(),
                minute: date.get_minutes(),
            }
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            Self { hour: 0, minute: 0 }
        }
    }
}

fn format_clock(now: ClockSnapshot, clock_24h: bool) -> String {
    if clock_24h {
        return format!("{:02}:{:02}", now.hour, now.minute);
    }
    let suffix = if now.hour < 12 { "AM" } else { "PM" };
    let hour = match now.hour % 12 {
        0 => 12,
        hour => hour,
    };
    format!("{hour}:{:02} {suffix}", now.minute)
}

#[component]
pub(super) fn Taskbar() -> impl IntoView {
    let runtime = use_desktop_runtime();
    let clock_now = create_rw_signal(ClockSnapshot::now());

    if let Ok(interval) = set_interval_with_handle(
        move || clock_now.set(ClockSnapshot::now()),
        Duration::from_secs(15),
    ) {
        on_cleanup(move || interval.clear());
    }

    let window_buttons = move || {
        runtime
            .windows
            .get()
            .into_iter()
            .map(|window| {
                let id = window.id.clone();
                let active = window.is_focused && !window.minimized;
                let action = taskbar_button_action(&window);
                let icon = window.icon.clone().unwrap_or_default();
                view! {
                    <button
                        type="button"
                        class="taskbar-window-button"
                        class:active=active
                        class:minimized=window.minimized
                        aria-pressed=active.to_string()
                        title=window.title.clone()
                        on:click=move |_| {
                            let manager = runtime.window_manager();
                            match action {
                                TaskbarButtonAction::Minimize => manager.minimize(id.as_str()),
                                TaskbarButtonAction::Focus => manager.focus(id.as_str()),
                            };
                        }
                    >
                        <span class="taskbar-window-icon" aria-hidden="true">{icon}</span>
                        <span class="taskbar-window-title">{window.title.clone()}</span>
                    </button>
                }
            })
            .collect_view()
    };

    let start_items = launchers()
        .iter()
        .map(|entry| {
            let id = entry.id.clone();
            view! {
                <button
                    type="button"
                    role="menuitem"
                    class="start-menu-item"
                    on:click=move |_| {
                        runtime.start_menu_open.set(false);
                        runtime.open_launcher(&id);
                    }
                >
                    <span class="start-menu-icon" aria-hidden="true">{entry.icon.clone()}</span>
                    <span>{entry.title.clone()}</span>
                </button>
            }
        })
        .collect_view();

    view! {
        <footer class="taskbar" role="toolbar" aria-label="Taskbar">
            <button
                type="button"
                class="taskbar-start"
                aria-haspopup="menu"
                aria-controls="start-menu"
                aria-expanded=move || runtime.start_menu_open.get().to_string()
                on:click=move |_| runtime.start_menu_open.update(|open| *open = !*open)
            >
                "Start"
            </button>
            <div
                id="start-menu"
                class="start-menu"
                role="menu"
                hidden=move || !runtime.start_menu_open.get()
            >
                {start_items}
            </div>
            <div class="taskbar-windows">{window_buttons}</div>
            <time class="taskbar-clock">
                {move || format_clock(clock_now.get(), runtime.state.get().settings.clock_24h)}
            </time>
        </footer>
    }
}
