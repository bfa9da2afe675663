//! Launchable windows listed in the start menu, embedded from `launchers.toml` at build time.

use std::sync::OnceLock;

use leptos::logging;
use serde::Deserialize;

use crate::model::WindowConfig;

include!(concat!(env!("OUT_DIR"), "/launcher_catalog_generated.rs"));

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Launcher {
    pub id: String,
    pub title: String,
    pub icon: String,
    pub width: i32,
    pub height: i32,
    pub resizable: bool,
    pub maximizable: bool,
}

impl Launcher {
    /// Window options for opening this launcher's window.
    pub fn window_config(&self) -> WindowConfig {
        WindowConfig {
            resizable: self.resizable,
            maximizable: self.maximizable,
            icon: Some(self.icon.clone()),
            class: Some(format!("app-{}", self.id)),
            ..WindowConfig::new(self.title.clone(), self.width, self.height)
        }
    }
}

/// Returns the generated catalog JSON payload.
pub fn launcher_catalog_json() -> &'static str {
    LAUNCHER_CATALOG_JSON
}

/// All launchers in catalog order.
pub fn launchers() -> &'static [Launcher] {
    static CATALOG: OnceLock<Vec<Launcher>> = OnceLock::new();
    CATALOG.get_or_init(|| {
        serde_json::from_str(LAUNCHER_CATALOG_JSON).unwrap_or_else(|err| {
            logging::error!("launcher catalog is unreadable: {err}");
            Vec::new()
        })
    })
}

pub fn launcher(id: &str) -> Option<&'static Launcher> {
    launchers().iter().find(|launcher| launcher.id == id)
}
