use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Current schema version of the persisted [`AppState`] snapshot.
pub const STATE_SCHEMA_VERSION: u32 = 2;
pub const DEFAULT_WINDOW_WIDTH: i32 = 420;
pub const DEFAULT_WINDOW_HEIGHT: i32 = 300;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
/// Caller-chosen window identifier. Stable across reopen, so it doubles as the geometry key.
pub struct WindowId(pub String);

impl WindowId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for WindowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WindowId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for WindowId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowRect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl WindowRect {
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..self
        }
    }

    pub fn right(self) -> i32 {
        self.x + self.w
    }

    pub fn bottom(self) -> i32 {
        self.y + self.h
    }

    /// Returns `true` when `other` lies entirely inside `self`.
    pub fn contains(self, other: WindowRect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }
}

impl Default for WindowRect {
    fn default() -> Self {
        Self {
            x: 48,
            y: 48,
            w: DEFAULT_WINDOW_WIDTH,
            h: DEFAULT_WINDOW_HEIGHT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
/// Persisted geometry for one window id, stored in the `windows` slice.
///
/// Older builds wrote `left`/`top` and `w`/`h`; both spellings are accepted on read.
pub struct WindowGeometry {
    #[serde(alias = "left")]
    pub x: i32,
    #[serde(alias = "top")]
    pub y: i32,
    #[serde(alias = "w")]
    pub width: i32,
    #[serde(alias = "h")]
    pub height: i32,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub maximized: bool,
}

impl WindowGeometry {
    pub fn rect(self) -> WindowRect {
        WindowRect {
            x: self.x,
            y: self.y,
            w: self.width,
            h: self.height,
        }
    }
}

impl From<WindowRect> for WindowGeometry {
    fn from(rect: WindowRect) -> Self {
        Self {
            x: rect.x,
            y: rect.y,
            width: rect.w,
            height: rect.h,
            maximized: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowFlags {
    pub resizable: bool,
    pub maximizable: bool,
}

impl Default for WindowFlags {
    fn default() -> Self {
        Self {
            resizable: true,
            maximizable: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// One open window as tracked by the window manager.
pub struct WindowRecord {
    pub id: WindowId,
    pub title: String,
    pub icon: Option<String>,
    pub class: Option<String>,
    /// Last committed geometry. The surface may be ahead of this during a gesture.
    pub geometry: WindowRect,
    pub restore_rect: Option<WindowRect>,
    pub z_index: u32,
    pub is_focused: bool,
    pub minimized: bool,
    pub maximized: bool,
    pub flags: WindowFlags,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
/// Initial content placed in a window body. Apps can also mount into the handle's content root.
pub enum WindowContent {
    #[default]
    Empty,
    Text(String),
    Html(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Options accepted by `WindowManager::create_window`.
pub struct WindowConfig {
    pub title: String,
    pub width: i32,
    pub height: i32,
    pub content: WindowContent,
    pub resizable: bool,
    pub maximizable: bool,
    pub class: Option<String>,
    pub icon: Option<String>,
}

impl WindowConfig {
    pub fn new(title: impl Into<String>, width: i32, height: i32) -> Self {
        Self {
            title: title.into(),
            width,
            height,
            content: WindowContent::Empty,
            resizable: true,
            maximizable: true,
            class: None,
            icon: None,
        }
    }

    pub fn flags(&self) -> WindowFlags {
        WindowFlags {
            resizable: self.resizable,
            maximizable: self.maximizable,
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self::new("Window", DEFAULT_WINDOW_WIDTH, DEFAULT_WINDOW_HEIGHT)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointerPosition {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResizeEdge {
    North,
    South,
    East,
    West,
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
}

impl ResizeEdge {
    pub const ALL: [ResizeEdge; 8] = [
        ResizeEdge::North,
        ResizeEdge::South,
        ResizeEdge::East,
        ResizeEdge::West,
        ResizeEdge::NorthEast,
        ResizeEdge::NorthWest,
        ResizeEdge::SouthEast,
        ResizeEdge::SouthWest,
    ];

    /// Compass token used in resize-handle class names (`edge-nw`, ...).
    pub fn token(self) -> &'static str {
        match self {
            Self::North => "n",
            Self::South => "s",
            Self::East => "e",
            Self::West => "w",
            Self::NorthEast => "ne",
            Self::NorthWest => "nw",
            Self::SouthEast => "se",
            Self::SouthWest => "sw",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskItem {
    pub id: String,
    #[serde(alias = "title")]
    pub text: String,
    #[serde(default, alias = "done")]
    pub completed: bool,
    #[serde(default)]
    pub created_at_unix_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteItem {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, alias = "content")]
    pub body: String,
    #[serde(default)]
    pub updated_at_unix_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesktopSettings {
    pub theme: String,
    pub wallpaper_id: String,
    pub reduced_motion: bool,
    pub clock_24h: bool,
}

impl Default for DesktopSettings {
    fn default() -> Self {
        Self {
            theme: "light".to_string(),
            wallpaper_id: "default".to_string(),
            reduced_motion: false,
            clock_24h: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiMessage {
    pub role: AiRole,
    pub content: String,
    #[serde(default)]
    pub at_unix_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AiHistory {
    pub messages: Vec<AiMessage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Last weather lookup, cached so the widget can render before the network answers.
pub struct WeatherCache {
    pub location: String,
    pub payload: Value,
    #[serde(default)]
    pub fetched_at_unix_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
/// The whole shared desktop state. Each field is one named slice.
pub struct AppState {
    pub tasks: Vec<TaskItem>,
    pub notes: Vec<NoteItem>,
    pub settings: DesktopSettings,
    pub windows: BTreeMap<String, WindowGeometry>,
    pub ai: AiHistory,
    pub weather: Option<WeatherCache>,
}
