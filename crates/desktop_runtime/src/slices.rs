//! Typed access to the named regions of [`AppState`].
//!
//! Each slice has a marker type implementing [`Slice`], so `store.slice::<Tasks>()` is statically
//! a `Vec<TaskItem>`. [`SliceKey`] covers the string-keyed JSON path used by generic callers.

use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::{
    model::{AiHistory, AppState, DesktopSettings, NoteItem, TaskItem, WeatherCache, WindowGeometry},
    store::StoreError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
/// Stable name of one state slice.
pub enum SliceKey {
    Tasks,
    Notes,
    Settings,
    Windows,
    Ai,
    Weather,
}

impl SliceKey {
    pub const ALL: [SliceKey; 6] = [
        SliceKey::Tasks,
        SliceKey::Notes,
        SliceKey::Settings,
        SliceKey::Windows,
        SliceKey::Ai,
        SliceKey::Weather,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tasks => "tasks",
            Self::Notes => "notes",
            Self::Settings => "settings",
            Self::Windows => "windows",
            Self::Ai => "ai",
            Self::Weather => "weather",
        }
    }

    /// Serializes this slice of `state` to JSON.
    pub fn read(self, state: &AppState) -> Result<Value, StoreError> {
        match self {
            Self::Tasks => to_json::<Tasks>(state),
            Self::Notes => to_json::<Notes>(state),
            Self::Settings => to_json::<Settings>(state),
            Self::Windows => to_json::<Windows>(state),
            Self::Ai => to_json::<Ai>(state),
            Self::Weather => to_json::<Weather>(state),
        }
    }

    /// Decodes `value` and replaces this slice of `state` with it.
    ///
    /// On error `state` is left untouched.
    pub fn write(self, state: &mut AppState, value: Value) -> Result<(), StoreError> {
        match self {
            Self::Tasks => from_json::<Tasks>(state, value),
            Self::Notes => from_json::<Notes>(state, value),
            Self::Settings => from_json::<Settings>(state, value),
            Self::Windows => from_json::<Windows>(state, value),
            Self::Ai => from_json::<Ai>(state, value),
            Self::Weather => from_json::<Weather>(state, value),
        }
    }
}

impl fmt::Display for SliceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SliceKey {
    type Err = StoreError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == raw)
            .ok_or_else(|| StoreError::UnknownSlice(raw.to_string()))
    }
}

/// A statically typed slice of [`AppState`].
pub trait Slice: 'static {
    type Value: Clone + PartialEq + Serialize + DeserializeOwned;

    const KEY: SliceKey;

    fn get(state: &AppState) -> &Self::Value;

    fn set(state: &mut AppState, value: Self::Value);
}

fn to_json<S: Slice>(state: &AppState) -> Result<Value, StoreError> {
    serde_json::to_value(S::get(state)).map_err(|err| StoreError::Encode {
        slice: S::KEY,
        message: err.to_string(),
    })
}

fn from_json<S: Slice>(state: &mut AppState, value: Value) -> Result<(), StoreError> {
    let decoded = serde_json::from_value(value).map_err(|err| StoreError::Decode {
        slice: S::KEY,
        message: err.to_string(),
    })?;
    S::set(state, decoded);
    Ok(())
}

macro_rules! slice_marker {
    ($(#[$meta:meta])* $name:ident, $key:ident, $field:ident: $ty:ty) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy)]
        pub struct $name;

        impl Slice for $name {
            type Value = $ty;

            const KEY: SliceKey = SliceKey::$key;

            fn get(state: &AppState) -> &Self::Value {
                &state.$field
            }

            fn set(state: &mut AppState, value: Self::Value) {
                state.$field = value;
            }
        }
    };
}

slice_marker!(
    /// Task list (`tasks`).
    Tasks, Tasks, tasks: Vec<TaskItem>
);
slice_marker!(
    /// Notes (`notes`).
    Notes, Notes, notes: Vec<NoteItem>
);
slice_marker!(
    /// Desktop settings (`settings`).
    Settings, Settings, settings: DesktopSettings
);
slice_marker!(
    /// Persisted window geometry keyed by window id (`windows`).
    Windows, Windows, windows: BTreeMap<String, WindowGeometry>
);
slice_marker!(
    /// Assistant conversation history (`ai`).
    Ai, Ai, ai: AiHistory
);
slice_marker!(
    /// Cached weather lookup (`weather`).
    Weather, Weather, weather: Option<WeatherCache>
);

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn keys_round_trip_through_their_names() {
        for key in SliceKey::ALL {
            assert_eq!(key.as_str().parse::<SliceKey>().expect("known key"), key);
        }
        assert!(matches!(
            "bogus".parse::<SliceKey>(),
            Err(StoreError::UnknownSlice(name)) if name == "bogus"
        ));
    }

    #[test]
    fn json_write_rejects_wrong_shape_without_touching_state() {
        let mut state = AppState::default();
        let before = state.clone();
        let err = SliceKey::Tasks
            .write(&mut state, json!({"not": "a list"}))
            .expect_err("shape mismatch");
        assert!(matches!(err, StoreError::Decode { slice: SliceKey::Tasks, .. }));
        assert_eq!(state, before);
    }

    #[test]
    fn json_read_and_write_use_the_typed_slice() {
        let mut state = AppState::default();
        SliceKey::Settings
            .write(
                &mut state,
                json!({"theme": "dark", "wallpaper_id": "dunes", "reduced_motion": true, "clock_24h": true}),
            )
            .expect("settings");
        assert_eq!(Settings::get(&state).theme, "dark");
        assert_eq!(
            SliceKey::Settings.read(&state).expect("read")["wallpaper_id"],
            json!("dunes")
        );
        assert_eq!(SliceKey::Weather.read(&state).expect("read"), Value::Null);
    }
}
