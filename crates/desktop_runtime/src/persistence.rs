//! Snapshot persistence and one-shot migration from the legacy per-feature keys.
//!
//! The whole [`AppState`] is stored as one [`AppStateEnvelope`] under the snapshot key. Builds
//! before the unified snapshot kept each feature under its own key; those keys are read once to
//! seed the snapshot and are never deleted.

use leptos::logging;
use platform_host::{build_app_state_envelope, decode_envelope_payload, DESKTOP_STATE_NAMESPACE};
use platform_storage::{AppStateEnvelope, TieredStorage};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    model::{AiHistory, AiMessage, AppState, STATE_SCHEMA_VERSION},
    slices::SliceKey,
};

pub const LEGACY_TASKS_KEY: &str = "webtop.tasks";
pub const LEGACY_NOTES_KEY: &str = "webtop.notes";
pub const LEGACY_SETTINGS_KEY: &str = "webtop.settings";
pub const LEGACY_WINDOW_POSITIONS_KEY: &str = "webtop.window_positions";
pub const LEGACY_AI_HISTORY_KEY: &str = "webtop.ai_history";
pub const LEGACY_WEATHER_KEY: &str = "webtop.weather";

/// Legacy key feeding each slice.
pub const LEGACY_KEYS: [(SliceKey, &str); 6] = [
    (SliceKey::Tasks, LEGACY_TASKS_KEY),
    (SliceKey::Notes, LEGACY_NOTES_KEY),
    (SliceKey::Settings, LEGACY_SETTINGS_KEY),
    (SliceKey::Windows, LEGACY_WINDOW_POSITIONS_KEY),
    (SliceKey::Ai, LEGACY_AI_HISTORY_KEY),
    (SliceKey::Weather, LEGACY_WEATHER_KEY),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
enum LegacyAiHistory {
    Messages(Vec<AiMessage>),
    History(AiHistory),
}

/// Outcome of reading the snapshot key.
#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotStatus {
    /// Snapshot at the current schema.
    Current(AppState),
    /// Snapshot at an older schema; payload decoded leniently as a raw object.
    Outdated(Value),
    /// Snapshot written by a newer build.
    Newer(u32),
    Missing,
}

/// Reads and classifies the snapshot stored under `key`.
pub fn read_snapshot(storage: &TieredStorage, key: &str) -> SnapshotStatus {
    let Some(envelope) = storage.get_opt::<AppStateEnvelope>(key) else {
        return SnapshotStatus::Missing;
    };

    if envelope.schema_version > STATE_SCHEMA_VERSION {
        return SnapshotStatus::Newer(envelope.schema_version);
    }
    if envelope.schema_version < STATE_SCHEMA_VERSION {
        return SnapshotStatus::Outdated(envelope.payload);
    }

    match decode_envelope_payload::<AppState>(&envelope) {
        Ok(state) => SnapshotStatus::Current(state),
        Err(err) => {
            logging::warn!("state snapshot has an unexpected shape, migrating again: {err}");
            SnapshotStatus::Outdated(envelope.payload)
        }
    }
}

/// Returns the startup state: the current snapshot if present, otherwise a state migrated from an
/// older snapshot and the legacy keys (written back once), otherwise defaults.
pub fn load_or_migrate(storage: &TieredStorage, key: &str) -> AppState {
    let base = match read_snapshot(storage, key) {
        SnapshotStatus::Current(state) => return state,
        SnapshotStatus::Newer(version) => {
            logging::warn!(
                "state snapshot schema {version} is newer than supported {STATE_SCHEMA_VERSION}; \
                 starting from defaults"
            );
            return AppState::default();
        }
        SnapshotStatus::Outdated(payload) => payload,
        SnapshotStatus::Missing => Value::Object(Default::default()),
    };

    let (state, migrated) = migrate(storage, base);
    if migrated > 0 {
        logging::log!("migrated {migrated} legacy storage key(s) into the state snapshot");
    }
    if !save_snapshot(storage, key, &state) {
        logging::warn!("migrated state snapshot could not be written");
    }
    state
}

/// Builds a unified state from an older snapshot payload plus legacy keys for any slice the
/// payload lacks. Returns the state and how many legacy keys contributed.
pub fn migrate(storage: &TieredStorage, base: Value) -> (AppState, usize) {
    let mut object = match base {
        Value::Object(object) => object,
        _ => Default::default(),
    };

    let mut migrated = 0;
    for (slice, legacy_key) in LEGACY_KEYS {
        if object.contains_key(slice.as_str()) {
            continue;
        }
        if let Some(value) = read_legacy(storage, slice, legacy_key) {
            object.insert(slice.as_str().to_string(), value);
            migrated += 1;
        }
    }

    let mut state = AppState::default();
    for slice in SliceKey::ALL {
        let Some(value) = object.remove(slice.as_str()) else {
            continue;
        };
        if let Err(err) = slice.write(&mut state, value) {
            logging::warn!("dropping unreadable `{slice}` during migration: {err}");
        }
    }
    (state, migrated)
}

fn read_legacy(storage: &TieredStorage, slice: SliceKey, key: &str) -> Option<Value> {
    let value = storage.get_opt::<Value>(key)?;
    if slice != SliceKey::Ai {
        return Some(value);
    }
    // Old assistant history was a bare message array.
    match serde_json::from_value::<LegacyAiHistory>(value) {
        Ok(LegacyAiHistory::Messages(messages)) => {
            serde_json::to_value(AiHistory { messages }).ok()
        }
        Ok(LegacyAiHistory::History(history)) => serde_json::to_value(history).ok(),
        Err(err) => {
            logging::warn!("legacy `{key}` has an unexpected shape: {err}");
            None
        }
    }
}

/// Writes `state` as the current snapshot. Returns `false` when no tier accepted it.
pub fn save_snapshot(storage: &TieredStorage, key: &str, state: &AppState) -> bool {
    match build_app_state_envelope(DESKTOP_STATE_NAMESPACE, STATE_SCHEMA_VERSION, state) {
        Ok(envelope) => storage.set(key, &envelope),
        Err(err) => {
            logging::warn!("state snapshot serialization failed: {err}");
            false
        }
    }
}
