//! Shared desktop state container with change notification and snapshot persistence.
//!
//! Every mutation builds a new [`AppState`] behind a fresh [`Rc`], persists it, and then notifies
//! subscribers with the new and previous states. Earlier snapshots handed out by
//! [`StateStore::get_state`] are never touched, so `Rc::ptr_eq` is a valid change check.

use std::{
    cell::{Cell, RefCell},
    collections::BTreeMap,
    rc::{Rc, Weak},
};

use leptos::logging;
use platform_storage::TieredStorage;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::{
    model::{
        AiHistory, AiMessage, AppState, DesktopSettings, NoteItem, TaskItem, WeatherCache,
        WindowGeometry,
    },
    persistence,
    slices::{Slice, SliceKey},
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Internal store failures. Public mutation methods log these instead of returning them.
pub enum StoreError {
    #[error("unknown state slice `{0}`")]
    UnknownSlice(String),
    #[error("slice `{slice}` rejected value: {message}")]
    Decode { slice: SliceKey, message: String },
    #[error("slice `{slice}` failed to serialize: {message}")]
    Encode { slice: SliceKey, message: String },
    #[error("{slice} item `{id}` not found")]
    ItemNotFound { slice: SliceKey, id: String },
    #[error("{slice} item `{id}` already exists")]
    DuplicateItem { slice: SliceKey, id: String },
    #[error("unrecognized store action: {0}")]
    UnknownAction(String),
}

#[derive(Debug, Clone, PartialEq, Default)]
/// Partial state merged by [`StateStore::set_state`]. `None` fields keep their current value.
pub struct StatePatch {
    pub tasks: Option<Vec<TaskItem>>,
    pub notes: Option<Vec<NoteItem>>,
    pub settings: Option<DesktopSettings>,
    pub windows: Option<BTreeMap<String, WindowGeometry>>,
    pub ai: Option<AiHistory>,
    pub weather: Option<Option<WeatherCache>>,
}

impl StatePatch {
    fn apply(self, state: &mut AppState) {
        if let Some(tasks) = self.tasks {
            state.tasks = tasks;
        }
        if let Some(notes) = self.notes {
            state.notes = notes;
        }
        if let Some(settings) = self.settings {
            state.settings = settings;
        }
        if let Some(windows) = self.windows {
            state.windows = windows;
        }
        if let Some(ai) = self.ai {
            state.ai = ai;
        }
        if let Some(weather) = self.weather {
            state.weather = weather;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
/// Closed set of named transitions accepted by [`StateStore::dispatch`].
///
/// The serde form is the `{ "type": "TASKS_ADD", "payload": ... }` wire shape.
pub enum StoreAction {
    TasksAdd(TaskItem),
    TasksRemove { id: String },
    /// Replaces the task with the same id.
    TasksUpdate(TaskItem),
    TasksToggle { id: String },
    NotesAdd(NoteItem),
    NotesRemove { id: String },
    /// Replaces the note with the same id.
    NotesUpdate(NoteItem),
    SettingsReplace(DesktopSettings),
    WindowsReplace(BTreeMap<String, WindowGeometry>),
    WeatherReplace(Option<WeatherCache>),
    AiAppend(AiMessage),
    AiReplace(AiHistory),
    AiClear,
}

/// Applies `action` to `state`.
///
/// # Errors
///
/// Returns [`StoreError::ItemNotFound`] or [`StoreError::DuplicateItem`] when an item-level action
/// does not match the current list. `state` is unchanged in that case.
pub fn reduce_store(state: &mut AppState, action: StoreAction) -> Result<(), StoreError> {
    match action {
        StoreAction::TasksAdd(task) => {
            if state.tasks.iter().any(|t| t.id == task.id) {
                return Err(duplicate(SliceKey::Tasks, task.id));
            }
            state.tasks.push(task);
        }
        StoreAction::TasksRemove { id } => {
            let index = position(&state.tasks, SliceKey::Tasks, &id, |t| &t.id)?;
            state.tasks.remove(index);
        }
        StoreAction::TasksUpdate(task) => {
            let index = position(&state.tasks, SliceKey::Tasks, &task.id, |t| &t.id)?;
            state.tasks[index] = task;
        }
        StoreAction::TasksToggle { id } => {
            let index = position(&state.tasks, SliceKey::Tasks, &id, |t| &t.id)?;
            let task = &mut state.tasks[index];
            task.completed = !task.completed;
        }
        StoreAction::NotesAdd(note) => {
            if state.notes.iter().any(|n| n.id == note.id) {
                return Err(duplicate(SliceKey::Notes, note.id));
            }
            state.notes.push(note);
        }
        StoreAction::NotesRemove { id } => {
            let index = position(&state.notes, SliceKey::Notes, &id, |n| &n.id)?;
            state.notes.remove(index);
        }
        StoreAction::NotesUpdate(note) => {
            let index = position(&state.notes, SliceKey::Notes, &note.id, |n| &n.id)?;
            state.notes[index] = note;
        }
        StoreAction::SettingsReplace(settings) => state.settings = settings,
        StoreAction::WindowsReplace(windows) => state.windows = windows,
        StoreAction::WeatherReplace(weather) => state.weather = weather,
        StoreAction::AiAppend(message) => state.ai.messages.push(message),
        StoreAction::AiReplace(history) => state.ai = history,
        StoreAction::AiClear => state.ai.messages.clear(),
    }
    Ok(())
}

fn position<T>(
    items: &[T],
    slice: SliceKey,
    id: &str,
    item_id: impl Fn(&T) -> &String,
) -> Result<usize, StoreError> {
    items
        .iter()
        .position(|item| item_id(item) == id)
        .ok_or_else(|| StoreError::ItemNotFound {
            slice,
            id: id.to_string(),
        })
}

fn duplicate(slice: SliceKey, id: String) -> StoreError {
    StoreError::DuplicateItem { slice, id }
}

/// Outcome of one listener call. An `Err` is logged and the remaining listeners still run.
pub type ListenerResult = Result<(), String>;

type StateListener = Rc<dyn Fn(&AppState, &AppState) -> ListenerResult>;

struct StoreInner {
    state: RefCell<Rc<AppState>>,
    listeners: RefCell<Vec<(u64, StateListener)>>,
    next_listener_id: Cell<u64>,
    storage: Option<TieredStorage>,
    snapshot_key: String,
}

#[derive(Clone)]
/// Process-wide desktop state container. Clones share the same state and subscribers.
pub struct StateStore {
    inner: Rc<StoreInner>,
}

impl StateStore {
    /// Creates a store that keeps state in memory only.
    pub fn in_memory(initial: AppState) -> Self {
        Self::build(initial, None, String::new())
    }

    /// Creates a store over `storage`, starting from `initial` without reading the snapshot.
    pub fn with_storage(initial: AppState, storage: TieredStorage, snapshot_key: &str) -> Self {
        Self::build(initial, Some(storage), snapshot_key.to_string())
    }

    /// Loads the snapshot under `snapshot_key` (migrating legacy keys when needed) and returns a
    /// store persisting back to it.
    ///
    /// Overflowed values must already be hydrated; see [`StateStore::boot`].
    pub fn load(storage: TieredStorage, snapshot_key: &str) -> Self {
        let initial = persistence::load_or_migrate(&storage, snapshot_key);
        Self::with_storage(initial, storage, snapshot_key)
    }

    /// Hydrates overflowed values from the large store, then [`StateStore::load`]s.
    pub async fn boot(storage: TieredStorage, snapshot_key: &str) -> Self {
        let hydrated = storage.hydrate_overflow().await;
        if hydrated > 0 {
            logging::log!("hydrated {hydrated} overflowed storage value(s)");
        }
        Self::load(storage, snapshot_key)
    }

    fn build(initial: AppState, storage: Option<TieredStorage>, snapshot_key: String) -> Self {
        Self {
            inner: Rc::new(StoreInner {
                state: RefCell::new(Rc::new(initial)),
                listeners: RefCell::new(Vec::new()),
                next_listener_id: Cell::new(1),
                storage,
                snapshot_key,
            }),
        }
    }

    /// Returns the current state. The snapshot is immutable and survives later mutations.
    pub fn get_state(&self) -> Rc<AppState> {
        self.inner.state.borrow().clone()
    }

    /// Returns a copy of one typed slice.
    pub fn slice<S: Slice>(&self) -> S::Value {
        S::get(&self.inner.state.borrow()).clone()
    }

    /// Returns one slice as JSON, or `None` when `key` names no slice.
    pub fn get_slice(&self, key: &str) -> Option<Value> {
        let key = key.parse::<SliceKey>().ok()?;
        let state = self.get_state();
        match key.read(&state) {
            Ok(value) => Some(value),
            Err(err) => {
                logging::warn!("state read failed: {err}");
                None
            }
        }
    }

    /// Shallow-merges `patch` into the state, persists, and notifies.
    pub fn set_state(&self, patch: StatePatch) {
        let mut next = (*self.get_state()).clone();
        patch.apply(&mut next);
        self.commit(next);
    }

    /// Replaces one typed slice wholesale.
    pub fn update_slice<S: Slice>(&self, value: S::Value) {
        let mut next = (*self.get_state()).clone();
        S::set(&mut next, value);
        self.commit(next);
    }

    /// Replaces the slice named `key` with a JSON value.
    ///
    /// Unknown keys and values that do not decode for the slice are logged and ignored.
    pub fn update_slice_json(&self, key: &str, value: Value) {
        let result = key.parse::<SliceKey>().and_then(|slice| {
            let mut next = (*self.get_state()).clone();
            slice.write(&mut next, value)?;
            Ok(next)
        });
        match result {
            Ok(next) => self.commit(next),
            Err(err) => logging::warn!("update_slice ignored: {err}"),
        }
    }

    /// Applies one [`StoreAction`]. Returns `true` when the state changed.
    ///
    /// Actions that reference a missing item are logged and leave the state untouched without
    /// notifying subscribers.
    pub fn dispatch(&self, action: StoreAction) -> bool {
        let mut next = (*self.get_state()).clone();
        match reduce_store(&mut next, action) {
            Ok(()) => {
                self.commit(next);
                true
            }
            Err(err) => {
                logging::warn!("store action ignored: {err}");
                false
            }
        }
    }

    /// Decodes the `{ "type", "payload" }` wire form and dispatches it.
    pub fn dispatch_json(&self, action: &Value) -> bool {
        match serde_json::from_value::<StoreAction>(action.clone()) {
            Ok(action) => self.dispatch(action),
            Err(err) => {
                let kind = action
                    .get("type")
                    .and_then(Value::as_str)
                    .unwrap_or("<missing>");
                logging::warn!("{}", StoreError::UnknownAction(format!("`{kind}` ({err})")));
                false
            }
        }
    }

    /// Registers `listener` for every mutation. Listeners run synchronously in subscription order
    /// with `(new_state, previous_state)`. A listener reports failure by returning `Err`; the
    /// failure is logged and does not stop later listeners.
    pub fn subscribe(
        &self,
        listener: impl Fn(&AppState, &AppState) -> ListenerResult + 'static,
    ) -> Subscription {
        let id = self.inner.next_listener_id.get();
        self.inner.next_listener_id.set(id + 1);
        self.inner
            .listeners
            .borrow_mut()
            .push((id, Rc::new(listener)));
        Subscription {
            id,
            store: Rc::downgrade(&self.inner),
            detach_on_drop: false,
        }
    }

    /// Number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }

    fn commit(&self, next: AppState) {
        let next = Rc::new(next);
        let previous = self.inner.state.replace(next.clone());
        self.persist(&next);
        self.notify(&next, &previous);
    }

    fn persist(&self, state: &AppState) {
        let Some(storage) = self.inner.storage.as_ref() else {
            return;
        };
        if !persistence::save_snapshot(storage, &self.inner.snapshot_key, state) {
            logging::warn!(
                "state snapshot not persisted; keeping in-memory state for this session"
            );
        }
    }

    fn notify(&self, next: &AppState, previous: &AppState) {
        // Snapshot the list so listeners can subscribe, unsubscribe, or mutate re-entrantly.
        let listeners = self.inner.listeners.borrow().clone();
        for (id, listener) in listeners {
            if !self.is_subscribed(id) {
                continue;
            }
            if let Err(message) = invoke_listener(&listener, next, previous) {
                logging::error!("state listener {id} failed: {message}");
            }
        }
    }

    fn is_subscribed(&self, id: u64) -> bool {
        self.inner
            .listeners
            .borrow()
            .iter()
            .any(|(listener_id, _)| *listener_id == id)
    }
}

// Browser builds abort on panic, so only unwinding targets get the panic backstop.
#[cfg(panic = "unwind")]
fn invoke_listener(listener: &StateListener, next: &AppState, previous: &AppState) -> ListenerResult {
    use std::panic::{catch_unwind, AssertUnwindSafe};

    catch_unwind(AssertUnwindSafe(|| listener(next, previous)))
        .unwrap_or_else(|panic| Err(format!("panicked: {}", panic_message(panic.as_ref()))))
}

#[cfg(not(panic = "unwind"))]
fn invoke_listener(listener: &StateListener, next: &AppState, previous: &AppState) -> ListenerResult {
    listener(next, previous)
}

#[cfg(panic = "unwind")]
fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(text) = panic.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = panic.downcast_ref::<String>() {
        text.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[must_use = "dropping a Subscription keeps the listener registered; call unsubscribe()"]
/// Registration returned by [`StateStore::subscribe`].
pub struct Subscription {
    id: u64,
    store: Weak<StoreInner>,
    detach_on_drop: bool,
}

impl Subscription {
    /// Removes the listener. Safe to call after the store is gone.
    pub fn unsubscribe(&self) {
        if let Some(store) = self.store.upgrade() {
            store
                .listeners
                .borrow_mut()
                .retain(|(listener_id, _)| *listener_id != self.id);
        }
    }

    /// Turns this into a guard that unsubscribes when dropped.
    pub fn unsubscribe_on_drop(mut self) -> Self {
        self.detach_on_drop = true;
        self
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if self.detach_on_drop {
            self.unsubscribe();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use platform_host::AppStateStore;
    use platform_storage::{
        InlineSpawner, KeyValueStore, MemoryAppStateStore, MemoryKeyValueStore, StorageConfig,
    };
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::{
        model::{AiRole, WindowRect},
        slices::{Ai, Settings, Tasks, Windows},
    };

    fn task(id: &str, text: &str) -> TaskItem {
        TaskItem {
            id: id.to_string(),
            text: text.to_string(),
            completed: false,
            created_at_unix_ms: 1,
        }
    }

    fn recording_listener(
        store: &StateStore,
        log: &Rc<RefCell<Vec<String>>>,
        name: &str,
    ) -> Subscription {
        let log = log.clone();
        let name = name.to_string();
        store.subscribe(move |_, _| {
            log.borrow_mut().push(name.clone());
            Ok(())
        })
    }

    fn persistent_store() -> (StateStore, MemoryKeyValueStore) {
        let fast = MemoryKeyValueStore::default();
        let storage = TieredStorage::new(
            Rc::new(fast.clone()),
            Rc::new(MemoryAppStateStore::default()),
            Rc::new(InlineSpawner),
            StorageConfig::default(),
        );
        (
            StateStore::with_storage(AppState::default(), storage, "webtop.state.snapshot"),
            fast,
        )
    }

    #[test]
    fn tasks_add_on_empty_slice_yields_single_task() {
        let store = StateStore::in_memory(AppState::default());
        let added = task("t1", "buy milk");
        assert!(store.dispatch(StoreAction::TasksAdd(added.clone())));
        assert_eq!(store.slice::<Tasks>(), vec![added]);
    }

    #[test]
    fn bogus_action_leaves_state_deep_equal_and_silent() {
        let store = StateStore::in_memory(AppState::default());
        store.dispatch(StoreAction::TasksAdd(task("t1", "a")));
        let before = store.get_state();
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let _sub = store.subscribe(move |_, _| {
            counter.set(counter.get() + 1);
            Ok(())
        });

        assert!(!store.dispatch_json(&json!({"type": "BOGUS"})));
        assert!(!store.dispatch_json(&json!({"type": "TASKS_ADD", "payload": 42})));
        assert!(!store.dispatch_json(&json!({"payload": {}})));

        assert_eq!(*store.get_state(), *before);
        assert!(Rc::ptr_eq(&store.get_state(), &before));
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn dispatch_json_accepts_wire_form() {
        let store = StateStore::in_memory(AppState::default());
        assert!(store.dispatch_json(&json!({
            "type": "TASKS_ADD",
            "payload": {"id": "t1", "text": "water plants"}
        })));
        assert!(store.dispatch_json(&json!({"type": "TASKS_TOGGLE", "payload": {"id": "t1"}})));
        assert!(store.dispatch_json(&json!({
            "type": "AI_APPEND",
            "payload": {"role": "user", "content": "hi"}
        })));
        assert!(store.dispatch_json(&json!({"type": "AI_CLEAR"})));

        let tasks = store.slice::<Tasks>();
        assert_eq!(tasks.len(), 1);
        assert!(tasks[0].completed);
        assert!(store.slice::<Ai>().messages.is_empty());
    }

    #[test]
    fn item_actions_cover_update_remove_and_missing_ids() {
        let mut state = AppState::default();
        reduce_store(&mut state, StoreAction::TasksAdd(task("a", "one"))).expect("add a");
        reduce_store(&mut state, StoreAction::TasksAdd(task("b", "two"))).expect("add b");
        assert!(matches!(
            reduce_store(&mut state, StoreAction::TasksAdd(task("a", "dup"))),
            Err(StoreError::DuplicateItem { .. })
        ));

        reduce_store(&mut state, StoreAction::TasksUpdate(task("b", "TWO"))).expect("update");
        reduce_store(&mut state, StoreAction::TasksRemove { id: "a".into() }).expect("remove");
        assert_eq!(state.tasks, vec![task("b", "TWO")]);

        let before = state.clone();
        assert!(matches!(
            reduce_store(&mut state, StoreAction::TasksToggle { id: "zzz".into() }),
            Err(StoreError::ItemNotFound { slice: SliceKey::Tasks, .. })
        ));
        assert_eq!(state, before);
    }

    #[test]
    fn note_and_replace_actions_apply() {
        let store = StateStore::in_memory(AppState::default());
        let note = NoteItem {
            id: "n1".into(),
            title: "Groceries".into(),
            body: "eggs".into(),
            updated_at_unix_ms: 5,
        };
        store.dispatch(StoreAction::NotesAdd(note.clone()));
        store.dispatch(StoreAction::NotesUpdate(NoteItem {
            body: "eggs, flour".into(),
            ..note
        }));
        assert_eq!(store.get_state().notes[0].body, "eggs, flour");
        store.dispatch(StoreAction::NotesRemove { id: "n1".into() });
        assert!(store.get_state().notes.is_empty());

        let settings = DesktopSettings {
            theme: "dark".into(),
            ..DesktopSettings::default()
        };
        store.dispatch(StoreAction::SettingsReplace(settings.clone()));
        store.dispatch(StoreAction::AiReplace(AiHistory {
            messages: vec![AiMessage {
                role: AiRole::Assistant,
                content: "hello".into(),
                at_unix_ms: 9,
            }],
        }));
        store.dispatch(StoreAction::WeatherReplace(Some(WeatherCache {
            location: "Oslo".into(),
            payload: json!({"temp": -3}),
            fetched_at_unix_ms: 10,
        })));
        let state = store.get_state();
        assert_eq!(state.settings, settings);
        assert_eq!(state.ai.messages.len(), 1);
        assert_eq!(state.weather.as_ref().map(|w| w.location.as_str()), Some("Oslo"));
    }

    #[test]
    fn set_state_produces_new_snapshot_and_keeps_old_one_intact() {
        let store = StateStore::in_memory(AppState::default());
        let before = store.get_state();
        store.set_state(StatePatch {
            tasks: Some(vec![task("t1", "x")]),
            ..StatePatch::default()
        });
        let after = store.get_state();

        assert!(!Rc::ptr_eq(&before, &after));
        assert_ne!(*before, *after);
        assert!(before.tasks.is_empty());
        assert_eq!(after.tasks.len(), 1);
        assert_eq!(after.settings, before.settings);
    }

    #[test]
    fn failing_listener_is_logged_and_later_listeners_still_run_in_order() {
        let store = StateStore::in_memory(AppState::default());
        let log = Rc::new(RefCell::new(Vec::new()));
        let _a = recording_listener(&store, &log, "a");
        let failing_log = log.clone();
        let _failing = store.subscribe(move |_, _| {
            failing_log.borrow_mut().push("b".to_string());
            Err("weather widget offline".to_string())
        });
        let _c = recording_listener(&store, &log, "c");
        let _d = recording_listener(&store, &log, "d");

        store.dispatch(StoreAction::TasksAdd(task("t1", "x")));
        assert_eq!(*log.borrow(), vec!["a", "b", "c", "d"]);
        assert_eq!(store.slice::<Tasks>().len(), 1);

        store.update_slice::<Tasks>(Vec::new());
        assert_eq!(*log.borrow(), vec!["a", "b", "c", "d", "a", "b", "c", "d"]);
    }

    #[cfg(panic = "unwind")]
    #[test]
    fn every_listener_runs_once_in_order_even_when_one_panics() {
        let store = StateStore::in_memory(AppState::default());
        let log = Rc::new(RefCell::new(Vec::new()));
        let _a = recording_listener(&store, &log, "a");
        let _boom = store.subscribe(|_, _| -> ListenerResult { panic!("listener failure") });
        let _c = recording_listener(&store, &log, "c");
        let _d = recording_listener(&store, &log, "d");

        store.set_state(StatePatch {
            notes: Some(Vec::new()),
            ..StatePatch::default()
        });

        assert_eq!(*log.borrow(), vec!["a", "c", "d"]);
        store.update_slice::<Settings>(DesktopSettings::default());
        assert_eq!(log.borrow().len(), 6);
    }

    #[test]
    fn listeners_receive_new_and_previous_state() {
        let store = StateStore::in_memory(AppState::default());
        let seen = Rc::new(RefCell::new(None));
        let sink = seen.clone();
        let _sub = store.subscribe(move |next, previous| {
            *sink.borrow_mut() = Some((next.tasks.len(), previous.tasks.len()));
            Ok(())
        });
        store.dispatch(StoreAction::TasksAdd(task("t1", "x")));
        assert_eq!(*seen.borrow(), Some((1, 0)));
    }

    #[test]
    fn unsubscribe_and_drop_guard_remove_listener() {
        let store = StateStore::in_memory(AppState::default());
        let calls = Rc::new(Cell::new(0));
        let first = {
            let calls = calls.clone();
            store.subscribe(move |_, _| {
                calls.set(calls.get() + 1);
                Ok(())
            })
        };
        {
            let calls = calls.clone();
            let _guard = store
                .subscribe(move |_, _| {
                    calls.set(calls.get() + 10);
                    Ok(())
                })
                .unsubscribe_on_drop();
            assert_eq!(store.subscriber_count(), 2);
        }
        assert_eq!(store.subscriber_count(), 1);

        first.unsubscribe();
        store.update_slice::<Tasks>(vec![task("t1", "x")]);
        assert_eq!(calls.get(), 0);
        assert_eq!(store.subscriber_count(), 0);
    }

    #[test]
    fn listeners_may_reenter_the_store() {
        let store = StateStore::in_memory(AppState::default());
        let reentrant = store.clone();
        let _sub = store.subscribe(move |next, _| {
            if next.tasks.len() == 1 && !next.tasks[0].completed {
                reentrant.dispatch(StoreAction::TasksToggle {
                    id: next.tasks[0].id.clone(),
                });
            }
            Ok(())
        });
        store.dispatch(StoreAction::TasksAdd(task("t1", "x")));
        assert!(store.slice::<Tasks>()[0].completed);
    }

    #[test]
    fn update_slice_json_ignores_unknown_key_and_bad_value() {
        let store = StateStore::in_memory(AppState::default());
        let before = store.get_state();
        store.update_slice_json("bogus", json!([]));
        store.update_slice_json("tasks", json!("not a list"));
        assert!(Rc::ptr_eq(&before, &store.get_state()));

        store.update_slice_json("tasks", json!([{"id": "t1", "text": "x"}]));
        assert_eq!(store.slice::<Tasks>().len(), 1);
    }

    #[test]
    fn get_slice_returns_none_for_unknown_key() {
        let store = StateStore::in_memory(AppState::default());
        assert_eq!(store.get_slice("bogus"), None);
        assert_eq!(store.get_slice("tasks"), Some(json!([])));
    }

    #[test]
    fn every_mutation_persists_the_whole_snapshot() {
        let (store, fast) = persistent_store();
        let mut windows = store.slice::<Windows>();
        windows.insert(
            "calc".into(),
            WindowGeometry::from(WindowRect {
                x: 1,
                y: 2,
                w: 300,
                h: 200,
            }),
        );
        store.update_slice::<Windows>(windows);
        store.dispatch(StoreAction::TasksAdd(task("t1", "x")));

        let raw = fast
            .get_raw("webtop.state.snapshot")
            .expect("raw")
            .expect("snapshot written");
        let envelope: Value = serde_json::from_str(&raw).expect("json");
        assert_eq!(envelope["namespace"], json!("system.desktop"));
        assert_eq!(envelope["payload"]["windows"]["calc"]["x"], json!(1));
        assert_eq!(envelope["payload"]["tasks"][0]["id"], json!("t1"));
    }

    #[test]
    fn quota_failure_reroutes_snapshot_to_large_store() {
        let fast = MemoryKeyValueStore::with_quota(8);
        let large = MemoryAppStateStore::default();
        let storage = TieredStorage::new(
            Rc::new(fast),
            Rc::new(large.clone()),
            Rc::new(InlineSpawner),
            StorageConfig::default(),
        );
        let store = StateStore::with_storage(AppState::default(), storage, "webtop.state.snapshot");
        store.dispatch(StoreAction::TasksAdd(task("t1", "x")));

        assert_eq!(store.slice::<Tasks>().len(), 1);
        let namespaces =
            futures::executor::block_on(large.list_app_state_namespaces()).expect("list");
        assert_eq!(namespaces, vec!["webtop.state.snapshot".to_string()]);
    }

    #[test]
    fn boot_hydrates_snapshot_that_overflowed_to_large_store() {
        let fast = MemoryKeyValueStore::with_quota(8);
        let large = MemoryAppStateStore::default();
        let storage = || {
            TieredStorage::new(
                Rc::new(fast.clone()),
                Rc::new(large.clone()),
                Rc::new(InlineSpawner),
                StorageConfig::default(),
            )
        };
        let store = StateStore::with_storage(AppState::default(), storage(), "webtop.state.snapshot");
        store.dispatch(StoreAction::TasksAdd(task("t1", "x")));

        let booted =
            futures::executor::block_on(StateStore::boot(storage(), "webtop.state.snapshot"));
        assert_eq!(booted.slice::<Tasks>(), vec![task("t1", "x")]);
    }
}
