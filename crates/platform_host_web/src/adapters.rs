use platform_host::{
    AppStateEnvelope, AppStateStore, AppStateStoreFuture, KeyValueStore, MemoryAppStateStore,
    MemoryKeyValueStore, StorageError,
};

use crate::{WebAppStateStore, WebFrameScheduler, WebKeyValueStore, WebTaskSpawner};

#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Compile-time selected host strategy for `platform_host_web` adapters.
pub enum HostStrategy {
    /// Browser-backed adapters (`localStorage` + IndexedDB).
    Browser,
    /// In-memory adapters for hosts without browser storage (headless runs, demos).
    DesktopStub,
}

/// Returns the compile-time selected host strategy for the active build.
pub const fn selected_host_strategy() -> HostStrategy {
    #[cfg(feature = "desktop-host-stub")]
    {
        HostStrategy::DesktopStub
    }

    #[cfg(not(feature = "desktop-host-stub"))]
    {
        HostStrategy::Browser
    }
}

/// Returns the selected host strategy as a stable string token.
pub fn host_strategy_name() -> &'static str {
    match selected_host_strategy() {
        HostStrategy::Browser => "browser",
        HostStrategy::DesktopStub => "desktop-stub",
    }
}

/// Adapter enum that erases the concrete fast key-value backend behind [`KeyValueStore`].
#[derive(Debug, Clone)]
pub enum KeyValueStoreAdapter {
    /// Browser `localStorage`.
    Browser(WebKeyValueStore),
    /// Process-local memory.
    DesktopStub(MemoryKeyValueStore),
}

impl KeyValueStore for KeyValueStoreAdapter {
    fn get_raw(&self, key: &str) -> Result<Option<String>, StorageError> {
        match self {
            Self::Browser(store) => store.get_raw(key),
            Self::DesktopStub(store) => store.get_raw(key),
        }
    }

    fn set_raw(&self, key: &str, raw: &str) -> Result<(), StorageError> {
        match self {
            Self::Browser(store) => store.set_raw(key, raw),
            Self::DesktopStub(store) => store.set_raw(key, raw),
        }
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match self {
            Self::Browser(store) => store.remove(key),
            Self::DesktopStub(store) => store.remove(key),
        }
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        match self {
            Self::Browser(store) => store.keys(),
            Self::DesktopStub(store) => store.keys(),
        }
    }
}

/// Adapter enum that erases the concrete large-value backend behind [`AppStateStore`].
#[derive(Debug, Clone)]
pub enum AppStateStoreAdapter {
    /// Browser IndexedDB.
    Browser(WebAppStateStore),
    /// Process-local memory.
    DesktopStub(MemoryAppStateStore),
}

impl AppStateStore for AppStateStoreAdapter {
    fn load_app_state_envelope<'a>(
        &'a self,
        namespace: &'a str,
    ) -> AppStateStoreFuture<'a, Result<Option<AppStateEnvelope>, StorageError>> {
        match self {
            Self::Browser(store) => store.load_app_state_envelope(namespace),
            Self::DesktopStub(store) => store.load_app_state_envelope(namespace),
        }
    }

    fn save_app_state_envelope<'a>(
        &'a self,
        envelope: &'a AppStateEnvelope,
    ) -> AppStateStoreFuture<'a, Result<(), StorageError>> {
        match self {
            Self::Browser(store) => store.save_app_state_envelope(envelope),
            Self::DesktopStub(store) => store.save_app_state_envelope(envelope),
        }
    }

    fn delete_app_state<'a>(
        &'a self,
        namespace: &'a str,
    ) -> AppStateStoreFuture<'a, Result<(), StorageError>> {
        match self {
            Self::Browser(store) => store.delete_app_state(namespace),
            Self::DesktopStub(store) => store.delete_app_state(namespace),
        }
    }

    fn list_app_state_namespaces<'a>(
        &'a self,
    ) -> AppStateStoreFuture<'a, Result<Vec<String>, StorageError>> {
        match self {
            Self::Browser(store) => store.list_app_state_namespaces(),
            Self::DesktopStub(store) => store.list_app_state_namespaces(),
        }
    }
}

/// Builds the fast key-value store for the selected host strategy.
pub fn key_value_store() -> KeyValueStoreAdapter {
    match selected_host_strategy() {
        HostStrategy::Browser => KeyValueStoreAdapter::Browser(WebKeyValueStore),
        HostStrategy::DesktopStub => {
            KeyValueStoreAdapter::DesktopStub(MemoryKeyValueStore::default())
        }
    }
}

/// Builds the large envelope store for the selected host strategy.
pub fn app_state_store() -> AppStateStoreAdapter {
    match selected_host_strategy() {
        HostStrategy::Browser => AppStateStoreAdapter::Browser(WebAppStateStore),
        HostStrategy::DesktopStub => {
            AppStateStoreAdapter::DesktopStub(MemoryAppStateStore::default())
        }
    }
}

/// Returns the background task spawner for the browser event loop.
pub fn task_spawner() -> WebTaskSpawner {
    WebTaskSpawner
}

/// Returns the animation-frame scheduler for the browser event loop.
pub fn frame_scheduler() -> WebFrameScheduler {
    WebFrameScheduler
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use serde_json::json;

    use super::*;

    #[test]
    fn stub_adapters_delegate_to_memory_backends() {
        let kv = KeyValueStoreAdapter::DesktopStub(MemoryKeyValueStore::default());
        kv.set_raw("k", "1").expect("set");
        assert_eq!(kv.get_raw("k").expect("get"), Some("1".to_string()));
        assert_eq!(kv.keys().expect("keys"), vec!["k".to_string()]);

        let large = AppStateStoreAdapter::DesktopStub(MemoryAppStateStore::default());
        let envelope = AppStateEnvelope::new("k", 1, json!([1, 2, 3]));
        block_on(large.save_app_state_envelope(&envelope)).expect("save");
        assert_eq!(
            block_on(large.load_app_state_envelope("k")).expect("load"),
            Some(envelope)
        );
    }

    #[cfg(not(feature = "desktop-host-stub"))]
    #[test]
    fn default_build_selects_browser_strategy() {
        assert_eq!(selected_host_strategy(), HostStrategy::Browser);
        assert_eq!(host_strategy_name(), "browser");
        assert!(matches!(key_value_store(), KeyValueStoreAdapter::Browser(_)));
        assert!(matches!(app_state_store(), AppStateStoreAdapter::Browser(_)));
    }
}
