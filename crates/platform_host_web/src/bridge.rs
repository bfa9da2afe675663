//! IndexedDB bridge for the envelope store.
//!
//! The `wasm32` implementation talks to IndexedDB through a small inline JS shim; other targets
//! get an in-process fallback so the public API behaves identically in host tests.

use platform_host::{AppStateEnvelope, StorageError};

#[cfg(target_arch = "wasm32")]
mod imp {
    use super::*;
    use js_sys::Promise;
    use serde::de::DeserializeOwned;
    use serde::Serialize;
    use serde_wasm_bindgen::{from_value, Serializer};
    use wasm_bindgen::prelude::*;
    use wasm_bindgen_futures::JsFuture;

    #[wasm_bindgen(inline_js = r#"
const DB_NAME = 'webtop';
const DB_VERSION = 1;
const APP_STATE_STORE = 'app_state';

function requestToPromise(req) {
  return new Promise((resolve, reject) => {
    req.onsuccess = () => resolve(req.result);
    req.onerror = () => reject(req.error || new Error('IndexedDB request failed'));
  });
}

function txDone(tx) {
  return new Promise((resolve, reject) => {
    tx.oncomplete = () => resolve();
    tx.onabort = () => reject(tx.error || new Error('IndexedDB transaction aborted'));
    tx.onerror = () => reject(tx.error || new Error('IndexedDB transaction error'));
  });
}

let dbPromise = null;

function openDb() {
  if (typeof indexedDB === 'undefined') {
    return Promise.reject(new Error('IndexedDB is unavailable in this browser context'));
  }
  if (dbPromise === null) {
    dbPromise = new Promise((resolve, reject) => {
      const req = indexedDB.open(DB_NAME, DB_VERSION);
      req.onupgradeneeded = () => {
        const db = req.result;
        if (!db.objectStoreNames.contains(APP_STATE_STORE)) {
          db.createObjectStore(APP_STATE_STORE, { keyPath: 'namespace' });
        }
      };
      req.onsuccess = () => resolve(req.result);
      req.onerror = () => {
        dbPromise = null;
        reject(req.error || new Error('Failed to open IndexedDB'));
      };
    });
  }
  return dbPromise;
}

async function withStore(mode, fn) {
  const db = await openDb();
  const tx = db.transaction(APP_STATE_STORE, mode);
  const result = await fn(tx.objectStore(APP_STATE_STORE));
  await txDone(tx);
  return result;
}

export async function jsAppStateLoad(namespace) {
  const record = await withStore('readonly', (store) => requestToPromise(store.get(namespace)));
  return record === undefined ? null : record;
}

export async function jsAppStateSave(envelope) {
  await withStore('readwrite', (store) => requestToPromise(store.put(envelope)));
  return null;
}

export async function jsAppStateDelete(namespace) {
  await withStore('readwrite', (store) => requestToPromise(store.delete(namespace)));
  return null;
}

export async function jsAppStateNamespaces() {
  const keys = await withStore('readonly', (store) => requestToPromise(store.getAllKeys()));
  return keys.map((key) => String(key)).sort();
}
"#)]
    extern "C" {
        #[wasm_bindgen(js_name = jsAppStateLoad)]
        fn js_app_state_load(namespace: &str) -> Promise;
        #[wasm_bindgen(js_name = jsAppStateSave)]
        fn js_app_state_save(envelope: JsValue) -> Promise;
        #[wasm_bindgen(js_name = jsAppStateDelete)]
        fn js_app_state_delete(namespace: &str) -> Promise;
        #[wasm_bindgen(js_name = jsAppStateNamespaces)]
        fn js_app_state_namespaces() -> Promise;
    }

    async fn await_promise(promise: Promise) -> Result<JsValue, StorageError> {
        JsFuture::from(promise).await.map_err(js_error)
    }

    fn js_error(err: JsValue) -> StorageError {
        if let Some(text) = err.as_string() {
            return StorageError::Backend(text);
        }
        if let Ok(name) = js_sys::Reflect::get(&err, &JsValue::from_str("name")) {
            if name.as_string().as_deref() == Some("QuotaExceededError") {
                return StorageError::QuotaExceeded;
            }
        }
        if let Ok(message) = js_sys::Reflect::get(&err, &JsValue::from_str("message")) {
            if let Some(text) = message.as_string() {
                return StorageError::Backend(text);
            }
        }
        StorageError::Backend(format!("{err:?}"))
    }

    async fn promise_to_json<T: DeserializeOwned>(promise: Promise) -> Result<T, StorageError> {
        let value = await_promise(promise).await?;
        from_value(value).map_err(|e| StorageError::Serialize(e.to_string()))
    }

    async fn promise_to_optional_json<T: DeserializeOwned>(
        promise: Promise,
    ) -> Result<Option<T>, StorageError> {
        let value = await_promise(promise).await?;
        if value.is_null() || value.is_undefined() {
            Ok(None)
        } else {
            from_value(value)
                .map(Some)
                .map_err(|e| StorageError::Serialize(e.to_string()))
        }
    }

    pub async fn load_app_state_envelope(
        namespace: &str,
    ) -> Result<Option<AppStateEnvelope>, StorageError> {
        promise_to_optional_json(js_app_state_load(namespace)).await
    }

    pub async fn save_app_state_envelope(envelope: &AppStateEnvelope) -> Result<(), StorageError> {
        let value = envelope
            .serialize(&Serializer::json_compatible())
            .map_err(|e| StorageError::Serialize(e.to_string()))?;
        let _ = await_promise(js_app_state_save(value)).await?;
        Ok(())
    }

    pub async fn delete_app_state(namespace: &str) -> Result<(), StorageError> {
        let _ = await_promise(js_app_state_delete(namespace)).await?;
        Ok(())
    }

    pub async fn list_app_state_namespaces() -> Result<Vec<String>, StorageError> {
        promise_to_json(js_app_state_namespaces()).await
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod imp {
    use super::*;
    use platform_host::{AppStateStore, MemoryAppStateStore};

    thread_local! {
        static FALLBACK: MemoryAppStateStore = MemoryAppStateStore::default();
    }

    fn fallback() -> MemoryAppStateStore {
        FALLBACK.with(|store| store.clone())
    }

    pub async fn load_app_state_envelope(
        namespace: &str,
    ) -> Result<Option<AppStateEnvelope>, StorageError> {
        fallback().load_app_state_envelope(namespace).await
    }

    pub async fn save_app_state_envelope(envelope: &AppStateEnvelope) -> Result<(), StorageError> {
        fallback().save_app_state_envelope(envelope).await
    }

    pub async fn delete_app_state(namespace: &str) -> Result<(), StorageError> {
        fallback().delete_app_state(namespace).await
    }

    pub async fn list_app_state_namespaces() -> Result<Vec<String>, StorageError> {
        fallback().list_app_state_namespaces().await
    }
}

pub async fn load_app_state_envelope(
    namespace: &str,
) -> Result<Option<AppStateEnvelope>, StorageError> {
    imp::load_app_state_envelope(namespace).await
}

pub async fn save_app_state_envelope(envelope: &AppStateEnvelope) -> Result<(), StorageError> {
    imp::save_app_state_envelope(envelope).await
}

pub async fn delete_app_state(namespace: &str) -> Result<(), StorageError> {
    imp::delete_app_state(namespace).await
}

pub async fn list_app_state_namespaces() -> Result<Vec<String>, StorageError> {
    imp::list_app_state_namespaces().await
}
