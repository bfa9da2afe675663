//! `localStorage`-backed key-value store implementation.
//!
//! The browser API is synchronous, so this adapter maps directly onto
//! [`platform_host::KeyValueStore`]. Quota failures surface as
//! [`StorageError::QuotaExceeded`] so the tiered storage layer can reroute the write.

use platform_host::{KeyValueStore, StorageError};

#[derive(Debug, Clone, Copy, Default)]
/// Browser key-value store backed by `window.localStorage`.
pub struct WebKeyValueStore;

#[cfg(target_arch = "wasm32")]
fn local_storage() -> Result<web_sys::Storage, StorageError> {
    web_sys::window()
        .and_then(|w| w.local_storage().ok().flatten())
        .ok_or_else(|| StorageError::Unavailable("localStorage unavailable".to_string()))
}

#[cfg(target_arch = "wasm32")]
fn map_js_error(op: &str, err: wasm_bindgen::JsValue) -> StorageError {
    use wasm_bindgen::JsCast;

    if let Some(dom) = err.dyn_ref::<web_sys::DomException>() {
        // Firefox reports NS_ERROR_DOM_QUOTA_REACHED, everything else uses the standard name.
        let name = dom.name();
        if name == "QuotaExceededError" || name == "NS_ERROR_DOM_QUOTA_REACHED" || dom.code() == 22
        {
            return StorageError::QuotaExceeded;
        }
        return StorageError::Backend(format!("localStorage {op} failed: {name}"));
    }
    StorageError::Backend(format!("localStorage {op} failed: {err:?}"))
}

impl KeyValueStore for WebKeyValueStore {
    fn get_raw(&self, key: &str) -> Result<Option<String>, StorageError> {
        #[cfg(target_arch = "wasm32")]
        {
            local_storage()?
                .get_item(key)
                .map_err(|err| map_js_error("get_item", err))
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = key;
            Ok(None)
        }
    }

    fn set_raw(&self, key: &str, raw: &str) -> Result<(), StorageError> {
        #[cfg(target_arch = "wasm32")]
        {
            local_storage()?
                .set_item(key, raw)
                .map_err(|err| map_js_error("set_item", err))
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = (key, raw);
            Ok(())
        }
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        #[cfg(target_arch = "wasm32")]
        {
            local_storage()?
                .remove_item(key)
                .map_err(|err| map_js_error("remove_item", err))
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = key;
            Ok(())
        }
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        #[cfg(target_arch = "wasm32")]
        {
            let storage = local_storage()?;
            let len = storage
                .length()
                .map_err(|err| map_js_error("length", err))?;
            let mut keys = Vec::with_capacity(len as usize);
            for index in 0..len {
                if let Some(key) = storage
                    .key(index)
                    .map_err(|err| map_js_error("key", err))?
                {
                    keys.push(key);
                }
            }
            keys.sort();
            Ok(keys)
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            Ok(Vec::new())
        }
    }
}
