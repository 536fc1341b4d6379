//! `window.localStorage` as the fallback flat store.

use jotter_core::storage::{FlatStore, StoreError, StoreResult};
use wasm_bindgen::JsValue;

/// Origin-wide `localStorage`.
///
/// Stateless: the storage object is looked up on every call, so a page that
/// gains or loses storage access mid-session is picked up immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorage;

impl LocalStorage {
    fn storage() -> StoreResult<web_sys::Storage> {
        let window = web_sys::window()
            .ok_or_else(|| StoreError::Unavailable("no window (not on the main thread)".into()))?;
        window
            .local_storage()
            .map_err(|e| StoreError::Unavailable(js_message(&e)))?
            .ok_or_else(|| StoreError::Unavailable("localStorage is null".into()))
    }
}

impl FlatStore for LocalStorage {
    fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        Self::storage()?.get_item(key).map_err(backend_error)
    }

    fn set_item(&self, key: &str, value: &str) -> StoreResult<()> {
        Self::storage()?.set_item(key, value).map_err(backend_error)
    }

    fn remove_item(&self, key: &str) -> StoreResult<()> {
        Self::storage()?.remove_item(key).map_err(backend_error)
    }

    fn clear(&self) -> StoreResult<()> {
        Self::storage()?.clear().map_err(backend_error)
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        let storage = Self::storage()?;
        let len = storage.length().map_err(backend_error)?;
        let mut keys = Vec::with_capacity(len as usize);
        for i in 0..len {
            if let Some(key) = storage.key(i).map_err(backend_error)? {
                keys.push(key);
            }
        }
        Ok(keys)
    }
}

/// Best-effort message from a thrown JS value (usually a `DOMException`).
fn js_message(err: &JsValue) -> String {
    use wasm_bindgen::JsCast;

    if let Some(exception) = err.dyn_ref::<web_sys::DomException>() {
        return format!("{}: {}", exception.name(), exception.message());
    }
    err.as_string().unwrap_or_else(|| format!("{:?}", err))
}

fn backend_error(err: JsValue) -> StoreError {
    StoreError::Backend(format!("localStorage: {}", js_message(&err)))
}
