//! Jotter WASM bridge
//!
//! Exposes the notes API to the browser UI through wasm-bindgen. Notes are
//! kept in IndexedDB when the page has it and in `localStorage` otherwise;
//! the choice is made per call by `jotter-core`.
//!
//! Values cross the JS boundary as JSON strings matching the `Note` wire
//! shape: `{"id","title","text","updatedAt"}`.
//!
//! Failures are reported through `jotter_core::report` with a context line
//! and rejected to JS with the error's message, so the UI can match on
//! `"No IndexedDB and no localStorage."` directly.

pub mod console;
pub mod local_storage;

use std::cell::RefCell;
use std::fmt::Display;
use std::rc::Rc;

use jotter_core::{report, NoteDraft, NotePatch, Notes, StorageConfig};
use jotter_indexeddb::IndexedDbStore;
use wasm_bindgen::prelude::*;

pub use local_storage::LocalStorage;

type BrowserNotes = Notes<IndexedDbStore, LocalStorage>;

// WASM is single-threaded; the handle is shared across async boundaries via Rc.
thread_local! {
    static NOTES: RefCell<Option<Rc<BrowserNotes>>> = const { RefCell::new(None) };
}

/// Set up logging and the notes store. Must be called once before any other export.
///
/// `config_json` is an optional `StorageConfig` as JSON; missing fields take
/// their defaults.
#[wasm_bindgen]
pub fn init_notes(config_json: Option<String>) -> Result<(), JsValue> {
    // Route Rust panics to console.error instead of "RuntimeError: unreachable"
    console_error_panic_hook::set_once();

    let config = match config_json.as_deref().map(StorageConfig::from_json).transpose() {
        Ok(config) => config.unwrap_or_default(),
        Err(e) => {
            // No filter to honor yet; log with the default one so the report is seen.
            console::init_with_filter(&StorageConfig::default().log_filter);
            report::on_error(&e, "Invalid storage config");
            return Err(JsValue::from_str(&e.to_string()));
        }
    };
    console::init_with_filter(&config.log_filter);

    let notes = Notes::new(IndexedDbStore::new(config.partition()), LocalStorage);

    NOTES.with(|slot| {
        let mut slot = slot.borrow_mut();
        if slot.is_some() {
            return Err(JsValue::from_str("Notes already initialized"));
        }
        *slot = Some(Rc::new(notes));
        tracing::info!(partition = %config.partition(), "notes store ready");
        Ok(())
    })
}

fn notes() -> Result<Rc<BrowserNotes>, JsValue> {
    NOTES.with(|slot| {
        slot.borrow()
            .clone()
            .ok_or_else(|| JsValue::from_str("Notes not initialized. Call init_notes() first."))
    })
}

/// Report an error with `context` and turn it into a JS rejection value.
fn to_js<E: Display>(context: &'static str) -> impl Fn(E) -> JsValue {
    move |error| {
        report::on_error(&error, context);
        JsValue::from_str(&error.to_string())
    }
}

/// Create a note from `{"title","text"}` JSON. Resolves to the new id.
#[wasm_bindgen]
pub async fn create_note(draft_json: String) -> Result<String, JsValue> {
    let draft: NoteDraft =
        serde_json::from_str(&draft_json).map_err(to_js("Invalid note draft"))?;
    notes()?
        .create(draft)
        .await
        .map_err(to_js("Failed to create note"))
}

/// Resolves to the note as JSON, or `undefined` if there is none.
#[wasm_bindgen]
pub async fn get_note(id: String) -> Result<Option<String>, JsValue> {
    let note = notes()?
        .get(&id)
        .await
        .map_err(to_js("Failed to load note"))?;
    note.map(|n| serde_json::to_string(&n))
        .transpose()
        .map_err(to_js("Failed to encode note"))
}

/// Resolves to a JSON array of notes, most recently edited first.
#[wasm_bindgen]
pub async fn list_notes() -> Result<String, JsValue> {
    let list = notes()?
        .list()
        .await
        .map_err(to_js("Failed to load notes"))?;
    serde_json::to_string(&list).map_err(to_js("Failed to encode notes"))
}

/// Apply a `{"title"?, "text"?}` JSON patch. Resolves to the updated note as JSON.
#[wasm_bindgen]
pub async fn update_note(id: String, patch_json: String) -> Result<String, JsValue> {
    let patch: NotePatch =
        serde_json::from_str(&patch_json).map_err(to_js("Invalid note patch"))?;
    let note = notes()?
        .update(&id, patch)
        .await
        .map_err(to_js("Failed to update note"))?;
    serde_json::to_string(&note).map_err(to_js("Failed to encode note"))
}

#[wasm_bindgen]
pub async fn remove_note(id: String) -> Result<(), JsValue> {
    notes()?
        .remove(&id)
        .await
        .map_err(to_js("Failed to delete note"))
}
