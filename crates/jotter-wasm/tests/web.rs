//! Browser tests for the localStorage store and the exported notes API
//! (run with `wasm-pack test --headless --firefox`)

#![cfg(target_arch = "wasm32")]

use jotter_core::storage::FlatStore;
use jotter_core::Note;
use jotter_wasm::{
    create_note, get_note, init_notes, list_notes, remove_note, update_note, LocalStorage,
};
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn test_local_storage_round_trip() {
    let flat = LocalStorage;
    flat.clear().unwrap();

    flat.set_item("a", "1").unwrap();
    flat.set_item("b", r#"{"foo":"bar"}"#).unwrap();

    assert_eq!(flat.get_item("a").unwrap(), Some("1".to_string()));
    assert_eq!(flat.get_item("b").unwrap(), Some(r#"{"foo":"bar"}"#.to_string()));
    assert_eq!(flat.get_item("missing").unwrap(), None);

    let mut keys = flat.keys().unwrap();
    keys.sort();
    assert_eq!(keys, vec!["a", "b"]);

    flat.remove_item("a").unwrap();
    assert_eq!(flat.get_item("a").unwrap(), None);

    flat.clear().unwrap();
    assert!(flat.keys().unwrap().is_empty());
}

#[wasm_bindgen_test]
fn test_local_storage_probe_leaves_no_key() {
    let flat = LocalStorage;

    assert!(flat.is_usable());
    assert_eq!(flat.get_item("__ls_test").unwrap(), None);
}

// The bridge holds one store per page, so the whole flow lives in one test.
#[wasm_bindgen_test]
async fn test_notes_flow_through_exports() {
    assert!(init_notes(Some("{not json".into())).is_err());
    init_notes(Some(r#"{"database":"jotter-test-bridge","log_filter":"debug"}"#.into())).unwrap();
    assert!(init_notes(None).is_err());

    let id = create_note(r#"{"title":"First","text":"hello"}"#.into())
        .await
        .unwrap();

    let json = get_note(id.clone()).await.unwrap().unwrap();
    let note: Note = serde_json::from_str(&json).unwrap();
    assert_eq!(note.title, "First");
    assert_eq!(note.text, "hello");

    let json = update_note(id.clone(), r#"{"text":"edited"}"#.into())
        .await
        .unwrap();
    let note: Note = serde_json::from_str(&json).unwrap();
    assert_eq!(note.title, "First");
    assert_eq!(note.text, "edited");

    let list: Vec<Note> = serde_json::from_str(&list_notes().await.unwrap()).unwrap();
    assert!(list.iter().any(|n| n.id == id));

    remove_note(id.clone()).await.unwrap();
    assert_eq!(get_note(id).await.unwrap(), None);

    assert!(create_note("not json".into()).await.is_err());
}
