//! Notes API tests

use jotter_core::storage::{FlatStore, MemoryDatabase, MemoryFactory, MemoryFlatStore, StoreError};
use jotter_core::{Note, NoteDraft, NotePatch, Notes, StorageConfig};
use pretty_assertions::assert_eq;

fn create_test_notes() -> (MemoryFactory, MemoryFlatStore, Notes<MemoryDatabase, MemoryFlatStore>) {
    let factory = MemoryFactory::new();
    let (db, flat) = StorageConfig::default().memory_backends(&factory);
    let notes = Notes::new(db, flat.clone());
    (factory, flat, notes)
}

fn draft(title: &str, text: &str) -> NoteDraft {
    NoteDraft {
        title: title.into(),
        text: text.into(),
    }
}

fn note_at(id: &str, updated_at: &str) -> Note {
    Note {
        id: id.into(),
        title: id.to_uppercase(),
        text: String::new(),
        updated_at: updated_at.into(),
    }
}

#[tokio::test]
async fn test_create_stores_note_under_new_id() {
    let (_factory, _flat, notes) = create_test_notes();

    let id = notes.create(draft("Test", "Hello")).await.unwrap();

    assert!(uuid::Uuid::parse_str(&id).is_ok());
    let saved = notes.get(&id).await.unwrap().unwrap();
    assert_eq!(saved.id, id);
    assert_eq!(saved.title, "Test");
    assert_eq!(saved.text, "Hello");
    assert!(!saved.updated_at.is_empty());
}

#[tokio::test]
async fn test_create_generates_distinct_ids() {
    let (_factory, _flat, notes) = create_test_notes();

    let a = notes.create(draft("a", "")).await.unwrap();
    let b = notes.create(draft("b", "")).await.unwrap();

    assert_ne!(a, b);
}

#[tokio::test]
async fn test_create_propagates_storage_errors() {
    let (factory, _flat, notes) = create_test_notes();
    factory.fail_next("Storage failure");

    let result = notes.create(draft("x", "")).await;

    assert_eq!(result, Err(StoreError::Backend("Storage failure".into())));
}

#[tokio::test]
async fn test_get_missing_note() {
    let (_factory, _flat, notes) = create_test_notes();
    assert_eq!(notes.get("nope").await.unwrap(), None);
}

#[tokio::test]
async fn test_list_most_recent_first() {
    let (_factory, _flat, notes) = create_test_notes();
    let store = notes.store();
    store
        .set("id1", &note_at("id1", "2024-01-01T00:00:00.000Z"))
        .await
        .unwrap();
    store
        .set("id2", &note_at("id2", "2024-03-01T00:00:00.000Z"))
        .await
        .unwrap();
    store
        .set("id3", &note_at("id3", "2024-02-01T00:00:00.000Z"))
        .await
        .unwrap();

    let ids: Vec<String> = notes.list().await.unwrap().into_iter().map(|n| n.id).collect();

    assert_eq!(ids, vec!["id2", "id3", "id1"]);
}

#[tokio::test]
async fn test_update_applies_patch_and_stamps_time() {
    let (_factory, _flat, notes) = create_test_notes();
    notes
        .store()
        .set("id1", &note_at("id1", "2000-01-01T00:00:00.000Z"))
        .await
        .unwrap();

    let updated = notes
        .update(
            "id1",
            NotePatch {
                text: Some("body".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.title, "ID1");
    assert_eq!(updated.text, "body");
    assert!(updated.updated_at.as_str() > "2000-01-01T00:00:00.000Z");
    assert_eq!(notes.get("id1").await.unwrap(), Some(updated));
}

#[tokio::test]
async fn test_update_missing_note_starts_blank() {
    let (_factory, _flat, notes) = create_test_notes();

    let updated = notes
        .update(
            "fresh",
            NotePatch {
                title: Some("Title".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.id, "fresh");
    assert_eq!(updated.title, "Title");
    assert_eq!(updated.text, "");
}

#[tokio::test]
async fn test_remove() {
    let (_factory, _flat, notes) = create_test_notes();
    let id = notes.create(draft("x", "")).await.unwrap();

    notes.remove(&id).await.unwrap();

    assert_eq!(notes.get(&id).await.unwrap(), None);
    assert!(notes.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_notes_on_flat_store() {
    let (factory, flat, notes) = create_test_notes();
    factory.set_present(false);

    let id = notes.create(draft("Offline", "text")).await.unwrap();

    let raw = flat.get_item(&id).unwrap().unwrap();
    let parsed: Note = serde_json::from_str(&raw).unwrap();
    assert_eq!(parsed.title, "Offline");
    assert!(raw.contains(r#""updatedAt":"#));

    let listed = notes.list().await.unwrap();
    assert_eq!(listed, vec![parsed]);
}

#[tokio::test]
async fn test_list_ignores_other_flat_store_keys() {
    let (factory, flat, notes) = create_test_notes();
    factory.set_present(false);
    let id = notes.create(draft("Offline", "kept")).await.unwrap();
    flat.set_item("theme", "dark").unwrap();
    flat.set_item("settings", r#"{"fontSize":14}"#).unwrap();

    let list = notes.list().await.unwrap();

    assert_eq!(list.len(), 1);
    assert_eq!(list[0].id, id);
    assert_eq!(list[0].title, "Offline");
}
