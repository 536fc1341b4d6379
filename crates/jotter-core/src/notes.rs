//! Notes API
//!
//! Note CRUD on top of a [`KeyedStore`]: identifiers are generated here, each
//! note is stored whole under its id, and every edit stamps `updatedAt`.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::storage::{Database, FlatStore, KeyedStore, StoreResult};

/// A stored note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub title: String,
    pub text: String,
    /// RFC 3339 timestamp of the last edit.
    pub updated_at: String,
}

impl Note {
    /// Blank note used when an update targets an id with nothing stored.
    fn blank(id: &str) -> Self {
        Self {
            id: id.to_string(),
            title: String::new(),
            text: String::new(),
            updated_at: String::new(),
        }
    }
}

/// Fields supplied when creating a note.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoteDraft {
    pub title: String,
    pub text: String,
}

/// Partial edit; `None` fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotePatch {
    pub title: Option<String>,
    pub text: Option<String>,
}

impl NotePatch {
    fn apply(self, note: &mut Note) {
        if let Some(title) = self.title {
            note.title = title;
        }
        if let Some(text) = self.text {
            note.text = text;
        }
    }
}

/// Notes stored in one partition.
#[derive(Debug, Clone)]
pub struct Notes<D, S> {
    store: KeyedStore<D, S, Note>,
}

impl<D: Database, S: FlatStore> Notes<D, S> {
    pub fn new(db: D, flat: S) -> Self {
        Self {
            store: KeyedStore::new(db, flat),
        }
    }

    /// The underlying keyed store.
    pub fn store(&self) -> &KeyedStore<D, S, Note> {
        &self.store
    }

    /// Store a new note and return its generated id.
    pub async fn create(&self, draft: NoteDraft) -> StoreResult<String> {
        let id = Uuid::new_v4().to_string();
        let note = Note {
            id: id.clone(),
            title: draft.title,
            text: draft.text,
            updated_at: now(),
        };
        self.store.set(&id, &note).await?;
        tracing::debug!(id = %id, "note created");
        Ok(id)
    }

    pub async fn get(&self, id: &str) -> StoreResult<Option<Note>> {
        self.store.get(id).await
    }

    /// All notes, most recently edited first.
    pub async fn list(&self) -> StoreResult<Vec<Note>> {
        let mut notes: Vec<Note> = self
            .store
            .entries()
            .await?
            .into_iter()
            .map(|(_, note)| note)
            .collect();
        notes.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(notes)
    }

    /// Apply `patch` and stamp `updated_at`. An id with nothing stored starts
    /// from a blank note.
    pub async fn update(&self, id: &str, patch: NotePatch) -> StoreResult<Note> {
        let stamp = now();
        self.store
            .update(id, move |old| {
                let mut note = old.unwrap_or_else(|| Note::blank(id));
                patch.apply(&mut note);
                note.updated_at = stamp;
                note
            })
            .await
    }

    pub async fn remove(&self, id: &str) -> StoreResult<()> {
        self.store.remove(id).await
    }
}

/// Current time in the same shape as JavaScript's `Date.toISOString()`.
fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
