//! Storage trait definitions

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::storage::error::StoreResult;

/// Key written and removed by [`FlatStore::is_usable`].
pub const PROBE_KEY: &str = "__ls_test";

/// Named partition of the preferred database: a database plus an object
/// store inside it, e.g. `("notes", "notes")`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Partition {
    pub database: String,
    pub store: String,
}

impl Partition {
    pub fn new(database: impl Into<String>, store: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            store: store.into(),
        }
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.database, self.store)
    }
}

/// Preferred backend: an asynchronous, transactional key-value database.
///
/// A handle is bound to one [`Partition`] and is created once per process.
/// Creating it must not touch the backend; connections are opened lazily.
/// Values are structured (`serde_json::Value`) and stored as-is.
///
/// Browsers run everything on one thread, so the futures returned here are
/// not required to be `Send`.
#[allow(async_fn_in_trait)]
pub trait Database {
    /// Whether the global database handle exists at all.
    ///
    /// This is an existence check, not a capability probe: a present but
    /// broken database still reports `true`, and its failures surface from
    /// the operation itself.
    fn is_present(&self) -> bool;

    /// Read the value under `key`. Returns `None` if absent.
    async fn get(&self, key: &str) -> StoreResult<Option<Value>>;

    /// Write `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: Value) -> StoreResult<()>;

    /// Read-modify-write `key` inside a single readwrite transaction.
    ///
    /// `updater` receives the current value (`None` if absent) and returns
    /// the full replacement. An updater error aborts the write.
    async fn update<F>(&self, key: &str, updater: F) -> StoreResult<()>
    where
        F: FnOnce(Option<Value>) -> StoreResult<Value>;

    /// Remove `key`. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> StoreResult<()>;

    /// Remove every key in the partition.
    async fn clear(&self) -> StoreResult<()>;

    /// All keys in the partition, coerced to strings, in backend order.
    async fn keys(&self) -> StoreResult<Vec<String>>;
}

/// Fallback backend: a synchronous, origin-wide flat string store with a
/// capacity ceiling. It has no notion of partitions.
pub trait FlatStore {
    /// Read the raw string under `key`. Returns `None` if absent.
    fn get_item(&self, key: &str) -> StoreResult<Option<String>>;

    /// Write `value` under `key`, replacing any previous value.
    fn set_item(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Remove `key`. Removing an absent key is not an error.
    fn remove_item(&self, key: &str) -> StoreResult<()>;

    /// Remove every key in the store.
    fn clear(&self) -> StoreResult<()>;

    /// All keys, in the store's own iteration order.
    fn keys(&self) -> StoreResult<Vec<String>>;

    /// All `(key, raw value)` pairs, in the store's own iteration order.
    fn entries(&self) -> StoreResult<Vec<(String, String)>> {
        let mut entries = Vec::new();
        for key in self.keys()? {
            if let Some(value) = self.get_item(&key)? {
                entries.push((key, value));
            }
        }
        Ok(entries)
    }

    /// Probe usability with a throwaway write and delete of [`PROBE_KEY`].
    ///
    /// Any error (quota, disabled storage, security restriction) means the
    /// store is unusable for this call.
    fn is_usable(&self) -> bool {
        self.set_item(PROBE_KEY, "1")
            .and_then(|()| self.remove_item(PROBE_KEY))
            .is_ok()
    }
}
