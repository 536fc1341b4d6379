//! Keyed store: value-oriented API over the two backends.
//!
//! Every operation hands one closure per backend to [`run_with_fallback`].
//! The database path stores values as structured JSON; the flat store path
//! serializes to JSON text on write and parses on read, since the flat store
//! only holds strings.

use std::cell::Cell;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::storage::error::{StoreError, StoreResult};
use crate::storage::fallback::run_with_fallback;
use crate::storage::traits::{Database, FlatStore};

/// Key-value store over a preferred [`Database`] and a fallback [`FlatStore`].
///
/// `V` is any serde-serializable payload; `serde_json::Value` by default.
/// Each call picks its backend independently, so a value written while the
/// database was present is invisible once it disappears, and vice versa.
///
/// There is no locking across calls. Two overlapping `update`s on the flat
/// store race and the last writer wins; on the database they are serialized
/// by its own transactions.
#[derive(Debug, Clone)]
pub struct KeyedStore<D, S, V = Value> {
    db: D,
    flat: S,
    _value: PhantomData<fn() -> V>,
}

impl<D, S, V> KeyedStore<D, S, V>
where
    D: Database,
    S: FlatStore,
    V: Serialize + DeserializeOwned,
{
    /// Create a store over a database partition handle and a flat store.
    pub fn new(db: D, flat: S) -> Self {
        Self {
            db,
            flat,
            _value: PhantomData,
        }
    }

    /// The preferred backend handle.
    pub fn database(&self) -> &D {
        &self.db
    }

    /// The fallback backend.
    pub fn flat_store(&self) -> &S {
        &self.flat
    }

    /// Read the value under `key`. Returns `None` if absent.
    pub async fn get(&self, key: &str) -> StoreResult<Option<V>> {
        run_with_fallback(
            &self.db,
            &self.flat,
            Some(move || self.db_get(key)),
            Some(move || self.flat_get(key)),
        )
        .await
    }

    /// Write `value` under `key`.
    pub async fn set(&self, key: &str, value: &V) -> StoreResult<()> {
        run_with_fallback(
            &self.db,
            &self.flat,
            Some(move || self.db_set(key, value)),
            Some(move || self.flat.set_item(key, &serde_json::to_string(value)?)),
        )
        .await
    }

    /// Replace the value under `key` with `updater(old)` and return it.
    ///
    /// `updater` gets `None` when the key is absent and must return the full
    /// replacement, not a patch.
    pub async fn update<F>(&self, key: &str, updater: F) -> StoreResult<V>
    where
        F: FnOnce(Option<V>) -> V,
    {
        let slot = Cell::new(Some(updater));
        let slot = &slot;

        run_with_fallback(
            &self.db,
            &self.flat,
            Some(move || self.db_update(key, slot)),
            Some(move || {
                let updater = take_updater(slot)?;
                let next = updater(self.flat_get(key)?);
                self.flat.set_item(key, &serde_json::to_string(&next)?)?;
                Ok(next)
            }),
        )
        .await
    }

    /// Remove `key`. Removing an absent key is not an error.
    pub async fn remove(&self, key: &str) -> StoreResult<()> {
        run_with_fallback(
            &self.db,
            &self.flat,
            Some(move || self.db.delete(key)),
            Some(move || self.flat.remove_item(key)),
        )
        .await
    }

    /// Remove everything.
    ///
    /// On the database this clears the partition only. The flat store has no
    /// partitions, so the fallback path wipes every key in it, including keys
    /// written by other stores sharing the same flat store.
    pub async fn clear(&self) -> StoreResult<()> {
        run_with_fallback(
            &self.db,
            &self.flat,
            Some(move || self.db.clear()),
            Some(move || self.flat.clear()),
        )
        .await
    }

    /// All keys, in the backend's order. Empty is a valid answer.
    pub async fn keys(&self) -> StoreResult<Vec<String>> {
        run_with_fallback(
            &self.db,
            &self.flat,
            Some(move || self.db.keys()),
            Some(move || self.flat.keys()),
        )
        .await
    }

    /// All `(key, value)` pairs, in the backend's order.
    ///
    /// From the flat store, a value that isn't valid JSON is taken as a raw
    /// JSON string instead of failing the call. A value that still can't be
    /// decoded as `V` is left out.
    pub async fn entries(&self) -> StoreResult<Vec<(String, V)>> {
        run_with_fallback(
            &self.db,
            &self.flat,
            Some(move || self.db_entries()),
            Some(move || self.flat_entries()),
        )
        .await
    }

    // ========================================================================
    // Database path
    // ========================================================================

    async fn db_get(&self, key: &str) -> StoreResult<Option<V>> {
        match self.db.get(key).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    async fn db_set(&self, key: &str, value: &V) -> StoreResult<()> {
        self.db.set(key, serde_json::to_value(value)?).await
    }

    async fn db_update<F>(&self, key: &str, slot: &Cell<Option<F>>) -> StoreResult<V>
    where
        F: FnOnce(Option<V>) -> V,
    {
        let updater = take_updater(slot)?;
        self.db
            .update(key, |old| {
                let old = old.map(serde_json::from_value::<V>).transpose()?;
                Ok(serde_json::to_value(updater(old))?)
            })
            .await?;

        // Return what was committed, not what the updater produced.
        self.db_get(key)
            .await?
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    async fn db_entries(&self) -> StoreResult<Vec<(String, V)>> {
        let keys = self.db.keys().await?;
        let mut entries = Vec::with_capacity(keys.len());
        for key in keys {
            // Keys removed between listing and reading are skipped.
            if let Some(value) = self.db_get(&key).await? {
                entries.push((key, value));
            }
        }
        Ok(entries)
    }

    // ========================================================================
    // Flat store path
    // ========================================================================

    /// Read and parse a flat store value. Empty strings read as absent.
    fn flat_get(&self, key: &str) -> StoreResult<Option<V>> {
        match self.flat.get_item(key)? {
            Some(raw) if !raw.is_empty() => Ok(Some(serde_json::from_str(&raw)?)),
            _ => Ok(None),
        }
    }

    /// The flat store is shared by the whole origin, so entries that don't
    /// decode as `V` belong to someone else and are skipped.
    fn flat_entries(&self) -> StoreResult<Vec<(String, V)>> {
        let entries = self
            .flat
            .entries()?
            .into_iter()
            .filter_map(|(key, raw)| {
                let value = match serde_json::from_str::<Value>(&raw) {
                    Ok(value) => value,
                    Err(_) => Value::String(raw),
                };
                match serde_json::from_value(value) {
                    Ok(decoded) => Some((key, decoded)),
                    Err(e) => {
                        debug!(key = %key, error = %e, "skipping foreign flat store entry");
                        None
                    }
                }
            })
            .collect();
        Ok(entries)
    }
}

/// Only one of the two branches ever runs, so the updater is taken exactly once.
fn take_updater<F>(slot: &Cell<Option<F>>) -> StoreResult<F> {
    slot.take()
        .ok_or_else(|| StoreError::Backend("updater already consumed".into()))
}
