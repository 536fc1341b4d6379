//! In-memory storage backends
//!
//! HashMap-style implementations of both backend seams, for testing and for
//! native callers that don't need persistence. Both handles are cheap to clone
//! and clones share state, so a test can keep one handle to flip switches
//! while the store under test holds another.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;

use crate::storage::error::{StoreError, StoreResult};
use crate::storage::traits::{Database, FlatStore, Partition};

/// Default flat store capacity, matching the usual browser `localStorage` ceiling.
pub const DEFAULT_FLAT_QUOTA: usize = 5 * 1024 * 1024;

// ============================================================================
// Preferred backend
// ============================================================================

#[derive(Debug)]
struct FactoryState {
    present: bool,
    failure: Option<String>,
    partitions: HashMap<Partition, BTreeMap<String, Value>>,
}

/// In-memory stand-in for the global database factory.
///
/// Owns every partition. Flipping [`set_present`](Self::set_present) to
/// `false` simulates the global handle being missing; every
/// [`MemoryDatabase`] created from this factory then reports absent.
#[derive(Debug, Clone)]
pub struct MemoryFactory {
    state: Arc<Mutex<FactoryState>>,
}

impl Default for MemoryFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFactory {
    /// Create a present factory with no partitions.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(FactoryState {
                present: true,
                failure: None,
                partitions: HashMap::new(),
            })),
        }
    }

    /// Make the global handle appear or disappear.
    pub fn set_present(&self, present: bool) {
        self.state.lock().present = present;
    }

    /// Fail the next operation on any partition with `StoreError::Backend(message)`.
    pub fn fail_next(&self, message: impl Into<String>) {
        self.state.lock().failure = Some(message.into());
    }

    /// Create a handle to the `(database, store)` partition.
    ///
    /// The partition itself materializes on first write.
    pub fn create_store(&self, database: &str, store: &str) -> MemoryDatabase {
        MemoryDatabase {
            state: self.state.clone(),
            partition: Partition::new(database, store),
        }
    }
}

/// In-memory [`Database`] handle bound to one partition.
///
/// Keys iterate in sorted order, like IndexedDB key cursors.
#[derive(Debug, Clone)]
pub struct MemoryDatabase {
    state: Arc<Mutex<FactoryState>>,
    partition: Partition,
}

impl MemoryDatabase {
    /// The partition this handle is bound to.
    pub fn partition(&self) -> &Partition {
        &self.partition
    }

    /// Run `f` against this partition's map, honoring a pending injected failure.
    fn with_partition<T>(
        &self,
        f: impl FnOnce(&mut BTreeMap<String, Value>) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let mut state = self.state.lock();
        if let Some(message) = state.failure.take() {
            return Err(StoreError::Backend(message));
        }
        let map = state.partitions.entry(self.partition.clone()).or_default();
        f(map)
    }
}

impl Database for MemoryDatabase {
    fn is_present(&self) -> bool {
        self.state.lock().present
    }

    async fn get(&self, key: &str) -> StoreResult<Option<Value>> {
        self.with_partition(|map| Ok(map.get(key).cloned()))
    }

    async fn set(&self, key: &str, value: Value) -> StoreResult<()> {
        self.with_partition(|map| {
            map.insert(key.to_string(), value);
            Ok(())
        })
    }

    async fn update<F>(&self, key: &str, updater: F) -> StoreResult<()>
    where
        F: FnOnce(Option<Value>) -> StoreResult<Value>,
    {
        // The updater runs with the lock released so it may use the factory.
        // Callers are single-threaded, so nothing interleaves between the
        // read and the write.
        let current = self.with_partition(|map| Ok(map.get(key).cloned()))?;
        let next = updater(current)?;
        self.with_partition(|map| {
            map.insert(key.to_string(), next);
            Ok(())
        })
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.with_partition(|map| {
            map.remove(key);
            Ok(())
        })
    }

    async fn clear(&self) -> StoreResult<()> {
        self.with_partition(|map| {
            map.clear();
            Ok(())
        })
    }

    async fn keys(&self) -> StoreResult<Vec<String>> {
        self.with_partition(|map| Ok(map.keys().cloned().collect()))
    }
}

// ============================================================================
// Fallback backend
// ============================================================================

#[derive(Debug)]
struct FlatState {
    entries: Vec<(String, String)>,
    quota: usize,
    disabled: bool,
}

impl FlatState {
    fn usage(&self) -> usize {
        self.entries.iter().map(|(k, v)| k.len() + v.len()).sum()
    }

    fn check_enabled(&self) -> StoreResult<()> {
        if self.disabled {
            return Err(StoreError::Unavailable("flat storage is disabled".into()));
        }
        Ok(())
    }
}

/// In-memory [`FlatStore`] with a byte quota.
///
/// Keys iterate in insertion order; overwriting a key keeps its position.
/// Usage is the sum of key and value lengths in bytes.
#[derive(Debug, Clone)]
pub struct MemoryFlatStore {
    state: Arc<Mutex<FlatState>>,
}

impl Default for MemoryFlatStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFlatStore {
    /// Create an empty store with [`DEFAULT_FLAT_QUOTA`].
    pub fn new() -> Self {
        Self::with_quota(DEFAULT_FLAT_QUOTA)
    }

    /// Create an empty store holding at most `quota` bytes.
    pub fn with_quota(quota: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(FlatState {
                entries: Vec::new(),
                quota,
                disabled: false,
            })),
        }
    }

    /// Make every operation fail, as a browser does with storage disabled.
    pub fn set_disabled(&self, disabled: bool) {
        self.state.lock().disabled = disabled;
    }

    /// Bytes currently in use.
    pub fn usage(&self) -> usize {
        self.state.lock().usage()
    }
}

impl FlatStore for MemoryFlatStore {
    fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        let state = self.state.lock();
        state.check_enabled()?;
        Ok(state
            .entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone()))
    }

    fn set_item(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut state = self.state.lock();
        state.check_enabled()?;

        let existing = state.entries.iter().position(|(k, _)| k == key);
        let freed = existing.map_or(0, |i| key.len() + state.entries[i].1.len());
        let used = state.usage() - freed + key.len() + value.len();
        if used > state.quota {
            return Err(StoreError::QuotaExceeded {
                used,
                limit: state.quota,
            });
        }

        match existing {
            Some(i) => state.entries[i].1 = value.to_string(),
            None => state.entries.push((key.to_string(), value.to_string())),
        }
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StoreResult<()> {
        let mut state = self.state.lock();
        state.check_enabled()?;
        state.entries.retain(|(k, _)| k != key);
        Ok(())
    }

    fn clear(&self) -> StoreResult<()> {
        let mut state = self.state.lock();
        state.check_enabled()?;
        state.entries.clear();
        Ok(())
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        let state = self.state.lock();
        state.check_enabled()?;
        Ok(state.entries.iter().map(|(k, _)| k.clone()).collect())
    }

    fn entries(&self) -> StoreResult<Vec<(String, String)>> {
        let state = self.state.lock();
        state.check_enabled()?;
        Ok(state.entries.clone())
    }
}
