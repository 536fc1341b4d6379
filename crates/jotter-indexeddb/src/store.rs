//! IndexedDB implementation of the preferred storage backend.

use std::cell::RefCell;
use std::rc::Rc;

use jotter_core::storage::{Database, Partition, StoreResult};
use serde_json::Value;
use wasm_bindgen::prelude::*;
use web_sys::{IdbDatabase, IdbTransactionMode};

use crate::error::IndexedDbError;
use crate::idb;

/// Handle to one IndexedDB partition (database + object store).
///
/// Cheap to clone; clones share the connection. The connection is opened on
/// first use and kept for the life of the page, so creating a handle works
/// even where IndexedDB is missing. Whether it is usable is decided per call
/// by [`Database::is_present`].
#[derive(Debug, Clone)]
pub struct IndexedDbStore {
    partition: Partition,
    db: Rc<RefCell<Option<IdbDatabase>>>,
}

impl IndexedDbStore {
    /// Create a handle for the `(database, store)` partition.
    pub fn create_store(database: &str, store: &str) -> Self {
        Self::new(Partition::new(database, store))
    }

    pub fn new(partition: Partition) -> Self {
        Self {
            partition,
            db: Rc::new(RefCell::new(None)),
        }
    }

    pub fn partition(&self) -> &Partition {
        &self.partition
    }

    /// Close the cached connection, if any. The next call reopens it.
    pub fn close(&self) {
        if let Some(db) = self.db.borrow_mut().take() {
            db.close();
        }
    }

    /// Delete the database (for testing/cleanup).
    pub async fn delete_database(db_name: &str) -> crate::Result<()> {
        idb::delete_database(db_name).await
    }

    /// The open connection, opening it on first use.
    async fn connection(&self) -> StoreResult<IdbDatabase> {
        let cached = self.db.borrow().clone();
        if let Some(db) = cached {
            return Ok(db);
        }
        let db = idb::open_database(&self.partition).await?;

        // Another call may have opened a connection while this one was pending.
        let mut slot = self.db.borrow_mut();
        if let Some(existing) = slot.as_ref() {
            db.close();
            return Ok(existing.clone());
        }
        *slot = Some(db.clone());
        Ok(db)
    }

    /// Run one request in a fresh transaction and wait for both the request
    /// and the transaction to finish.
    async fn single_request(
        &self,
        mode: IdbTransactionMode,
        op: &'static str,
        request: impl FnOnce(&web_sys::IdbObjectStore) -> Result<web_sys::IdbRequest, JsValue>,
    ) -> StoreResult<JsValue> {
        let db = self.connection().await?;
        let (tx, store) = idb::begin_transaction(&db, &self.partition.store, mode)?;

        let req = request(&store).map_err(|e| IndexedDbError::request(op, &e))?;
        let result = idb::await_request(&req, op).await?;
        idb::await_transaction(&tx, &self.partition.store).await?;

        Ok(result)
    }
}

impl Database for IndexedDbStore {
    fn is_present(&self) -> bool {
        idb::idb_factory().is_ok()
    }

    async fn get(&self, key: &str) -> StoreResult<Option<Value>> {
        let key = JsValue::from_str(key);
        let result = self
            .single_request(IdbTransactionMode::Readonly, "get", |store| store.get(&key))
            .await?;
        Ok(idb::js_to_value(&result)?)
    }

    async fn set(&self, key: &str, value: Value) -> StoreResult<()> {
        let key = JsValue::from_str(key);
        let value = idb::value_to_js(&value)?;
        self.single_request(IdbTransactionMode::Readwrite, "put", |store| {
            store.put_with_key(&value, &key)
        })
        .await?;
        Ok(())
    }

    async fn update<F>(&self, key: &str, updater: F) -> StoreResult<()>
    where
        F: FnOnce(Option<Value>) -> StoreResult<Value>,
    {
        let db = self.connection().await?;
        let (tx, store) =
            idb::begin_transaction(&db, &self.partition.store, IdbTransactionMode::Readwrite)?;
        let js_key = JsValue::from_str(key);

        let req = store
            .get(&js_key)
            .map_err(|e| IndexedDbError::request("get", &e))?;
        let current = idb::js_to_value(&idb::await_request(&req, "get").await?)?;

        // The put must be issued before control returns to the event loop,
        // or the transaction commits without it.
        let next = match updater(current).and_then(|v| Ok(idb::value_to_js(&v)?)) {
            Ok(next) => next,
            Err(e) => {
                let _ = tx.abort();
                return Err(e);
            }
        };

        let req = store
            .put_with_key(&next, &js_key)
            .map_err(|e| IndexedDbError::request("put", &e))?;
        idb::await_request(&req, "put").await?;
        idb::await_transaction(&tx, &self.partition.store).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        let key = JsValue::from_str(key);
        self.single_request(IdbTransactionMode::Readwrite, "delete", |store| {
            store.delete(&key)
        })
        .await?;
        Ok(())
    }

    async fn clear(&self) -> StoreResult<()> {
        self.single_request(IdbTransactionMode::Readwrite, "clear", |store| store.clear())
            .await?;
        Ok(())
    }

    async fn keys(&self) -> StoreResult<Vec<String>> {
        let result = self
            .single_request(IdbTransactionMode::Readonly, "getAllKeys", |store| {
                store.get_all_keys()
            })
            .await?;

        let array = js_sys::Array::from(&result);
        Ok(array.iter().map(|key| idb::key_to_string(&key)).collect())
    }
}
