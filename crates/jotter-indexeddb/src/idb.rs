//! Low-level IndexedDB helpers using web-sys
//!
//! Wraps the event-based IndexedDB API into Rust futures using
//! `wasm_bindgen_futures::JsFuture` and `js_sys::Promise`.

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::{Function, Promise};
use jotter_core::storage::Partition;
use serde_json::Value;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    IdbDatabase, IdbFactory, IdbObjectStore, IdbOpenDbRequest, IdbRequest, IdbTransaction,
    IdbTransactionMode,
};

use crate::error::{js_message, IndexedDbError, Result};

const DB_VERSION: u32 = 1;

type Handler = Closure<dyn FnMut(web_sys::Event)>;

/// Installs (`Some`) or removes (`None`) the success and failure handlers on an event target.
type Attach = Rc<dyn Fn(Option<&Function>, Option<&Function>)>;

/// Produces the value to settle with; `true` for success, `false` for failure.
type Outcome = Rc<dyn Fn(bool) -> JsValue>;

/// Get the global IndexedDB factory.
pub fn idb_factory() -> Result<IdbFactory> {
    let global = js_sys::global();

    let idb: JsValue = js_sys::Reflect::get(&global, &"indexedDB".into())
        .map_err(|_| IndexedDbError::NotAvailable("no indexedDB on global".into()))?;

    if idb.is_undefined() || idb.is_null() {
        return Err(IndexedDbError::NotAvailable(
            "indexedDB is null/undefined".into(),
        ));
    }

    idb.dyn_into::<IdbFactory>()
        .map_err(|_| IndexedDbError::NotAvailable("indexedDB is not IdbFactory".into()))
}

/// Settle a Promise from whichever of two DOM events fires first.
///
/// Both handlers are detached and dropped once the promise settles.
fn settle_on_events(attach: Attach, outcome: Outcome) -> Promise {
    let mut pending = Some((attach, outcome));

    Promise::new(&mut |resolve, reject| {
        let Some((attach, outcome)) = pending.take() else {
            return;
        };
        let handlers: Rc<RefCell<Option<(Handler, Handler)>>> = Rc::new(RefCell::new(None));

        let settle = {
            let attach = attach.clone();
            let handlers = handlers.clone();
            Rc::new(move |ok: bool| {
                let callback = if ok { &resolve } else { &reject };
                let _ = callback.call1(&JsValue::UNDEFINED, &outcome(ok));
                attach(None, None);
                handlers.borrow_mut().take();
            })
        };

        let on_ok = {
            let settle = settle.clone();
            Closure::wrap(Box::new(move |_event: web_sys::Event| settle(true))
                as Box<dyn FnMut(web_sys::Event)>)
        };
        let on_err = Closure::wrap(Box::new(move |_event: web_sys::Event| settle(false))
            as Box<dyn FnMut(web_sys::Event)>);

        attach(
            Some(on_ok.as_ref().unchecked_ref()),
            Some(on_err.as_ref().unchecked_ref()),
        );
        *handlers.borrow_mut() = Some((on_ok, on_err));
    })
}

/// Convert an IdbRequest into a Promise that resolves with the request's result.
fn request_to_promise(req: &IdbRequest) -> Promise {
    let target = req.clone();
    let attach: Attach = Rc::new(move |ok: Option<&Function>, err: Option<&Function>| {
        target.set_onsuccess(ok);
        target.set_onerror(err);
    });

    let source = req.clone();
    let outcome: Outcome = Rc::new(move |ok: bool| {
        if ok {
            return source.result().unwrap_or(JsValue::UNDEFINED);
        }
        match source.error() {
            Ok(Some(e)) => JsValue::from(e.message()),
            _ => JsValue::from_str("unknown IDB error"),
        }
    });

    settle_on_events(attach, outcome)
}

/// Convert an IdbTransaction's completion (or error/abort) into a Promise.
fn transaction_to_promise(tx: &IdbTransaction) -> Promise {
    let target = tx.clone();
    let attach: Attach = Rc::new(move |ok: Option<&Function>, err: Option<&Function>| {
        target.set_oncomplete(ok);
        target.set_onerror(err);
        target.set_onabort(err);
    });

    let source = tx.clone();
    let outcome: Outcome = Rc::new(move |ok: bool| {
        if ok {
            return JsValue::UNDEFINED;
        }
        source
            .error()
            .map(|e| JsValue::from(e.message()))
            .unwrap_or_else(|| JsValue::from_str("transaction aborted"))
    });

    settle_on_events(attach, outcome)
}

/// Open (or create) the database for `partition`, creating its object store
/// on first open.
///
/// The store is only created during the version 1 upgrade, so every
/// partition should use its own database name.
pub async fn open_database(partition: &Partition) -> Result<IdbDatabase> {
    let factory = idb_factory()?;

    let open_req: IdbOpenDbRequest = factory
        .open_with_u32(&partition.database, DB_VERSION)
        .map_err(|e| open_error(&partition.database, &e))?;

    let store_name = partition.store.clone();
    let on_upgrade = Closure::wrap(Box::new(move |event: web_sys::IdbVersionChangeEvent| {
        let db = event
            .target()
            .and_then(|target| target.dyn_into::<IdbOpenDbRequest>().ok())
            .and_then(|req| req.result().ok())
            .and_then(|result| result.dyn_into::<IdbDatabase>().ok());
        let Some(db) = db else {
            tracing::error!("upgradeneeded fired without a database");
            return;
        };

        if !db.object_store_names().contains(&store_name) {
            if let Err(e) = db.create_object_store(&store_name) {
                tracing::error!(store = %store_name, error = ?e, "failed to create object store");
            }
        }
    }) as Box<dyn FnMut(web_sys::IdbVersionChangeEvent)>);

    open_req.set_onupgradeneeded(Some(on_upgrade.as_ref().unchecked_ref()));

    let open_promise = request_to_promise(open_req.unchecked_ref());
    let result = wasm_bindgen_futures::JsFuture::from(open_promise).await;

    // The upgrade handler only matters while the open request is pending.
    open_req.set_onupgradeneeded(None);
    drop(on_upgrade);

    let result = result.map_err(|e| open_error(&partition.database, &e))?;
    tracing::debug!(partition = %partition, "IndexedDB opened");

    result
        .dyn_into::<IdbDatabase>()
        .map_err(|_| IndexedDbError::Open {
            database: partition.database.clone(),
            message: "result is not IdbDatabase".into(),
        })
}

/// Start a transaction on one object store.
pub fn begin_transaction(
    db: &IdbDatabase,
    store_name: &str,
    mode: IdbTransactionMode,
) -> Result<(IdbTransaction, IdbObjectStore)> {
    let tx = db
        .transaction_with_str_and_mode(store_name, mode)
        .map_err(|e| transaction_error(store_name, &e))?;
    let store = tx
        .object_store(store_name)
        .map_err(|e| transaction_error(store_name, &e))?;
    Ok((tx, store))
}

/// Await an IdbRequest, resolving to its result JsValue. `op` names it in errors.
pub async fn await_request(req: &IdbRequest, op: &'static str) -> Result<JsValue> {
    let promise = request_to_promise(req);
    wasm_bindgen_futures::JsFuture::from(promise)
        .await
        .map_err(|e| IndexedDbError::request(op, &e))
}

/// Await an IdbTransaction to complete.
pub async fn await_transaction(tx: &IdbTransaction, store_name: &str) -> Result<()> {
    let promise = transaction_to_promise(tx);
    wasm_bindgen_futures::JsFuture::from(promise)
        .await
        .map_err(|e| transaction_error(store_name, &e))?;
    Ok(())
}

fn open_error(database: &str, err: &JsValue) -> IndexedDbError {
    IndexedDbError::Open {
        database: database.to_string(),
        message: js_message(err),
    }
}

fn transaction_error(store: &str, err: &JsValue) -> IndexedDbError {
    IndexedDbError::Transaction {
        store: store.to_string(),
        message: js_message(err),
    }
}

/// Delete an IndexedDB database by name.
pub async fn delete_database(db_name: &str) -> Result<()> {
    let factory = idb_factory()?;
    let req = factory
        .delete_database(db_name)
        .map_err(|e| IndexedDbError::request("deleteDatabase", &e))?;
    let promise = request_to_promise(req.unchecked_ref());
    wasm_bindgen_futures::JsFuture::from(promise)
        .await
        .map_err(|e| IndexedDbError::request("deleteDatabase", &e))?;
    Ok(())
}

// ============================================================================
// JS <-> JSON conversion
// ============================================================================

/// Convert a JSON value into a structured JS value for storage.
pub fn value_to_js(value: &Value) -> Result<JsValue> {
    let text = serde_json::to_string(value)?;
    js_sys::JSON::parse(&text).map_err(|e| IndexedDbError::Conversion(js_message(&e)))
}

/// Convert a stored JS value back to JSON. `undefined` means "no value".
pub fn js_to_value(val: &JsValue) -> Result<Option<Value>> {
    if val.is_undefined() {
        return Ok(None);
    }
    let text: String = js_sys::JSON::stringify(val)
        .map_err(|e| IndexedDbError::Conversion(js_message(&e)))?
        .into();
    Ok(Some(serde_json::from_str(&text)?))
}

/// Coerce an IndexedDB key to a string, as `String(key)` would for
/// strings and numbers.
pub fn key_to_string(key: &JsValue) -> String {
    if let Some(s) = key.as_string() {
        return s;
    }
    if let Some(n) = key.as_f64() {
        return n.to_string();
    }
    js_sys::JSON::stringify(key)
        .map(String::from)
        .unwrap_or_else(|_| format!("{:?}", key))
}
