//! IndexedDB backend for Jotter storage (browser WASM)
//!
//! Implements the preferred [`Database`](jotter_core::storage::Database) seam
//! of `jotter-core` on top of the browser's IndexedDB, in the manner of a
//! plain key-value store: one object store per partition, out-of-line string
//! keys, and values stored as structured JS objects.
//!
//! # Schema
//!
//! Database `<partition.database>` at version 1 holds a single object store
//! `<partition.store>` with no key path. Values are converted from
//! `serde_json::Value` to JS objects on write and back on read.
//!
//! # Example
//!
//! ```rust,ignore
//! use jotter_core::storage::Database;
//! use jotter_indexeddb::IndexedDbStore;
//!
//! // Creating the handle never touches IndexedDB.
//! let store = IndexedDbStore::create_store("notes", "notes");
//!
//! if store.is_present() {
//!     store.set("k", serde_json::json!({"foo": "bar"})).await?;
//!     let value = store.get("k").await?;
//! }
//! ```

pub mod error;
pub mod idb;
pub mod store;

pub use error::{IndexedDbError, Result};
pub use store::IndexedDbStore;
