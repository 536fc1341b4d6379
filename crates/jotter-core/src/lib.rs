//! Jotter Core
//!
//! Storage kernel for the Jotter note-taking app, designed to run identically
//! in the browser (WASM) and natively.
//!
//! The interesting part is the dual-backend persistence layer: every keyed
//! operation prefers an asynchronous, transactional database and falls back
//! to a synchronous, string-only flat store when the database is missing.
//! Which backend runs is decided per call by [`storage::run_with_fallback`].
//!
//! # Features
//!
//! - `subscriber` (default) - native `tracing-subscriber` setup in [`logging`]
//!
//! # Example
//!
//! ```rust,ignore
//! use jotter_core::storage::{KeyedStore, MemoryFactory, MemoryFlatStore};
//! use serde_json::json;
//!
//! let factory = MemoryFactory::new();
//! let store = KeyedStore::new(
//!     factory.create_store("notes", "notes"),
//!     MemoryFlatStore::new(),
//! );
//!
//! store.set("k", &json!({"foo": "bar"})).await?;
//! assert_eq!(store.get("k").await?, Some(json!({"foo": "bar"})));
//! ```

pub mod config;
#[cfg(feature = "subscriber")]
pub mod logging;
pub mod notes;
pub mod report;
pub mod storage;

// Re-export main types at crate root
pub use config::StorageConfig;
pub use notes::{Note, NoteDraft, NotePatch, Notes};
pub use storage::{
    run_with_fallback, Database, FlatStore, KeyedStore, MemoryDatabase, MemoryFactory,
    MemoryFlatStore, StoreError, StoreResult,
};
