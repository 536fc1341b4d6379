//! Dual-backend key-value storage
//!
//! Two backend seams are defined in [`traits`]:
//!
//! - **Preferred** ([`Database`]): asynchronous, transactional, stores structured
//!   values natively. In the browser this is IndexedDB (`jotter-indexeddb`).
//! - **Fallback** ([`FlatStore`]): synchronous, capacity-limited, strings only.
//!   In the browser this is `localStorage` (`jotter-wasm`).
//!
//! [`run_with_fallback`] decides, per call, which of the two runs. [`KeyedStore`]
//! builds get/set/update/remove/clear/keys/entries on top of it, translating
//! values to JSON text for the fallback path only.
//!
//! In-memory implementations of both seams live in [`memory`] for tests and
//! native callers.
//!
//! # Example
//!
//! ```rust,ignore
//! use jotter_core::storage::{KeyedStore, MemoryFactory, MemoryFlatStore};
//!
//! let factory = MemoryFactory::new();
//! let flat = MemoryFlatStore::new();
//! let store = KeyedStore::new(factory.create_store("notes", "notes"), flat.clone());
//!
//! // The database is present, so the flat store is never touched.
//! store.set("key", &serde_json::json!({"foo": "bar"})).await?;
//! assert_eq!(flat.get_item("key")?, None);
//!
//! // Without the database, values land in the flat store as JSON text.
//! factory.set_present(false);
//! store.set("key", &serde_json::json!(123)).await?;
//! assert_eq!(flat.get_item("key")?.as_deref(), Some("123"));
//! ```

mod error;
mod fallback;
mod keyed;
pub mod memory;
mod traits;

pub use error::{StoreError, StoreResult, NO_BACKEND_MESSAGE};
pub use fallback::{
    run_with_fallback, select_backend, Availability, Backend, NoFallback, NoPreferred,
};
pub use keyed::KeyedStore;
pub use memory::{MemoryDatabase, MemoryFactory, MemoryFlatStore, DEFAULT_FLAT_QUOTA};
pub use traits::{Database, FlatStore, Partition, PROBE_KEY};
