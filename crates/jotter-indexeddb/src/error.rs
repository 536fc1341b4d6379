//! IndexedDB failures and how they surface as `StoreError`

use jotter_core::storage::StoreError;
use thiserror::Error;
use wasm_bindgen::{JsCast, JsValue};

pub type Result<T> = std::result::Result<T, IndexedDbError>;

#[derive(Debug, Error)]
pub enum IndexedDbError {
    /// No usable `indexedDB` global
    #[error("IndexedDB not available: {0}")]
    NotAvailable(String),

    #[error("cannot open database `{database}`: {message}")]
    Open { database: String, message: String },

    /// Starting, committing or aborting a transaction failed
    #[error("transaction on `{store}` failed: {message}")]
    Transaction { store: String, message: String },

    #[error("{op} request failed: {message}")]
    Request { op: &'static str, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A stored value that can't cross the JS/JSON boundary
    #[error("value is not JSON-representable: {0}")]
    Conversion(String),
}

impl IndexedDbError {
    pub(crate) fn request(op: &'static str, err: &JsValue) -> Self {
        Self::Request {
            op,
            message: js_message(err),
        }
    }
}

/// Readable text for a thrown or rejected JS value.
///
/// IndexedDB throws `DOMException`s, whose `Debug` output is useless.
pub(crate) fn js_message(err: &JsValue) -> String {
    if let Some(exception) = err.dyn_ref::<web_sys::DomException>() {
        return format!("{}: {}", exception.name(), exception.message());
    }
    if let Some(text) = err.as_string() {
        return text;
    }
    js_sys::JSON::stringify(err)
        .map(String::from)
        .unwrap_or_else(|_| format!("{:?}", err))
}

impl From<IndexedDbError> for StoreError {
    fn from(err: IndexedDbError) -> Self {
        match err {
            IndexedDbError::NotAvailable(msg) => StoreError::Unavailable(msg),
            IndexedDbError::Json(e) => StoreError::Serialization(e.to_string()),
            IndexedDbError::Conversion(msg) => StoreError::Serialization(msg),
            other => StoreError::Backend(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_mapping() {
        let err: StoreError = IndexedDbError::NotAvailable("no global".into()).into();
        assert_eq!(err, StoreError::Unavailable("no global".into()));

        let err: StoreError = IndexedDbError::Open {
            database: "notes".into(),
            message: "VersionError: too old".into(),
        }
        .into();
        assert_eq!(
            err,
            StoreError::Backend("cannot open database `notes`: VersionError: too old".into())
        );

        let err: StoreError = IndexedDbError::Conversion("cyclic".into()).into();
        assert_eq!(err, StoreError::Serialization("cyclic".into()));
    }
}
