//! Storage error types

use thiserror::Error;

/// Message carried by [`StoreError::NoBackend`]. Callers match on it verbatim.
pub const NO_BACKEND_MESSAGE: &str = "No IndexedDB and no localStorage.";

/// Errors that can occur during storage operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Neither the database nor the flat store could take the operation
    #[error("No IndexedDB and no localStorage.")]
    NoBackend,

    /// Key vanished while the operation was running
    #[error("key not found: {0}")]
    NotFound(String),

    /// Value could not be encoded or decoded
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Storage backend error (request, transaction, JS exception, ...)
    #[error("storage backend error: {0}")]
    Backend(String),

    /// Backend exists but refuses to work (disabled, security policy, ...)
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// Flat store capacity ceiling reached
    #[error("quota exceeded: {used} > {limit} bytes")]
    QuotaExceeded { used: usize, limit: usize },
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;
