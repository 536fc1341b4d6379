//! Error reporting for callers above the storage layer.
//!
//! The storage layer only returns errors. Whoever surfaces them to a user
//! hands them here together with a human-readable context line.

use std::fmt::Display;

/// Log `error` with `context` (e.g. "Failed to load notes") at error level.
pub fn on_error(error: &impl Display, context: &str) {
    tracing::error!(error = %error, "{}", context);
}

/// Run `result` through [`on_error`] if it failed, passing it on unchanged.
pub fn reported<T, E: Display>(result: Result<T, E>, context: &str) -> Result<T, E> {
    if let Err(error) = &result {
        on_error(error, context);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StoreError;

    #[test]
    fn test_reported_passes_result_through() {
        let ok: Result<i32, StoreError> = Ok(1);
        assert_eq!(reported(ok, "unused"), Ok(1));

        let err: Result<i32, StoreError> = Err(StoreError::NoBackend);
        assert_eq!(
            reported(err, "Failed to load notes"),
            Err(StoreError::NoBackend)
        );
    }
}
