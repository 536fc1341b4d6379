//! Fallback executor: run exactly one of two alternative operations.
//!
//! Given an optional asynchronous operation against the preferred [`Database`]
//! and an optional synchronous operation against the [`FlatStore`], pick the
//! first usable one and run it end-to-end.
//!
//! Once a backend is chosen its result is final. A failing database call is
//! returned to the caller as-is and is never retried against the flat store.

use std::future::{Future, Ready};

use tracing::debug;

use crate::storage::error::{StoreError, StoreResult};
use crate::storage::traits::{Database, FlatStore};

/// Placeholder type for callers that omit the preferred operation.
pub type NoPreferred<T> = fn() -> Ready<StoreResult<T>>;

/// Placeholder type for callers that omit the fallback operation.
pub type NoFallback<T> = fn() -> StoreResult<T>;

/// Which backend an operation ran against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Preferred,
    Fallback,
}

/// Per-call availability of the two backends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Availability {
    /// The database's global handle exists.
    pub preferred: bool,
    /// The flat store survived a probe write/delete.
    pub fallback: bool,
}

impl Availability {
    /// Query both backends. Never cached: a backend may come and go between
    /// calls (e.g. storage permission granted mid-session).
    pub fn probe<D: Database, S: FlatStore>(db: &D, flat: &S) -> Self {
        Self {
            preferred: db.is_present(),
            fallback: flat.is_usable(),
        }
    }
}

/// Decide which branch runs.
///
/// A backend only counts when it is available *and* the caller supplied an
/// operation for it, so callers can express operations that exist on one
/// backend only.
pub fn select_backend(
    availability: Availability,
    has_preferred: bool,
    has_fallback: bool,
) -> Option<Backend> {
    if availability.preferred && has_preferred {
        Some(Backend::Preferred)
    } else if availability.fallback && has_fallback {
        Some(Backend::Fallback)
    } else {
        None
    }
}

/// Run `preferred` against `db` if possible, else `fallback` against `flat`.
///
/// Errors from whichever operation runs are propagated unchanged. When
/// neither can run the result is [`StoreError::NoBackend`].
pub async fn run_with_fallback<T, D, S, P, Fut, F>(
    db: &D,
    flat: &S,
    preferred: Option<P>,
    fallback: Option<F>,
) -> StoreResult<T>
where
    D: Database,
    S: FlatStore,
    P: FnOnce() -> Fut,
    Fut: Future<Output = StoreResult<T>>,
    F: FnOnce() -> StoreResult<T>,
{
    let availability = Availability::probe(db, flat);
    let choice = select_backend(availability, preferred.is_some(), fallback.is_some());
    debug!(
        ?choice,
        preferred = availability.preferred,
        fallback = availability.fallback,
        "storage backend selected"
    );

    match (choice, preferred, fallback) {
        (Some(Backend::Preferred), Some(op), _) => op().await,
        (Some(Backend::Fallback), _, Some(op)) => op(),
        _ => Err(StoreError::NoBackend),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::error::NO_BACKEND_MESSAGE;
    use crate::storage::memory::{MemoryFactory, MemoryFlatStore};
    use std::cell::Cell;

    fn backends() -> (MemoryFactory, crate::storage::MemoryDatabase, MemoryFlatStore) {
        let factory = MemoryFactory::new();
        let db = factory.create_store("test", "test");
        (factory, db, MemoryFlatStore::new())
    }

    #[tokio::test]
    async fn test_prefers_database_when_available() {
        let (_factory, db, flat) = backends();
        let preferred_calls = Cell::new(0);
        let fallback_calls = Cell::new(0);
        let calls = &preferred_calls;

        let result = run_with_fallback(
            &db,
            &flat,
            Some(move || async move {
                calls.set(calls.get() + 1);
                Ok("from-idb")
            }),
            Some(|| {
                fallback_calls.set(fallback_calls.get() + 1);
                Ok("from-ls")
            }),
        )
        .await;

        assert_eq!(result, Ok("from-idb"));
        assert_eq!(preferred_calls.get(), 1);
        assert_eq!(fallback_calls.get(), 0);
    }

    #[tokio::test]
    async fn test_falls_back_when_database_absent() {
        let (factory, db, flat) = backends();
        factory.set_present(false);
        let preferred_called = Cell::new(false);
        let called = &preferred_called;

        let result = run_with_fallback(
            &db,
            &flat,
            Some(move || async move {
                called.set(true);
                Ok("from-idb")
            }),
            Some(|| Ok("from-ls")),
        )
        .await;

        assert_eq!(result, Ok("from-ls"));
        assert!(!preferred_called.get());
    }

    #[tokio::test]
    async fn test_no_backend_when_neither_available() {
        let (factory, db, flat) = backends();
        factory.set_present(false);
        flat.set_disabled(true);

        let result: StoreResult<String> =
            run_with_fallback(&db, &flat, None::<NoPreferred<String>>, None::<NoFallback<String>>)
                .await;

        let err = result.unwrap_err();
        assert_eq!(err, StoreError::NoBackend);
        assert_eq!(err.to_string(), NO_BACKEND_MESSAGE);
    }

    #[tokio::test]
    async fn test_database_failure_is_not_masked() {
        let (_factory, db, flat) = backends();
        let fallback_called = Cell::new(false);

        let result: StoreResult<&str> = run_with_fallback(
            &db,
            &flat,
            Some(|| async { Err(StoreError::Backend("fail".into())) }),
            Some(|| {
                fallback_called.set(true);
                Ok("from-ls")
            }),
        )
        .await;

        assert_eq!(result, Err(StoreError::Backend("fail".into())));
        assert!(!fallback_called.get());
    }

    #[tokio::test]
    async fn test_flat_store_failure_propagates() {
        let (factory, db, flat) = backends();
        factory.set_present(false);

        let result: StoreResult<()> = run_with_fallback(
            &db,
            &flat,
            None::<NoPreferred<()>>,
            Some(|| Err(StoreError::QuotaExceeded { used: 10, limit: 5 })),
        )
        .await;

        assert_eq!(result, Err(StoreError::QuotaExceeded { used: 10, limit: 5 }));
    }

    #[tokio::test]
    async fn test_omitted_preferred_operation_uses_fallback() {
        let (_factory, db, flat) = backends();

        let result = run_with_fallback(&db, &flat, None::<NoPreferred<i32>>, Some(|| Ok(7))).await;

        assert_eq!(result, Ok(7));
    }

    #[tokio::test]
    async fn test_omitted_fallback_operation_is_no_backend() {
        let (factory, db, flat) = backends();
        factory.set_present(false);

        let result = run_with_fallback(
            &db,
            &flat,
            Some(|| async { Ok(1) }),
            None::<NoFallback<i32>>,
        )
        .await;

        assert_eq!(result, Err(StoreError::NoBackend));
    }

    #[tokio::test]
    async fn test_availability_is_recomputed_per_call() {
        let (factory, db, flat) = backends();
        factory.set_present(false);
        flat.set_disabled(true);

        let first = run_with_fallback(&db, &flat, None::<NoPreferred<i32>>, Some(|| Ok(1))).await;
        assert_eq!(first, Err(StoreError::NoBackend));

        flat.set_disabled(false);
        let second = run_with_fallback(&db, &flat, None::<NoPreferred<i32>>, Some(|| Ok(2))).await;
        assert_eq!(second, Ok(2));
    }

    #[test]
    fn test_select_backend() {
        let both = Availability {
            preferred: true,
            fallback: true,
        };
        let flat_only = Availability {
            preferred: false,
            fallback: true,
        };
        let neither = Availability::default();

        assert_eq!(select_backend(both, true, true), Some(Backend::Preferred));
        assert_eq!(select_backend(both, false, true), Some(Backend::Fallback));
        assert_eq!(select_backend(both, false, false), None);
        assert_eq!(select_backend(flat_only, true, true), Some(Backend::Fallback));
        assert_eq!(select_backend(flat_only, true, false), None);
        assert_eq!(select_backend(neither, true, true), None);
    }

    #[test]
    fn test_probe_leaves_no_trace() {
        let (_factory, db, flat) = backends();

        let availability = Availability::probe(&db, &flat);

        assert!(availability.preferred);
        assert!(availability.fallback);
        assert_eq!(flat.keys().unwrap(), Vec::<String>::new());
    }
}
