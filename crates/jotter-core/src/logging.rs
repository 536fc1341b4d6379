//! Native tracing setup.
//!
//! `RUST_LOG` wins over the filter passed in; the browser bridge installs its
//! own console subscriber instead of this one.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install compact terminal logging at `info`, unless `RUST_LOG` says otherwise.
pub fn init() -> bool {
    init_with_filter("info")
}

/// Install compact terminal logging with `default_filter` as the fallback
/// directive, e.g. `"jotter_core=debug"`.
///
/// Returns `false` if a global subscriber was already set; the existing one
/// is left in place.
pub fn init_with_filter(default_filter: &str) -> bool {
    tracing_subscriber::registry()
        .with(env_filter(default_filter))
        .with(fmt::layer().compact())
        .try_init()
        .is_ok()
}

/// Logging for `cargo test`: output goes through the test harness capture.
pub fn init_for_tests() -> bool {
    tracing_subscriber::registry()
        .with(env_filter("debug"))
        .with(fmt::layer().compact().with_test_writer())
        .try_init()
        .is_ok()
}

fn env_filter(default_filter: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}
