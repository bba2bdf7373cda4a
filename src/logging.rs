//! Logging setup on top of `tracing-subscriber`.
//!
//! `RUST_LOG` takes precedence when set, e.g. `RUST_LOG=shop_scheduler=trace`.
//! Otherwise the level is `info`, or `debug` with `--debug`.

use tracing_subscriber::{fmt, EnvFilter};

/// Initializes the global subscriber.
pub fn init(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(true)
        .init();
}

/// Test logging: debug level, captured by the test harness. Safe to call
/// more than once.
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
