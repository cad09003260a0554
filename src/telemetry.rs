//! Tracing subscriber setup.
//!
//! The library only emits `tracing` events; embedding binaries call
//! [`init_tracing`] once at startup to get formatted, filterable output.

use tracing_subscriber::{EnvFilter, fmt as tfmt};

/// Install a global fmt subscriber.
///
/// `RUST_LOG` takes precedence; otherwise `default_filter` (for example the
/// configured `log_level`) is used. Returns `false` when a global subscriber
/// was already installed.
pub fn init_tracing(default_filter: &str) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .try_init()
        .is_ok()
}
