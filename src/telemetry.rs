//! Tracing setup for binaries and tests embedding this crate.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber, honoring `RUST_LOG` with an `info`
/// fallback. Call once at process start.
pub fn init() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();
}

/// Like [`init`] but tolerant of an already-installed subscriber, for use
/// in tests.
pub fn try_init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "debug".into()))
        .with_test_writer()
        .try_init();
}
