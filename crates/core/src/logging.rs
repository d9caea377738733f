//! Logging bootstrap

use tracing_subscriber::EnvFilter;

/// Install the fmt subscriber
///
/// `RUST_LOG` wins over `default_directive` (e.g. "info" or
/// "tidings_core=debug"). Does nothing if a subscriber is already set.
pub fn init(default_directive: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
