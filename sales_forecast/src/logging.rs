//! Log subscriber setup for binaries embedding the service

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "warn";

/// Install a formatted subscriber filtered by `RUST_LOG` (`warn` when unset).
///
/// Safe to call more than once; later calls leave the first subscriber in
/// place.
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
