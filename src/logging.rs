//! Subscriber setup
//!
//! Library code only emits `tracing` events. Per-row bit dumps of the image
//! decoder are on the `divo_transport::image` target at trace level.

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

const DEBUG_FILTER: &str = "divo=debug,divo_transport=debug,divo_device=debug";

/// Filter directive used when `RUST_LOG` is not set
pub fn filter_directive(config: &LoggingConfig) -> &str {
    if config.debug {
        DEBUG_FILTER
    } else {
        &config.filter
    }
}

/// Install the global fmt subscriber
///
/// Returns false if a subscriber was already installed.
pub fn init_logging(config: &LoggingConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(config)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .is_ok()
}
