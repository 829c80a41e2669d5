//! Logging setup
//!
//! The library only emits `tracing` events; applications that don't
//! install their own subscriber can call [`init_tracing`].

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is not set
pub const DEFAULT_FILTER: &str = "ragbuddy=info";

/// Install a fmt subscriber writing to stderr
///
/// `RUST_LOG` wins over `filter`. Returns false if a global subscriber was
/// already installed.
pub fn init_tracing(filter: Option<&str>) -> bool {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter.unwrap_or(DEFAULT_FILTER)));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}
