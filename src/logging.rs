//! Tracing initialization.
//!
//! The executor instruments phase boundaries, join strategy selection, and
//! subquery dispatch with `tracing` spans and events; this module just wires
//! up a process-wide subscriber so a binary embedding this crate gets
//! sensible output without having to know the crate's internals.

use crate::config::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// Install a global `tracing` subscriber reading its filter from `config`,
/// overridable via the standard `RUST_LOG` environment variable.
///
/// Safe to call once at process startup; a second call is a no-op logged at
/// `warn` rather than a panic, since library consumers may initialize their
/// own subscriber before or after this crate does.
pub fn init_tracing(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.filter.clone()));

    let result = if config.format == "json" {
        tracing_subscriber::fmt().with_env_filter(filter).json().try_init()
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).try_init()
    };

    if let Err(err) = result {
        tracing::warn!(%err, "tracing subscriber already installed");
    }
}
