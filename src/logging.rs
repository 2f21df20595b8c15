//! Structured logging setup.

use tracing_subscriber::{fmt, prelude::*, EnvFilter, Registry};

use crate::config::FmsConfig;

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` wins over `config.log_filter`. Calling this more than once
/// (e.g. from several tests) is harmless: later calls are ignored.
pub fn init(config: &FmsConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if config.json_logs {
        let _ = Registry::default()
            .with(filter)
            .with(fmt::layer().json().with_current_span(false))
            .try_init();
        return;
    }

    let _ = Registry::default()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .try_init();
}
