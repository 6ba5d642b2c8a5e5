//! Structured logging initialisation.
//!
//! Log level comes from `RUST_LOG` when set, otherwise from the configured
//! default. The admission check itself never logs; acquisition, the policy
//! store and gated actions do.

use crate::config::LoggingConfig;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize human-readable logging, defaulting to `info`.
///
/// # Example
/// ```no_run
/// use geofence_core::logging;
///
/// logging::init();
/// tracing::info!("Application started");
/// ```
pub fn init() {
    init_with(&LoggingConfig::default());
}

/// Initialize JSON logging for log aggregation, defaulting to `info`.
///
/// # Example
/// ```no_run
/// use geofence_core::logging;
///
/// logging::init_json();
/// tracing::info!(service = "attendance", "Service started");
/// ```
pub fn init_json() {
    init_with(&LoggingConfig {
        json: true,
        ..LoggingConfig::default()
    });
}

/// Initialize logging from configuration.
///
/// Only the first call in a process installs a subscriber; later calls are
/// ignored.
pub fn init_with(config: &LoggingConfig) {
    let filter = env_filter(&config.level);
    let registry = tracing_subscriber::registry().with(filter);

    let result = if config.json {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(true))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(true).with_thread_ids(true))
            .try_init()
    };

    if let Err(e) = result {
        tracing::debug!("Logging already initialised: {}", e);
    }
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}
