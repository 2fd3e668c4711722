//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the global `tracing` subscriber
//! - Select pretty or JSON output
//! - Apply the configured level unless `RUST_LOG` is set

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogConfig, LogFormat};
use crate::observability::ObservabilityError;

/// Install the global subscriber. Can only succeed once per process.
pub fn init_logging(config: &LogConfig) -> Result<(), ObservabilityError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let pretty = (config.format == LogFormat::Pretty).then(tracing_subscriber::fmt::layer);
    let json = (config.format == LogFormat::Json).then(|| tracing_subscriber::fmt::layer().json());

    tracing_subscriber::registry()
        .with(filter)
        .with(pretty)
        .with(json)
        .try_init()?;

    Ok(())
}
