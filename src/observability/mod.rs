//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via `tracing`)
//!     → metrics.rs (counters exported in Prometheus format)
//!
//! Consumers:
//!     → stdout (pretty or JSON lines)
//!     → GET /metrics (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID flows into every RPC span
//! - `RUST_LOG` overrides the configured level when set

pub mod logging;
pub mod metrics;

/// Errors raised while installing the global logging or metrics backends.
#[derive(Debug, thiserror::Error)]
pub enum ObservabilityError {
    #[error("failed to install log subscriber: {0}")]
    Logging(#[from] tracing_subscriber::util::TryInitError),

    #[error("failed to install metrics recorder: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),
}
