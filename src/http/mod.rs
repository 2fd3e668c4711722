//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, trace layer, graceful shutdown)
//!     → GET /metrics → Prometheus text exposition
//!     → GET /health  → health.rs (injected dependency check)
//! ```

pub mod health;
pub mod server;

pub use health::{AlwaysHealthy, HealthCheck};
pub use server::HttpServer;
