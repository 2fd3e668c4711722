//! Service host library.
//!
//! Runs a gRPC listener and an HTTP listener (`/metrics`, `/health`) as
//! supervised background jobs sharing one cancellation signal.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod rpc;

pub use config::AppConfig;
pub use error::ServerError;
pub use http::HttpServer;
pub use lifecycle::{Job, RunError, Supervisor};
pub use rpc::RpcServer;
