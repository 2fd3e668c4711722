//! gRPC protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (tonic transport, graceful stop)
//!     → request.rs (x-request-id read/generate, span, task-local)
//!     → registered service handler
//!     → status.rs (domain error → tonic::Status + log)
//!     → response (x-request-id echoed)
//! ```

pub mod request;
pub mod server;
pub mod status;

pub use request::{RequestId, RequestIdExt, RequestIdLayer, X_REQUEST_ID};
pub use server::RpcServer;
pub use status::{translate, DomainError, ResultExt};
