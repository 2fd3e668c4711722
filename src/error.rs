//! Listener failures reported by server jobs.

use std::io;
use std::net::SocketAddr;

/// Why a listener's start job stopped.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The listen socket could not be created.
    #[error("could not open port {addr} to serve: {source}")]
    Bind { addr: SocketAddr, source: io::Error },

    /// The gRPC transport failed while serving.
    #[error("GRPC server error: {0}")]
    Rpc(#[source] tonic::transport::Error),

    /// The HTTP server failed while serving.
    #[error("HTTP server error: {0}")]
    Http(#[source] io::Error),
}
