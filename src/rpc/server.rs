//! gRPC server bootstrap.
//!
//! # Responsibilities
//! - Collect service implementations before startup
//! - Register the start job (bind + serve) and its shutdown job
//! - Install the correlation layer on every call
//!
//! # Design Decisions
//! - Bind failure is fatal and returned immediately, no retry
//! - A stop caused by graceful shutdown is not an error
//! - Graceful stop waits for in-flight calls with no deadline

use std::convert::Infallible;
use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::body::BoxBody;
use tonic::codegen::http::{Request, Response};
use tonic::codegen::Service;
use tonic::server::NamedService;
use tonic::service::RoutesBuilder;
use tonic::transport::Server;

use crate::error::ServerError;
use crate::lifecycle::{GracefulStop, Job, Supervisor};
use crate::rpc::request::RequestIdLayer;

/// gRPC listener registered as a pair of supervisor jobs.
pub struct RpcServer {
    addr: SocketAddr,
    routes: RoutesBuilder,
}

impl RpcServer {
    /// Create a server that will listen on `addr` once run.
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            routes: RoutesBuilder::default(),
        }
    }

    /// Attach a service implementation.
    pub fn add_service<S>(&mut self, service: S) -> &mut Self
    where
        S: Service<Request<BoxBody>, Response = Response<BoxBody>, Error = Infallible>
            + NamedService
            + Clone
            + Send
            + 'static,
        S::Future: Send + 'static,
    {
        tracing::debug!(service = S::NAME, "gRPC service registered");
        self.routes.add_service(service);
        self
    }

    /// Register the start and shutdown jobs on `supervisor`.
    pub fn register(self, supervisor: &mut Supervisor) {
        let stop = GracefulStop::new();
        let server_stop = stop.clone();
        let addr = self.addr;
        let routes = self.routes.routes();

        supervisor.add_job(Job::new("rpc-server", move |_token| async move {
            let _drained = server_stop.drain_guard();

            let listener = TcpListener::bind(addr)
                .await
                .map_err(|source| ServerError::Bind { addr, source })?;
            tracing::info!(address = %addr, "starting GRPC server");

            Server::builder()
                .layer(RequestIdLayer)
                .add_routes(routes)
                .serve_with_incoming_shutdown(TcpListenerStream::new(listener), server_stop.stopping())
                .await
                .map_err(ServerError::Rpc)?;

            tracing::info!("GRPC server stopped");
            Ok(())
        }));
        supervisor.add_job(stop.shutdown_job("rpc-shutdown"));
    }
}
