//! HTTP server bootstrap.
//!
//! # Responsibilities
//! - Create the Axum router (`/metrics`, `/health`)
//! - Register the start job (bind + serve) and its shutdown job
//!
//! # Design Decisions
//! - Bind failure is fatal and returned immediately
//! - Closing through graceful shutdown is not an error
//! - Shutdown has no deadline; in-flight requests always finish

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{extract::State, routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::error::ServerError;
use crate::http::health::{health_handler, HealthCheck};
use crate::lifecycle::{GracefulStop, Job, Supervisor};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub health: Arc<dyn HealthCheck>,
    pub metrics: PrometheusHandle,
}

/// HTTP listener registered as a pair of supervisor jobs.
pub struct HttpServer {
    addr: SocketAddr,
    router: Router,
}

impl HttpServer {
    /// Create a server for `addr` with the given health check and metrics handle.
    pub fn new(addr: SocketAddr, health: impl HealthCheck, metrics: PrometheusHandle) -> Self {
        let state = AppState {
            health: Arc::new(health),
            metrics,
        };
        Self {
            addr,
            router: Self::build_router(state),
        }
    }

    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/metrics", get(metrics_handler))
            .route("/health", get(health_handler))
            .with_state(state)
            .layer(TraceLayer::new_for_http())
    }

    /// The router served by this server.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Register the start and shutdown jobs on `supervisor`.
    pub fn register(self, supervisor: &mut Supervisor) {
        let stop = GracefulStop::new();
        let server_stop = stop.clone();
        let Self { addr, router } = self;

        supervisor.add_job(Job::new("http-server", move |_token| async move {
            let _drained = server_stop.drain_guard();

            let listener = TcpListener::bind(addr)
                .await
                .map_err(|source| ServerError::Bind { addr, source })?;
            tracing::info!(address = %addr, "starting HTTP server");

            axum::serve(listener, router)
                .with_graceful_shutdown(server_stop.stopping())
                .await
                .map_err(ServerError::Http)?;

            tracing::info!("HTTP server stopped");
            Ok(())
        }));
        supervisor.add_job(stop.shutdown_job("http-shutdown"));
    }
}

async fn metrics_handler(State(state): State<AppState>) -> String {
    state.metrics.render()
}
