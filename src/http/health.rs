//! Health endpoint dependency check.
//!
//! The check is supplied by whoever owns the data store handle; this
//! module only defines the seam and the handler.

use std::future::Future;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use futures_util::future::BoxFuture;

use crate::http::server::AppState;
use crate::lifecycle::BoxError;

/// A dependency probe run on every `GET /health`.
pub trait HealthCheck: Send + Sync + 'static {
    fn check(&self) -> BoxFuture<'_, Result<(), BoxError>>;
}

impl<F, Fut> HealthCheck for F
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
{
    fn check(&self) -> BoxFuture<'_, Result<(), BoxError>> {
        Box::pin(self())
    }
}

/// Check for processes without external dependencies.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysHealthy;

impl HealthCheck for AlwaysHealthy {
    fn check(&self) -> BoxFuture<'_, Result<(), BoxError>> {
        Box::pin(async { Ok(()) })
    }
}

/// `GET /health`: 200 on success, 500 with the error text otherwise.
pub(crate) async fn health_handler(State(state): State<AppState>) -> Response {
    match state.health.check().await {
        Ok(()) => (StatusCode::OK, "OK").into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}
