//! Request correlation for inbound RPC calls.
//!
//! # Responsibilities
//! - Reuse the caller's `x-request-id` or generate a UUID v4
//! - Write the id back into request and response metadata
//! - Expose it to handlers through request extensions and a task-local
//!
//! # Design Decisions
//! - Request ID added before the call reaches the service
//! - Each call runs inside a span carrying the id, so every log line
//!   emitted by the handler is correlated

use std::fmt;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::http::{HeaderMap, HeaderValue, Request, Response};
use futures_util::future::BoxFuture;
use tonic::metadata::{MetadataMap, MetadataValue};
use tower::{Layer, Service};
use tracing::Instrument;

use crate::observability::metrics;

/// Correlation header name.
pub const X_REQUEST_ID: &str = "x-request-id";

tokio::task_local! {
    static CURRENT: RequestId;
}

/// Correlation identifier of one inbound call.
///
/// Empty when no call is in scope.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct RequestId(Arc<str>);

impl RequestId {
    /// Wrap an existing identifier.
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        Self::new(uuid::Uuid::new_v4().to_string())
    }

    /// Read the correlation header as sent; `None` if missing, blank or not
    /// UTF-8.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        headers
            .get(X_REQUEST_ID)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.trim().is_empty())
            .map(Self::new)
    }

    /// Identifier of the call currently executing on this task.
    pub fn current() -> Self {
        CURRENT.try_with(RequestId::clone).unwrap_or_default()
    }

    /// Run `future` with this identifier as the current one.
    pub async fn scope<F: std::future::Future>(self, future: F) -> F::Output {
        CURRENT.scope(self, future).await
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Metadata to attach to downstream calls made on behalf of this call.
    pub fn outgoing_metadata(&self) -> MetadataMap {
        let mut metadata = MetadataMap::new();
        self.attach(&mut metadata);
        metadata
    }

    /// Stamp the identifier onto an outgoing request.
    pub fn attach_to<T>(&self, request: &mut tonic::Request<T>) {
        self.attach(request.metadata_mut());
    }

    fn attach(&self, metadata: &mut MetadataMap) {
        if self.is_empty() {
            return;
        }
        if let Ok(value) = MetadataValue::try_from(self.as_str()) {
            metadata.insert(X_REQUEST_ID, value);
        }
    }

    fn header_value(&self) -> Option<HeaderValue> {
        HeaderValue::from_str(self.as_str()).ok()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Read the correlation carrier attached by [`RequestIdLayer`].
pub trait RequestIdExt {
    /// The call's identifier, empty outside an intercepted call.
    fn request_id(&self) -> RequestId;
}

impl<T> RequestIdExt for tonic::Request<T> {
    fn request_id(&self) -> RequestId {
        self.extensions().get::<RequestId>().cloned().unwrap_or_default()
    }
}

impl<B> RequestIdExt for Request<B> {
    fn request_id(&self) -> RequestId {
        self.extensions().get::<RequestId>().cloned().unwrap_or_default()
    }
}

/// Tower layer installing [`RequestIdService`] in front of every RPC.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestIdLayer;

impl<S> Layer<S> for RequestIdLayer {
    type Service = RequestIdService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestIdService { inner }
    }
}

/// Assigns a correlation identifier to each call.
#[derive(Debug, Clone)]
pub struct RequestIdService<S> {
    inner: S,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for RequestIdService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    ReqBody: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<ReqBody>) -> Self::Future {
        let id = RequestId::from_headers(request.headers()).unwrap_or_else(RequestId::generate);
        let header = id.header_value();

        if let Some(value) = &header {
            request.headers_mut().insert(X_REQUEST_ID, value.clone());
        }
        request.extensions_mut().insert(id.clone());

        let path = request.uri().path().to_owned();
        metrics::record_rpc_call(&path);
        let span = tracing::info_span!("rpc", request_id = %id, path = %path);

        // The clone is not ready; keep the instance poll_ready was called on.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(
            id.scope(async move {
                tracing::debug!("Call received");
                let mut response = inner.call(request).await?;
                if let Some(value) = header {
                    response.headers_mut().insert(X_REQUEST_ID, value);
                }
                Ok(response)
            })
            .instrument(span),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::convert::Infallible;
    use tower::{service_fn, ServiceExt};

    #[derive(Debug, Clone)]
    struct Seen {
        header: Option<String>,
        extension: RequestId,
        current: RequestId,
    }

    async fn observe(request: Request<()>) -> Result<Response<Seen>, Infallible> {
        let seen = Seen {
            header: request
                .headers()
                .get(X_REQUEST_ID)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned),
            extension: request.request_id(),
            current: RequestId::current(),
        };
        Ok(Response::new(seen))
    }

    fn call_with(header: Option<&str>) -> Request<()> {
        let mut builder = Request::builder().uri("/test.Service/Method");
        if let Some(value) = header {
            builder = builder.header(X_REQUEST_ID, value);
        }
        builder.body(()).unwrap()
    }

    #[tokio::test]
    async fn test_inbound_header_is_reused() {
        let response = RequestIdLayer.layer(service_fn(observe)).oneshot(call_with(Some("abc"))).await.unwrap();

        assert_eq!(response.headers().get(X_REQUEST_ID).unwrap(), "abc");
        let seen = response.into_body();
        assert_eq!(seen.header.as_deref(), Some("abc"));
        assert_eq!(seen.extension.as_str(), "abc");
        assert_eq!(seen.current.as_str(), "abc");
    }

    #[tokio::test]
    async fn test_missing_header_generates_id() {
        let response = RequestIdLayer.layer(service_fn(observe)).oneshot(call_with(None)).await.unwrap();

        let outgoing = response.headers().get(X_REQUEST_ID).unwrap().to_str().unwrap().to_owned();
        let seen = response.into_body();
        assert!(!seen.current.is_empty());
        assert_eq!(seen.current.as_str(), outgoing);
        assert_eq!(seen.extension, seen.current);
        assert!(uuid::Uuid::parse_str(&outgoing).is_ok());
    }

    #[tokio::test]
    async fn test_empty_header_generates_id() {
        let response = RequestIdLayer.layer(service_fn(observe)).oneshot(call_with(Some(""))).await.unwrap();
        assert!(!response.into_body().current.is_empty());

        let response = RequestIdLayer.layer(service_fn(observe)).oneshot(call_with(Some("   "))).await.unwrap();
        assert!(!response.into_body().current.as_str().trim().is_empty());
    }

    #[tokio::test]
    async fn test_inbound_header_is_not_rewritten() {
        let response = RequestIdLayer.layer(service_fn(observe)).oneshot(call_with(Some(" abc "))).await.unwrap();

        let seen = response.into_body();
        assert_eq!(seen.extension.as_str(), " abc ");
        assert_eq!(seen.current.as_str(), " abc ");
    }

    #[tokio::test]
    async fn test_generated_ids_are_unique_under_load() {
        let service = RequestIdLayer.layer(service_fn(observe));
        let mut handles = Vec::with_capacity(10_000);
        for _ in 0..10_000 {
            let service = service.clone();
            handles.push(tokio::spawn(async move {
                service.oneshot(call_with(None)).await.unwrap().into_body().current
            }));
        }

        let mut ids = HashSet::new();
        for handle in handles {
            assert!(ids.insert(handle.await.unwrap()));
        }
        assert_eq!(ids.len(), 10_000);
    }

    #[tokio::test]
    async fn test_current_is_empty_outside_a_call() {
        assert!(RequestId::current().is_empty());
        assert!(tonic::Request::new(()).request_id().is_empty());
    }

    #[test]
    fn test_outgoing_metadata() {
        let metadata = RequestId::new("abc").outgoing_metadata();
        assert_eq!(metadata.get(X_REQUEST_ID).unwrap(), "abc");
        assert!(RequestId::default().outgoing_metadata().is_empty());
    }
}
