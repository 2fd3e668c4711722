//! Shared utilities for integration tests.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use service_host::rpc::{RequestId, RequestIdExt, X_REQUEST_ID};
use tonic::codegen::{http, Body, BoxFuture, Service, StdError};
use tokio::sync::Notify;
use tonic::server::NamedService;

#[derive(Clone, PartialEq, prost::Message)]
pub struct EchoRequest {
    #[prost(string, tag = "1")]
    pub message: String,
    #[prost(uint64, tag = "2")]
    pub delay_ms: u64,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct EchoReply {
    #[prost(string, tag = "1")]
    pub message: String,
    /// Id read from request metadata.
    #[prost(string, tag = "2")]
    pub metadata_id: String,
    /// Id read from the request extension carrier.
    #[prost(string, tag = "3")]
    pub extension_id: String,
    /// Id read from the task-local.
    #[prost(string, tag = "4")]
    pub current_id: String,
}

pub const SAY_PATH: &str = "/echo.Echo/Say";

/// Minimal unary gRPC service, shaped like generated server code.
#[derive(Clone, Default)]
pub struct EchoServer {
    entered: Arc<Notify>,
}

impl EchoServer {
    /// Notified each time a call reaches the handler.
    pub fn entered(&self) -> Arc<Notify> {
        self.entered.clone()
    }
}

impl NamedService for EchoServer {
    const NAME: &'static str = "echo.Echo";
}

struct Say(Arc<Notify>);

impl tonic::server::UnaryService<EchoRequest> for Say {
    type Response = EchoReply;
    type Future = BoxFuture<tonic::Response<EchoReply>, tonic::Status>;

    fn call(&mut self, request: tonic::Request<EchoRequest>) -> Self::Future {
        let entered = self.0.clone();
        Box::pin(async move {
            entered.notify_one();
            let metadata_id = request
                .metadata()
                .get(X_REQUEST_ID)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();
            let extension_id = request.request_id().to_string();
            let current_id = RequestId::current().to_string();

            let body = request.into_inner();
            if body.delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(body.delay_ms)).await;
            }

            Ok(tonic::Response::new(EchoReply {
                message: body.message,
                metadata_id,
                extension_id,
                current_id,
            }))
        })
    }
}

impl<B> Service<http::Request<B>> for EchoServer
where
    B: Body + Send + 'static,
    B::Error: Into<StdError> + Send + 'static,
{
    type Response = http::Response<tonic::body::BoxBody>;
    type Error = Infallible;
    type Future = BoxFuture<Self::Response, Self::Error>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: http::Request<B>) -> Self::Future {
        match req.uri().path() {
            SAY_PATH => {
                let say = Say(self.entered.clone());
                Box::pin(async move {
                    let codec = tonic::codec::ProstCodec::default();
                    let mut grpc = tonic::server::Grpc::new(codec);
                    Ok(grpc.unary(say, req).await)
                })
            }
            _ => Box::pin(async move {
                let response = http::Response::builder()
                    .status(200)
                    .header("grpc-status", (tonic::Code::Unimplemented as i32).to_string())
                    .header(http::header::CONTENT_TYPE, "application/grpc")
                    .body(tonic::body::empty_body())
                    .unwrap();
                Ok(response)
            }),
        }
    }
}

/// Call `echo.Echo/Say` on `addr`, optionally with an inbound request id.
pub async fn say(
    addr: SocketAddr,
    message: &str,
    delay_ms: u64,
    request_id: Option<&str>,
) -> Result<tonic::Response<EchoReply>, tonic::Status> {
    let channel = tonic::transport::Endpoint::from_shared(format!("http://{addr}"))
        .unwrap()
        .connect()
        .await
        .map_err(|e| tonic::Status::unavailable(e.to_string()))?;
    let mut grpc = tonic::client::Grpc::new(channel);
    grpc.ready()
        .await
        .map_err(|e| tonic::Status::unavailable(e.to_string()))?;

    let mut request = tonic::Request::new(EchoRequest {
        message: message.to_string(),
        delay_ms,
    });
    if let Some(id) = request_id {
        request.metadata_mut().insert(X_REQUEST_ID, id.parse().unwrap());
    }

    let codec = tonic::codec::ProstCodec::<EchoRequest, EchoReply>::default();
    let path = http::uri::PathAndQuery::from_static(SAY_PATH);
    grpc.unary(request, path, codec).await
}

/// An address on localhost that was free a moment ago.
pub fn free_addr() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

/// Wait until something accepts connections on `addr`.
pub async fn wait_for_listener(addr: SocketAddr) {
    for _ in 0..100 {
        if tokio::net::TcpStream::connect(addr).await.is_ok() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("nothing listening on {addr}");
}
