//! Domain error to gRPC status translation.
//!
//! # Responsibilities
//! - Pass pre-classified `tonic::Status` values through unchanged
//! - Build a status from an opaque domain error and a code
//! - Log every translated error inside the caller's field span
//!
//! # Severity
//! - `Internal`, `Unimplemented`: ERROR
//! - Everything else: WARN

use tonic::{Code, Status};
use tracing::Span;

use crate::lifecycle::BoxError;
use crate::rpc::request::RequestId;

/// An error raised by business logic, tagged by whether it already carries
/// a transport status.
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    /// Already classified; returned to the caller as is.
    #[error("{}", .0.message())]
    Status(Status),

    /// Needs a status code from the caller.
    #[error("{0}")]
    Opaque(BoxError),
}

impl DomainError {
    /// Wrap any error (or message) as an opaque domain error.
    pub fn opaque(error: impl Into<BoxError>) -> Self {
        DomainError::Opaque(error.into())
    }
}

impl From<Status> for DomainError {
    fn from(status: Status) -> Self {
        DomainError::Status(status)
    }
}

impl From<BoxError> for DomainError {
    fn from(error: BoxError) -> Self {
        DomainError::Opaque(error)
    }
}

impl From<std::io::Error> for DomainError {
    fn from(error: std::io::Error) -> Self {
        DomainError::Opaque(Box::new(error))
    }
}

/// Translate an optional domain error into an optional status.
///
/// `None` produces `None` and logs nothing. The caller's structured fields
/// travel on `fields`; the log entry is emitted inside that span so every
/// field keeps its own key. Pass `Span::none()` when there are none.
pub fn translate<E>(error: Option<E>, code: Code, fields: &Span) -> Option<Status>
where
    E: Into<DomainError>,
{
    error.map(|error| status(error, code, fields))
}

/// Translate a domain error into a status, logging it.
pub fn status(error: impl Into<DomainError>, code: Code, fields: &Span) -> Status {
    let error = error.into();
    let message = format!("{code:?}: {error}");
    let request_id = RequestId::current();

    fields.in_scope(|| {
        if is_server_fault(code) {
            tracing::error!(code = ?code, error = %error, request_id = %request_id, "{message}");
        } else {
            tracing::warn!(code = ?code, error = %error, request_id = %request_id, "{message}");
        }
    });

    match error {
        DomainError::Status(status) => status,
        DomainError::Opaque(_) => Status::new(code, message),
    }
}

fn is_server_fault(code: Code) -> bool {
    matches!(code, Code::Internal | Code::Unimplemented)
}

/// Convert `Result` errors into statuses at the handler boundary.
pub trait ResultExt<T> {
    fn or_status(self, code: Code, fields: &Span) -> Result<T, Status>;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Into<DomainError>,
{
    fn or_status(self, code: Code, fields: &Span) -> Result<T, Status> {
        self.map_err(|error| status(error, code, fields))
    }
}
