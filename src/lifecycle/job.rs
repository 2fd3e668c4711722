//! Background jobs run by the supervisor.

use std::borrow::Cow;
use std::fmt;
use std::future::Future;

use futures_util::future::{BoxFuture, FutureExt};
use tokio_util::sync::CancellationToken;

/// Boxed error returned by job bodies.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result of a single job.
pub type JobResult = Result<(), BoxError>;

type JobFn = Box<dyn FnOnce(CancellationToken) -> BoxFuture<'static, JobResult> + Send>;

/// A named unit of background work.
///
/// The body receives the supervisor's shared cancellation token and is
/// invoked exactly once.
pub struct Job {
    name: Cow<'static, str>,
    body: JobFn,
}

impl Job {
    /// Create a job from an async closure.
    pub fn new<F, Fut>(name: impl Into<Cow<'static, str>>, body: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = JobResult> + Send + 'static,
    {
        Self {
            name: name.into(),
            body: Box::new(move |token| body(token).boxed()),
        }
    }

    /// Name used in logs, metrics and failure reports.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn start(self, token: CancellationToken) -> (Cow<'static, str>, BoxFuture<'static, JobResult>) {
        let future = (self.body)(token);
        (self.name, future)
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job").field("name", &self.name).finish_non_exhaustive()
    }
}

/// Why a job did not complete successfully.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    /// The job body returned an error.
    #[error("{0}")]
    Failed(#[source] BoxError),

    /// The job body panicked.
    #[error("panicked: {0}")]
    Panicked(String),
}

/// A job error tagged with the job that produced it.
#[derive(Debug, thiserror::Error)]
#[error("{job}: {error}")]
pub struct JobFailure {
    pub job: Cow<'static, str>,
    #[source]
    pub error: JobError,
}
