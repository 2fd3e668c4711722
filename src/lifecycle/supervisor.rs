//! Job supervisor.
//!
//! # Responsibilities
//! - Own the job registry
//! - Run every job concurrently under one cancellation token
//! - Decide the process outcome from job results
//!
//! # Termination
//! - Token cancelled: wait for all jobs, aggregate every failure
//! - A job finishes first: return its result right away; the other jobs
//!   stay detached and their results are dropped

use std::any::Any;
use std::borrow::Cow;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures_util::FutureExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::lifecycle::job::{Job, JobError, JobFailure, JobResult};
use crate::observability::metrics;

type Outcome = Result<(), JobFailure>;

/// How `Supervisor::run` ended with a failure.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// A job failed before shutdown was requested.
    #[error("job {0}")]
    Job(#[source] JobFailure),

    /// One or more jobs failed after shutdown was requested.
    #[error("{} job(s) failed during shutdown: {}", .0.len(), join_failures(.0))]
    Aggregate(Vec<JobFailure>),
}

impl RunError {
    /// Every failure carried by this error.
    pub fn failures(&self) -> &[JobFailure] {
        match self {
            RunError::Job(failure) => std::slice::from_ref(failure),
            RunError::Aggregate(failures) => failures,
        }
    }
}

fn join_failures(failures: &[JobFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Runs registered background jobs until shutdown.
///
/// Jobs can only be added before [`Supervisor::run`], which takes the
/// supervisor by value.
#[derive(Debug, Default)]
pub struct Supervisor {
    jobs: Vec<Job>,
}

impl Supervisor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a job.
    pub fn add_job(&mut self, job: Job) -> &mut Self {
        tracing::debug!(job = job.name(), "Job registered");
        self.jobs.push(job);
        self
    }

    /// Register an async closure as a named job.
    pub fn spawn<F, Fut>(&mut self, name: impl Into<Cow<'static, str>>, body: F) -> &mut Self
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = JobResult> + Send + 'static,
    {
        self.add_job(Job::new(name, body))
    }

    /// Number of registered jobs.
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Start every job and block until the process should exit.
    ///
    /// Returns `Ok(())` when every job succeeded after cancellation, or when
    /// the first job to finish before cancellation succeeded.
    pub async fn run(self, shutdown: CancellationToken) -> Result<(), RunError> {
        let total = self.jobs.len();
        tracing::info!(jobs = total, "started application");

        // One slot per job so no task waits to report after we stop listening.
        let (tx, mut rx) = mpsc::channel::<Outcome>(total.max(1));

        for job in self.jobs {
            let tx = tx.clone();
            let token = shutdown.clone();
            tokio::spawn(async move {
                let outcome = run_job(job, token).await;
                // Fails only once the first-completion path has returned.
                let _ = tx.try_send(outcome);
            });
        }
        drop(tx);

        tokio::select! {
            biased;

            () = shutdown.cancelled() => {
                tracing::info!("Shutdown requested, waiting for jobs");
                let mut failures = Vec::new();
                while let Some(outcome) = rx.recv().await {
                    if let Err(failure) = outcome {
                        failures.push(failure);
                    }
                }
                if failures.is_empty() {
                    tracing::info!("All jobs stopped");
                    Ok(())
                } else {
                    Err(RunError::Aggregate(failures))
                }
            }

            Some(outcome) = rx.recv() => {
                match &outcome {
                    Ok(()) => tracing::warn!("Job finished before shutdown was requested"),
                    Err(failure) => tracing::error!(
                        job = %failure.job,
                        error = %failure.error,
                        "Job failed before shutdown was requested"
                    ),
                }
                outcome.map_err(RunError::Job)
            }
        }
    }
}

async fn run_job(job: Job, token: CancellationToken) -> Outcome {
    let (name, future) = job.start(token);
    tracing::debug!(job = %name, "Job started");

    let result: Result<JobResult, _> = AssertUnwindSafe(future).catch_unwind().await;
    let outcome = match result {
        Ok(Ok(())) => Ok(()),
        Ok(Err(error)) => Err(JobError::Failed(error)),
        Err(panic) => Err(JobError::Panicked(panic_message(panic.as_ref()))),
    };

    match &outcome {
        Ok(()) => tracing::debug!(job = %name, "Job finished"),
        Err(error) => tracing::warn!(job = %name, error = %error, "Job failed"),
    }
    metrics::record_job_finished(&name, outcome.is_ok());

    outcome.map_err(|error| JobFailure { job: name, error })
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
