//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → cancel the shared CancellationToken
//!
//! Supervisor (supervisor.rs):
//!     add_job(..) × N → run(token)
//!     → one task per job, all sharing the token
//!     → first job to finish before cancellation decides the outcome
//!     → after cancellation: wait for every job, aggregate failures
//!
//! Shutdown (shutdown.rs):
//!     token cancelled → shutdown job triggers GracefulStop
//!     → paired start job drains its listener and returns
//! ```
//!
//! # Design Decisions
//! - Cancellation is the single control signal; no per-job timeout
//! - The job registry is frozen by ownership: `run` consumes the supervisor
//! - Graceful stops have no deadline

pub mod job;
pub mod shutdown;
pub mod signals;
pub mod supervisor;

pub use job::{BoxError, Job, JobError, JobFailure, JobResult};
pub use shutdown::GracefulStop;
pub use supervisor::{RunError, Supervisor};
