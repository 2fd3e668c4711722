//! Shutdown coordination between a listener and its shutdown job.

use tokio_util::sync::{CancellationToken, DropGuard, WaitForCancellationFutureOwned};

use crate::lifecycle::job::Job;

/// Pairs one listener's start job with its shutdown job.
///
/// The shutdown job triggers the stop; the start job holds a drain guard
/// that releases once the listener has finished serving (or never bound).
#[derive(Debug, Clone, Default)]
pub struct GracefulStop {
    stop: CancellationToken,
    drained: CancellationToken,
}

impl GracefulStop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the listener to stop accepting and drain in-flight work.
    pub fn trigger(&self) {
        self.stop.cancel();
    }

    /// Future resolving once [`GracefulStop::trigger`] was called.
    ///
    /// Handed to the server as its graceful-shutdown signal.
    pub fn stopping(&self) -> WaitForCancellationFutureOwned {
        self.stop.clone().cancelled_owned()
    }

    /// Guard held by the start job for as long as the listener serves.
    pub fn drain_guard(&self) -> DropGuard {
        self.drained.clone().drop_guard()
    }

    /// Wait until the start job released its drain guard.
    pub async fn drained(&self) {
        self.drained.cancelled().await;
    }

    pub fn is_drained(&self) -> bool {
        self.drained.is_cancelled()
    }

    /// Build the shutdown job for this pair.
    ///
    /// Blocks on the supervisor token, triggers the stop, then waits without
    /// a deadline for the listener to drain.
    pub fn shutdown_job(&self, name: &'static str) -> Job {
        let pair = self.clone();
        Job::new(name, move |token| async move {
            token.cancelled().await;
            tracing::info!(job = name, "Graceful stop requested");
            pair.trigger();
            pair.drained().await;
            tracing::info!(job = name, "Listener drained");
            Ok(())
        })
    }
}
