//! Metrics collection and exposition.
//!
//! # Metrics
//! - `rpc_requests_total` (counter): inbound RPC calls by method path
//! - `supervisor_jobs_finished_total` (counter): job exits by job, outcome
//!
//! Rendered in Prometheus text format by the HTTP `/metrics` route.

use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::observability::ObservabilityError;

/// Install the global Prometheus recorder and return its render handle.
pub fn init_metrics() -> Result<PrometheusHandle, ObservabilityError> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    describe_counter!("rpc_requests_total", "Inbound RPC calls");
    describe_counter!("supervisor_jobs_finished_total", "Background jobs that returned");

    tracing::info!("Metrics recorder installed");
    Ok(handle)
}

/// Count one inbound RPC call.
pub fn record_rpc_call(path: &str) {
    counter!("rpc_requests_total", "path" => path.to_owned()).increment(1);
}

/// Count a finished supervisor job.
pub fn record_job_finished(job: &str, ok: bool) {
    let outcome = if ok { "ok" } else { "error" };
    counter!("supervisor_jobs_finished_total", "job" => job.to_owned(), "outcome" => outcome).increment(1);
}
