//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define proxy metrics (requests, latency, backend operations)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `modgate_requests_total` (counter): requests by method, outcome, status
//! - `modgate_request_duration_seconds` (histogram): latency distribution
//! - `modgate_backend_operations_total` (counter): store calls by operation, outcome
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - Labels are low-cardinality (no module paths)

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one translated request.
pub fn record_request(method: &str, outcome: &'static str, status: u16, start: Instant) {
    metrics::counter!(
        "modgate_requests_total",
        "method" => method.to_string(),
        "outcome" => outcome,
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("modgate_request_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}

/// Record one call against a package store.
pub fn record_backend_operation(operation: &'static str, outcome: &'static str) {
    metrics::counter!(
        "modgate_backend_operations_total",
        "operation" => operation,
        "outcome" => outcome
    )
    .increment(1);
}
