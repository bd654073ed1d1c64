//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_requests_total` (counter): relayed requests by method, status
//! - `relay_request_duration_seconds` (histogram): latency by method
//! - `relay_csrf_failures_total` (counter): requests refused for lack of a token
//! - `relay_upstream_errors_total` (counter): transport failures
//!
//! Recording is a no-op until [`init_metrics`] installs the Prometheus
//! recorder.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and serve `/metrics` on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    metrics::counter!(
        "relay_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    metrics::histogram!("relay_request_duration_seconds", "method" => method.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_csrf_failure() {
    metrics::counter!("relay_csrf_failures_total").increment(1);
}

pub fn record_upstream_error() {
    metrics::counter!("relay_upstream_errors_total").increment(1);
}
