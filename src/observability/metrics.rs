//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method, status
//! - `gateway_request_duration_seconds` (histogram): latency distribution
//! - `gateway_security_headers_total` (counter): middleware decisions
//! - `gateway_upstream_errors_total` (counter): failed upstream calls
//! - `gateway_config_reloads_total` (counter): reloads by result
//!
//! Recording without an installed recorder is a no-op, so these helpers are
//! safe to call from tests.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::security::PathDecision;

/// Install the Prometheus recorder and its scrape listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a completed request.
pub fn record_request(method: &str, status: u16, start: Instant) {
    counter!(
        "gateway_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("gateway_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

/// Record a middleware decision; `None` means the path was filtered out.
pub fn record_security_decision(decision: Option<PathDecision>) {
    let label = decision.map_or("filtered", |d| d.as_str());
    counter!("gateway_security_headers_total", "decision" => label).increment(1);
}

pub fn record_upstream_error() {
    counter!("gateway_upstream_errors_total").increment(1);
}

pub fn record_config_reload(success: bool) {
    let result = if success { "success" } else { "failure" };
    counter!("gateway_config_reloads_total", "result" => result).increment(1);
}
