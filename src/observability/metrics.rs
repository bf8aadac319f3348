//! Metrics collection and exposition.
//!
//! # Metrics
//! - `panel_requests_total` (counter): total requests by method, status, route
//! - `panel_request_duration_seconds` (histogram): latency distribution
//! - `panel_channel_connections` (gauge): open push-channel connections
//!
//! # Design Decisions
//! - Low-overhead metric updates (atomic operations)
//! - Labels for route, method, status code
//! - Exposition endpoint is optional and bound separately from the server

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and exposition endpoint.
///
/// Failure is logged, not fatal: the server runs fine without metrics.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(error = %e, "Failed to start metrics endpoint"),
    }
}

/// Record one completed request.
pub fn record_request(method: &str, status: u16, route: &str, start: Instant) {
    metrics::counter!(
        "panel_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "route" => route.to_string(),
    )
    .increment(1);
    metrics::histogram!(
        "panel_request_duration_seconds",
        "method" => method.to_string(),
        "route" => route.to_string(),
    )
    .record(start.elapsed().as_secs_f64());
}

/// Track push-channel connection count.
pub fn channel_connections(delta: i64) {
    metrics::gauge!("panel_channel_connections").increment(delta as f64);
}
