//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): forwarded requests by method, status
//! - `proxy_request_duration_seconds` (histogram): time to response headers
//! - `proxy_mirror_total` (counter): mirror attempts by outcome
//! - `proxy_websocket_sessions_active` (gauge): open relay sessions
//! - `proxy_websocket_messages_total` (counter): relayed messages by direction
//!
//! Without an installed recorder every call here is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
///
/// Must be called from within the Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    metrics::counter!(
        "proxy_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("proxy_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_mirror(outcome: &'static str) {
    metrics::counter!("proxy_mirror_total", "outcome" => outcome).increment(1);
}

pub fn websocket_session_opened() {
    metrics::gauge!("proxy_websocket_sessions_active").increment(1.0);
}

pub fn websocket_session_closed() {
    metrics::gauge!("proxy_websocket_sessions_active").decrement(1.0);
}

pub fn websocket_message_relayed(direction: &'static str) {
    metrics::counter!("proxy_websocket_messages_total", "direction" => direction).increment(1);
}
