//! Metrics collection and exposition.
//!
//! # Metrics
//! - `http_requests_total` (counter): requests served, by method and status
//! - `http_request_duration_seconds` (histogram): read to close
//! - `http_request_errors_total` (counter): requests rejected before
//!   dispatch, by error kind
//! - `http_connections_active` (gauge): connections being served

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape listener on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record a dispatched request. `status` is 0 if the handler wrote nothing.
pub fn record_request(method: &'static str, status: u16, start: Instant) {
    counter!("http_requests_total", "method" => method, "status" => status.to_string())
        .increment(1);
    histogram!("http_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_request_error(kind: &'static str) {
    counter!("http_request_errors_total", "kind" => kind).increment(1);
}

pub fn set_active_connections(active: u64) {
    gauge!("http_connections_active").set(active as f64);
}
