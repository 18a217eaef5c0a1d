//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define dispatch and request metrics
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `front_dispatch_total` (counter): invoked operations by handler, operation
//! - `front_dispatch_fallback_total` (counter): default substitutions by kind
//! - `front_dispatch_halted_total` (counter): construction halts by handler
//! - `front_requests_total` (counter): responses by status
//! - `front_request_duration_seconds` (histogram): latency distribution
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed, so tests need no setup
//! - Handler and operation labels are registry names, never raw input

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape endpoint on `addr`.
///
/// Must be called from within a tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_dispatch(handler: &'static str, operation: &'static str) {
    ::metrics::counter!("front_dispatch_total", "handler" => handler, "operation" => operation).increment(1);
}

/// `kind` is `"handler"` or `"operation"`.
pub fn record_fallback(kind: &'static str) {
    ::metrics::counter!("front_dispatch_fallback_total", "kind" => kind).increment(1);
}

pub fn record_halt(handler: &'static str) {
    ::metrics::counter!("front_dispatch_halted_total", "handler" => handler).increment(1);
}

pub fn record_request(status: u16, start: Instant) {
    ::metrics::counter!("front_requests_total", "status" => status.to_string()).increment(1);
    ::metrics::histogram!("front_request_duration_seconds").record(start.elapsed().as_secs_f64());
}
