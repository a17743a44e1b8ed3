//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Record one observation per dispatch (count + latency)
//! - Expose a Prometheus-compatible scrape endpoint when enabled
//!
//! # Metrics
//! - `router_dispatches_total` (counter): dispatches by method, status, route
//! - `router_dispatch_duration_seconds` (histogram): dispatch latency
//!
//! # Design Decisions
//! - The route label is the registered pattern (or "none" for no-match),
//!   never the raw path, keeping cardinality bounded

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus exporter on the given address. Must run inside a
/// Tokio runtime. Failures are logged, not fatal: the facade degrades to
/// no-op recorders.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one finished dispatch.
pub fn record_dispatch(method: &str, status: u16, route: &str, start: Instant) {
    counter!(
        "router_dispatches_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "route" => route.to_string()
    )
    .increment(1);
    histogram!(
        "router_dispatch_duration_seconds",
        "method" => method.to_string(),
        "route" => route.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}
