//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatcher and transport adapter produce:
//!     → logging.rs (structured tracing events, correlated error records)
//!     → metrics.rs (dispatch counters and latency histogram)
//!
//! Consumers:
//!     → Log aggregation (stdout via tracing-subscriber)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - The library only emits; subscribers/exporters are installed by the
//!   host binary so embedders keep control of their own pipelines
//! - Every 500 carries the correlation id in both the log record and the
//!   client body
//! - Metric updates are cheap atomic operations behind the metrics facade

pub mod logging;
pub mod metrics;
