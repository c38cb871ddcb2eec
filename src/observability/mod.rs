//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Parser, server and handlers produce:
//!     → logging.rs (structured log events, per-connection spans)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout (tracing-subscriber fmt layer)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Connection id and peer address ride on the span, not on every event
//! - Metric calls are no-ops until an exporter is installed

pub mod logging;
pub mod metrics;
