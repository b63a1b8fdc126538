//! Observability System
//!
//! Structured logging and metrics collection for the trace engine, tutor,
//! and HTTP API. Health endpoints live in the server module next to the
//! routes they report on.

pub mod logging;
pub mod metrics;

// Re-export for convenience
pub use logging::{init_default_logging, init_logging, LogFormat};
pub use metrics::{metrics, MetricsCollector, MetricsSnapshot};
