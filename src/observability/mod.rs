//! Observability subsystem: structured logging and metrics.
//!
//! # Design Decisions
//! - tracing for structured logs; level configurable via config or env
//! - Prometheus exposition bound only when enabled in config
//! - Low-overhead metric updates on the request path

pub mod logging;
pub mod metrics;
