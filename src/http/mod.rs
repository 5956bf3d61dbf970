//! HTTP server glue around the dispatch core.
//!
//! # Data Flow
//! ```text
//! Incoming connection (axum/hyper)
//!     → request.rs (ensure x-request-id)
//!     → server.rs dispatch (route lookup, body cap)
//!     → pipeline (filters, handler)
//!     → ResponseContext rendered back to the wire
//! ```
//!
//! # Design Decisions
//! - The core never touches the wire: this module owns all serialization
//! - Catch-all axum route; trellis routing decides matches, not axum
//! - 404 on no match, 413 on body overflow — both before any filter runs

pub mod request;
pub mod server;

pub use request::RequestIdLayer;
pub use server::HttpServer;
