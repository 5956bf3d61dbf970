//! Request pipeline: filters, handlers, and the execution chain.
//!
//! # Data Flow
//! ```text
//! Resolved route (handler, ordered filters, params)
//!     → context.rs (RequestContext / ResponseContext)
//!     → chain.rs (FilterChain drives filters, then the handler)
//!     → ResponseContext rendered by the server glue
//! ```
//!
//! # Design Decisions
//! - Chain-of-responsibility: each filter explicitly calls `advance` to
//!   continue; omitting the call is the one sanctioned way to short-circuit
//! - One chain per logical request; never reused or shared across requests
//! - Purely in-process and synchronous: no I/O, no suspension points

pub mod chain;
pub mod context;

pub use chain::{Filter, FilterChain, Handler};
pub use context::{RequestContext, ResponseContext};
