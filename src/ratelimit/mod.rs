//! Per-client token-bucket rate limiting.
//!
//! # Data Flow
//! ```text
//! Request with remote address
//!     → limiter.rs (resolve client key, or bypass when absent)
//!     → storage.rs (get-or-create the client's bucket)
//!     → bucket.rs (refill by elapsed time, try to consume one credit)
//!     → Headers set; 429 short-circuit or chain.advance
//! ```
//!
//! # Design Decisions
//! - One mutex per active client bucket; unrelated clients never contend
//! - Buckets are policy-free: capacity and rate are supplied per call
//! - Idle buckets are reclaimed by a background task, not on the request path
//! - Rejection is steady-state behavior (429 + Retry-After), not an error

pub mod bucket;
pub mod limiter;
pub mod storage;

pub use bucket::TokenBucket;
pub use limiter::RateLimiter;
pub use storage::{InMemoryTokenStorage, TokenStorage};
