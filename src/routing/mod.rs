//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Registration (at startup):
//!     "GET /users/{id}"
//!     → segment.rs (split + validate pattern)
//!     → trie.rs (insert nodes per segment)
//!     → Frozen behind Arc once traffic starts
//!
//! Incoming Request (method, decoded path):
//!     → router.rs (method-indexed trie lookup)
//!     → trie.rs (literal → param → * → ** with backtracking)
//!     → Return: RouteMatch (handler, filters, params) or NoMatch
//! ```
//!
//! # Design Decisions
//! - Routes registered at startup, immutable at runtime (no locks on lookup)
//! - No regex in hot path; pattern validation happens once at registration
//! - Deterministic precedence: literal beats param beats `*` beats `**`
//! - Explicit NoMatch (`Option::None`) rather than silent default

pub mod router;
pub mod segment;
pub mod trie;

pub use router::{RouteMatch, Router};
pub use segment::{request_segments, Segment};
pub use trie::Endpoint;

use thiserror::Error;

/// Errors raised during route registration.
///
/// All variants are fatal to the registration call that raised them and
/// leave previously registered routes intact.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("invalid route syntax in segment '{segment}' of path '{path}'")]
    Syntax { segment: String, path: String },

    #[error("invalid path parameter '{segment}' in path '{path}'")]
    InvalidParam { segment: String, path: String },

    #[error("duplicate path parameter '{name}' in path '{path}'")]
    DuplicateParam { name: String, path: String },

    #[error("parameter '{requested}' conflicts with existing parameter '{existing}' at the same position in path '{path}'")]
    ParamConflict {
        requested: String,
        existing: String,
        path: String,
    },

    #[error("duplicate route: {method} {path}")]
    DuplicateRoute { method: String, path: String },
}
