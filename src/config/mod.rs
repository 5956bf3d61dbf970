//! Configuration subsystem.
//!
//! # Data Flow
//! ```text
//! TOML file
//!     → loader.rs (read + parse)
//!     → validation.rs (semantic checks, all errors reported)
//!     → schema.rs types consumed by the server and rate limiter
//! ```
//!
//! # Design Decisions
//! - serde handles syntax; validation.rs handles semantics
//! - Every section has defaults, so an empty file is a valid config

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{ListenerConfig, ObservabilityConfig, RateLimitConfig, ServerConfig, TimeoutConfig};
pub use validation::{validate_config, ValidationError};
