//! Process lifecycle: startup ordering and graceful shutdown.
//!
//! # Design Decisions
//! - Routes are registered and frozen before the listener accepts traffic
//! - Shutdown is broadcast; long-running tasks subscribe and drain

pub mod shutdown;

pub use shutdown::Shutdown;
