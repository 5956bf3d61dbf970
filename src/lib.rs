//! trellis — HTTP server toolkit
//!
//! The request-dispatch core of an HTTP server: a segment-trie router with
//! parameters and wildcards, a cooperative filter chain, and a per-client
//! token-bucket rate limiter, wrapped in thin axum serving glue.
//!
//! # Architecture Overview
//!
//! ```text
//!                  ┌──────────────────────────────────────────────┐
//!                  │                  TRELLIS                     │
//!                  │                                              │
//!   Request        │  ┌────────┐   ┌──────────┐   ┌───────────┐  │
//!   ───────────────┼─▶│  http  │──▶│ routing  │──▶│ pipeline  │  │
//!                  │  │  glue  │   │ (trie)   │   │ (filters) │  │
//!                  │  └────────┘   └──────────┘   └─────┬─────┘  │
//!                  │                                    │        │
//!                  │                             ┌──────▼──────┐ │
//!   Response       │                             │  ratelimit  │ │
//!   ◀──────────────┼─────────────────────────────│  + handler  │ │
//!                  │                             └─────────────┘ │
//!                  │                                              │
//!                  │  config · lifecycle · observability          │
//!                  └──────────────────────────────────────────────┘
//! ```

// Core subsystems
pub mod pipeline;
pub mod ratelimit;
pub mod routing;

// Serving glue and cross-cutting concerns
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::ServerConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use pipeline::{Filter, FilterChain, Handler, RequestContext, ResponseContext};
pub use ratelimit::{InMemoryTokenStorage, RateLimiter, TokenBucket, TokenStorage};
pub use routing::{RouteError, RouteMatch, Router};
