//! Route lookup and dispatch table.
//!
//! # Responsibilities
//! - Hold one segment trie per HTTP method
//! - Validate and register routes at startup
//! - Resolve (method, path) to a handler, filters, and extracted params
//!
//! # Design Decisions
//! - Immutable after construction; shared behind `Arc` without locks
//! - Registration fails fast, before any traffic, and never corrupts
//!   previously registered routes
//! - Explicit NoMatch rather than silent default

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::Method;

use crate::pipeline::{Filter, Handler};
use crate::routing::segment::{parse_route, request_segments};
use crate::routing::trie::{Endpoint, Node};
use crate::routing::RouteError;

/// Result of a successful route lookup.
pub struct RouteMatch {
    /// Handler and ordered filters of the matched route.
    pub endpoint: Endpoint,
    /// Parameter name → extracted segment text.
    pub params: HashMap<String, String>,
}

/// Method-indexed routing table over segment tries.
#[derive(Default)]
pub struct Router {
    trees: HashMap<Method, Node>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route pattern with its handler and ordered filters.
    ///
    /// Patterns support literal segments, `{name}` parameters, `*` and a
    /// trailing `**`. Fails with [`RouteError`] on malformed patterns,
    /// duplicate parameter names, conflicting parameter bindings, or a
    /// duplicate (method, path) registration.
    pub fn route(
        &mut self,
        method: Method,
        path: &str,
        handler: Arc<dyn Handler>,
        filters: Vec<Arc<dyn Filter>>,
    ) -> Result<(), RouteError> {
        let segments = parse_route(path)?;
        let endpoint = Endpoint { handler, filters };
        self.trees
            .entry(method.clone())
            .or_default()
            .register(method.as_str(), &segments, endpoint)
    }

    /// Convenience registration for a filterless GET route.
    pub fn get(&mut self, path: &str, handler: Arc<dyn Handler>) -> Result<(), RouteError> {
        self.route(Method::GET, path, handler, Vec::new())
    }

    /// Resolve a request against the registered routes.
    ///
    /// `path` must already be percent-decoded. Returns `None` when no route
    /// matches; the caller is expected to answer "not found".
    pub fn resolve(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        let tree = self.trees.get(method)?;
        let segments = request_segments(path);
        let mut params = HashMap::new();
        let node = tree.find(&segments, 0, &mut params)?;
        let endpoint = node.endpoint()?.clone();
        Some(RouteMatch { endpoint, params })
    }
}
