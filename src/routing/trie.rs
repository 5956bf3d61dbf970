//! Segment trie with backtracking lookup.
//!
//! # Responsibilities
//! - Store one node per registered path segment
//! - Register (segments, handler, filters) routes, rejecting duplicates
//! - Look up request segments with deterministic precedence
//!
//! # Design Decisions
//! - Fully owned recursive nodes; child maps are plain `HashMap` because the
//!   trie is built at startup and only read afterwards
//! - Precedence at every node: literal, then parameter, then `*`, then `**` —
//!   most specific wins, the blanket `**` is tried last
//! - Parameter bindings are restored exactly when a branch fails, so a match
//!   never carries bindings from abandoned attempts
//! - `**` tries every remaining suffix shortest-first and only ever yields a
//!   terminal node

use std::collections::HashMap;
use std::sync::Arc;

use crate::pipeline::{Filter, Handler};
use crate::routing::segment::{pattern_of, Segment};
use crate::routing::RouteError;

/// Terminal payload of a registered route.
#[derive(Clone)]
pub struct Endpoint {
    pub handler: Arc<dyn Handler>,
    pub filters: Vec<Arc<dyn Filter>>,
}

/// One trie node, corresponding to one path segment position.
#[derive(Default)]
pub(crate) struct Node {
    literals: HashMap<String, Node>,
    param: Option<ParamChild>,
    wildcard: Option<Box<Node>>,
    double_wildcard: Option<Box<Node>>,
    endpoint: Option<Endpoint>,
}

struct ParamChild {
    name: String,
    node: Box<Node>,
}

impl Node {
    /// Walk or create nodes for each segment and attach the endpoint.
    ///
    /// Existing parameter and wildcard children are reused; a parameter child
    /// reused under a different name is rejected rather than silently
    /// rebound. Intermediate nodes created before a failure remain in the
    /// trie, which is harmless: they carry no endpoint and are reused by
    /// later registrations.
    pub(crate) fn register(
        &mut self,
        method: &str,
        segments: &[Segment],
        endpoint: Endpoint,
    ) -> Result<(), RouteError> {
        let mut node = self;

        for segment in segments {
            node = match segment {
                Segment::Literal(text) => node.literals.entry(text.clone()).or_default(),
                Segment::Param(name) => {
                    let child = node.param.get_or_insert_with(|| ParamChild {
                        name: name.clone(),
                        node: Box::default(),
                    });
                    if child.name != *name {
                        return Err(RouteError::ParamConflict {
                            requested: name.clone(),
                            existing: child.name.clone(),
                            path: pattern_of(segments),
                        });
                    }
                    child.node.as_mut()
                }
                Segment::Wildcard => node.wildcard.get_or_insert_with(Box::default).as_mut(),
                Segment::DoubleWildcard => {
                    node.double_wildcard.get_or_insert_with(Box::default).as_mut()
                }
            };
        }

        if node.endpoint.is_some() {
            return Err(RouteError::DuplicateRoute {
                method: method.to_string(),
                path: pattern_of(segments),
            });
        }

        node.endpoint = Some(endpoint);
        Ok(())
    }

    /// Find the terminal node matching `segments`, collecting parameter
    /// bindings into `params`.
    ///
    /// On return `params` holds exactly the bindings of the successful path,
    /// or its original contents if no route matched.
    pub(crate) fn find<'n>(
        &'n self,
        segments: &[&str],
        index: usize,
        params: &mut HashMap<String, String>,
    ) -> Option<&'n Node> {
        if index == segments.len() {
            if self.endpoint.is_some() {
                return Some(self);
            }
            // A trailing `**` matches the empty suffix.
            return self.find_double_wildcard(segments, index, params);
        }

        if let Some(child) = self.literals.get(segments[index]) {
            if let Some(found) = child.find(segments, index + 1, params) {
                return Some(found);
            }
        }

        if let Some(child) = &self.param {
            let previous = params.insert(child.name.clone(), segments[index].to_string());
            if let Some(found) = child.node.find(segments, index + 1, params) {
                return Some(found);
            }
            // Failed branch: restore the binding to its exact prior state.
            match previous {
                Some(value) => params.insert(child.name.clone(), value),
                None => params.remove(&child.name),
            };
        }

        if let Some(child) = &self.wildcard {
            if let Some(found) = child.find(segments, index + 1, params) {
                return Some(found);
            }
        }

        self.find_double_wildcard(segments, index, params)
    }

    /// Match `**` against every suffix starting at `index`, shortest first.
    fn find_double_wildcard<'n>(
        &'n self,
        segments: &[&str],
        index: usize,
        params: &mut HashMap<String, String>,
    ) -> Option<&'n Node> {
        let child = self.double_wildcard.as_deref()?;
        for start in index..=segments.len() {
            if let Some(found) = child.find(segments, start, params) {
                return Some(found);
            }
        }
        None
    }

    pub(crate) fn endpoint(&self) -> Option<&Endpoint> {
        self.endpoint.as_ref()
    }
}
