//! Filter chain execution.
//!
//! # Responsibilities
//! - Run the ordered filters of a route, then the terminal handler
//! - Let each filter decide whether processing continues
//!
//! # Design Decisions
//! - The cursor advances before the filter is invoked, so a filter calling
//!   `advance` continues past itself instead of re-entering its own position
//! - The handler runs at most once; a stray `advance` from inside the
//!   handler is a no-op
//! - A filter that returns without calling `advance` stops the request —
//!   no later filter and no handler runs

use std::sync::Arc;

use crate::pipeline::{RequestContext, ResponseContext};

/// Terminal request handler, invoked after all filters have advanced.
pub trait Handler: Send + Sync {
    fn handle(&self, req: &RequestContext, res: &mut ResponseContext);
}

impl<F> Handler for F
where
    F: Fn(&RequestContext, &mut ResponseContext) + Send + Sync,
{
    fn handle(&self, req: &RequestContext, res: &mut ResponseContext) {
        self(req, res)
    }
}

/// Middleware unit in the request pipeline.
///
/// A filter may inspect or mutate the request and response, and continues
/// processing only by calling [`FilterChain::advance`]. Not calling it is
/// the sanctioned way to short-circuit (e.g. rate limiting, auth).
pub trait Filter: Send + Sync {
    fn apply(&self, req: &mut RequestContext, res: &mut ResponseContext, chain: &mut FilterChain);
}

/// Per-request execution chain over an ordered filter list and a handler.
///
/// Each instance serves exactly one logical request and owns a single
/// cursor; it must not be reused or shared across requests.
pub struct FilterChain<'a> {
    filters: &'a [Arc<dyn Filter>],
    handler: &'a dyn Handler,
    cursor: usize,
    handled: bool,
}

impl<'a> FilterChain<'a> {
    pub fn new(filters: &'a [Arc<dyn Filter>], handler: &'a dyn Handler) -> Self {
        Self {
            filters,
            handler,
            cursor: 0,
            handled: false,
        }
    }

    /// Continue the chain: invoke the next filter, or the handler once all
    /// filters are exhausted.
    pub fn advance(&mut self, req: &mut RequestContext, res: &mut ResponseContext) {
        if self.cursor < self.filters.len() {
            let filter = Arc::clone(&self.filters[self.cursor]);
            self.cursor += 1;
            filter.apply(req, res, self);
        } else if !self.handled {
            self.handled = true;
            self.handler.handle(req, res);
        }
    }

    /// Drive the chain from the start. Consumes the chain: one run per
    /// request.
    pub fn run(mut self, req: &mut RequestContext, res: &mut ResponseContext) {
        self.advance(req, res);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Method;
    use std::sync::Mutex;

    /// Filter that records its tag and optionally stops the chain.
    struct Recording {
        tag: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
        proceed: bool,
    }

    impl Filter for Recording {
        fn apply(
            &self,
            req: &mut RequestContext,
            res: &mut ResponseContext,
            chain: &mut FilterChain,
        ) {
            self.log.lock().unwrap().push(self.tag);
            if self.proceed {
                chain.advance(req, res);
            }
        }
    }

    fn harness(
        specs: &[(&'static str, bool)],
    ) -> (Vec<Arc<dyn Filter>>, Arc<dyn Handler>, Arc<Mutex<Vec<&'static str>>>) {
        let log: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));
        let filters: Vec<Arc<dyn Filter>> = specs
            .iter()
            .map(|&(tag, proceed)| {
                Arc::new(Recording {
                    tag,
                    log: log.clone(),
                    proceed,
                }) as Arc<dyn Filter>
            })
            .collect();
        let handler_log = log.clone();
        let handler: Arc<dyn Handler> =
            Arc::new(move |_req: &RequestContext, _res: &mut ResponseContext| {
                handler_log.lock().unwrap().push("handler");
            });
        (filters, handler, log)
    }

    fn run(filters: &[Arc<dyn Filter>], handler: &Arc<dyn Handler>) {
        let mut req = RequestContext::new(Method::GET, "/test");
        let mut res = ResponseContext::new();
        FilterChain::new(filters, handler.as_ref()).run(&mut req, &mut res);
    }

    #[test]
    fn filters_run_in_registration_order_then_handler() {
        let (filters, handler, log) = harness(&[("one", true), ("two", true), ("three", true)]);
        run(&filters, &handler);
        assert_eq!(*log.lock().unwrap(), vec!["one", "two", "three", "handler"]);
    }

    #[test]
    fn empty_chain_invokes_handler_directly() {
        let (filters, handler, log) = harness(&[]);
        run(&filters, &handler);
        assert_eq!(*log.lock().unwrap(), vec!["handler"]);
    }

    #[test]
    fn non_advancing_filter_short_circuits() {
        let (filters, handler, log) = harness(&[("one", false), ("two", true)]);
        run(&filters, &handler);
        // Filter one never advanced: filter two and the handler must not run.
        assert_eq!(*log.lock().unwrap(), vec!["one"]);
    }

    #[test]
    fn handler_runs_exactly_once_despite_reentrant_advance() {
        let log: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));

        struct Reentrant {
            log: Arc<Mutex<Vec<&'static str>>>,
        }
        impl Filter for Reentrant {
            fn apply(
                &self,
                req: &mut RequestContext,
                res: &mut ResponseContext,
                chain: &mut FilterChain,
            ) {
                self.log.lock().unwrap().push("filter");
                chain.advance(req, res);
                // Second advance at an exhausted cursor must be a no-op.
                chain.advance(req, res);
            }
        }

        let filters: Vec<Arc<dyn Filter>> =
            vec![Arc::new(Reentrant { log: log.clone() }) as Arc<dyn Filter>];
        let handler_log = log.clone();
        let handler: Arc<dyn Handler> =
            Arc::new(move |_req: &RequestContext, _res: &mut ResponseContext| {
                handler_log.lock().unwrap().push("handler");
            });

        run(&filters, &handler);
        assert_eq!(*log.lock().unwrap(), vec!["filter", "handler"]);
    }

    #[test]
    fn filters_can_mutate_response_state() {
        struct Tagging;
        impl Filter for Tagging {
            fn apply(
                &self,
                req: &mut RequestContext,
                res: &mut ResponseContext,
                chain: &mut FilterChain,
            ) {
                res.header(
                    axum::http::HeaderName::from_static("x-filtered"),
                    axum::http::HeaderValue::from_static("yes"),
                );
                chain.advance(req, res);
            }
        }

        let filters: Vec<Arc<dyn Filter>> = vec![Arc::new(Tagging) as Arc<dyn Filter>];
        let handler: Arc<dyn Handler> =
            Arc::new(|_req: &RequestContext, res: &mut ResponseContext| {
                res.set_status(axum::http::StatusCode::CREATED);
            });

        let mut req = RequestContext::new(Method::POST, "/things");
        let mut res = ResponseContext::new();
        FilterChain::new(&filters, handler.as_ref()).run(&mut req, &mut res);

        assert_eq!(res.status(), axum::http::StatusCode::CREATED);
        assert_eq!(res.headers().get("x-filtered").unwrap(), "yes");
    }
}
