//! In-process request and response state.
//!
//! # Responsibilities
//! - Carry the resolved request (method, decoded path, headers, remote
//!   address, extracted params, body) through the filter chain
//! - Accumulate the response (status, headers, body) being built
//!
//! # Design Decisions
//! - No wire format: serialization belongs to the server glue
//! - Header syntax is not validated here; values arrive pre-parsed

use std::collections::HashMap;
use std::net::SocketAddr;

use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};

/// The inbound request as seen by filters and handlers.
pub struct RequestContext {
    method: Method,
    path: String,
    headers: HeaderMap,
    remote_addr: Option<SocketAddr>,
    params: HashMap<String, String>,
    body: Vec<u8>,
}

impl RequestContext {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            remote_addr: None,
            params: HashMap::new(),
            body: Vec::new(),
        }
    }

    pub fn with_remote_addr(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The percent-decoded request path.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Remote peer address, when the transport provided one.
    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    /// Path parameter extracted by the router, e.g. `id` for `/users/{id}`.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    pub(crate) fn set_params(&mut self, params: HashMap<String, String>) {
        self.params = params;
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

/// The outbound response being assembled by filters and the handler.
pub struct ResponseContext {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl ResponseContext {
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Vec::new(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) -> &mut Self {
        self.status = status;
        self
    }

    /// Set a header, replacing any previous value. Chainable, so filters can
    /// stack related headers in one expression.
    pub fn header(&mut self, name: HeaderName, value: HeaderValue) -> &mut Self {
        self.headers.insert(name, value);
        self
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn set_body(&mut self, body: Vec<u8>) -> &mut Self {
        self.body = body;
        self
    }

    /// Decompose into (status, headers, body) for wire rendering.
    pub fn into_parts(self) -> (StatusCode, HeaderMap, Vec<u8>) {
        (self.status, self.headers, self.body)
    }
}

impl Default for ResponseContext {
    fn default() -> Self {
        Self::new()
    }
}
