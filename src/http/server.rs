//! HTTP server setup and request dispatch.
//!
//! # Responsibilities
//! - Create the axum Router with a catch-all dispatch handler
//! - Wire up middleware (timeout, request ID, tracing)
//! - Read and cap the request body
//! - Drive the filter chain and render the response
//! - Record request metrics
//!
//! # Design Decisions
//! - All routing decisions belong to the trellis Router; axum only feeds it
//! - Global filters (rate limiter) run before route-specific filters
//! - Graceful shutdown via Ctrl+C or a lifecycle::Shutdown handle

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
};
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ServerConfig;
use crate::http::request::RequestIdLayer;
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::pipeline::{Filter, FilterChain, RequestContext, ResponseContext};
use crate::ratelimit::RateLimiter;
use crate::routing::Router;

/// Application state injected into the dispatch handler.
#[derive(Clone)]
struct AppState {
    routes: Arc<Router>,
    global_filters: Arc<Vec<Arc<dyn Filter>>>,
    max_body_size: usize,
}

/// HTTP server wrapping the dispatch core.
pub struct HttpServer {
    app: axum::Router,
    config: ServerConfig,
    limiter: Option<Arc<RateLimiter>>,
}

impl HttpServer {
    /// Create a server over a fully registered routing table.
    ///
    /// The table is frozen here: no further registration once traffic can
    /// arrive. Must be called within a tokio runtime when rate limiting is
    /// enabled (the limiter spawns its reclamation task).
    pub fn new(config: ServerConfig, routes: Router) -> Self {
        let mut global_filters: Vec<Arc<dyn Filter>> = Vec::new();
        let mut limiter = None;

        if config.rate_limit.enabled {
            let rl = Arc::new(RateLimiter::with_idle_timeout(
                config.rate_limit.capacity,
                config.rate_limit.tokens_per_second,
                config.rate_limit.idle_timeout(),
            ));
            global_filters.push(rl.clone() as Arc<dyn Filter>);
            limiter = Some(rl);
        }

        let state = AppState {
            routes: Arc::new(routes),
            global_filters: Arc::new(global_filters),
            max_body_size: config.listener.max_body_size,
        };

        let app = Self::build_router(&config, state);
        Self {
            app,
            config,
            limiter,
        }
    }

    /// Build the axum router with all middleware layers.
    fn build_router(config: &ServerConfig, state: AppState) -> axum::Router {
        axum::Router::new()
            .route("/{*path}", any(dispatch))
            .route("/", any(dispatch))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )))
            .layer(RequestIdLayer)
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server until Ctrl+C.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let shutdown = Shutdown::new();
        let trigger = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Shutdown signal received");
                trigger.trigger();
            }
        });
        self.run_with_shutdown(listener, &shutdown).await
    }

    /// Run the server until the given shutdown handle triggers.
    pub async fn run_with_shutdown(
        self,
        listener: TcpListener,
        shutdown: &Shutdown,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self
            .app
            .into_make_service_with_connect_info::<SocketAddr>();

        let wait = {
            let shutdown = shutdown.clone();
            async move { shutdown.wait().await }
        };
        axum::serve(listener, app)
            .with_graceful_shutdown(wait)
            .await?;

        // Stop the rate limiter's background reclamation.
        if let Some(limiter) = &self.limiter {
            limiter.release();
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

/// Catch-all dispatch handler: resolve the route and drive the chain.
async fn dispatch(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        "Dispatching request"
    );

    let Some(matched) = state.routes.resolve(&method, &path) else {
        tracing::debug!(request_id = %request_id, path = %path, "No route matched");
        metrics::record_request(method.as_str(), 404, start);
        return (StatusCode::NOT_FOUND, "No matching route").into_response();
    };

    let (parts, body) = request.into_parts();
    let bytes = match axum::body::to_bytes(body, state.max_body_size).await {
        Ok(bytes) => bytes,
        Err(_) => {
            metrics::record_request(method.as_str(), 413, start);
            return (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response();
        }
    };

    let mut req = RequestContext::new(method.clone(), path)
        .with_headers(parts.headers)
        .with_remote_addr(addr)
        .with_body(bytes.to_vec());
    req.set_params(matched.params);
    let mut res = ResponseContext::new();

    // Global filters first, then the route's own, then the handler.
    let filters: Vec<Arc<dyn Filter>> = state
        .global_filters
        .iter()
        .chain(matched.endpoint.filters.iter())
        .cloned()
        .collect();
    FilterChain::new(&filters, matched.endpoint.handler.as_ref()).run(&mut req, &mut res);

    metrics::record_request(method.as_str(), res.status().as_u16(), start);

    let (status, headers, body) = res.into_parts();
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}
