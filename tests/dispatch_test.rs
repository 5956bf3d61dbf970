//! End-to-end dispatch over a live server.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::http::{Method, StatusCode};
use trellis::{Filter, FilterChain, RequestContext, ResponseContext, Router, ServerConfig};

mod common;

fn user_routes() -> Router {
    let mut routes = Router::new();
    routes
        .get(
            "/users/{id}",
            Arc::new(|req: &RequestContext, res: &mut ResponseContext| {
                let body = serde_json::json!({ "id": req.param("id").unwrap_or("") });
                res.set_body(body.to_string().into_bytes());
            }),
        )
        .unwrap();
    routes
}

#[tokio::test]
async fn dispatches_to_matching_route_with_params() {
    let (addr, shutdown) = common::spawn_server(ServerConfig::default(), user_routes()).await;

    let response = reqwest::get(format!("http://{addr}/users/42")).await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["id"], "42");

    let response = reqwest::get(format!("http://{addr}/nowhere")).await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);

    // Deeper paths than the pattern do not match.
    let response = reqwest::get(format!("http://{addr}/users/42/extra"))
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);

    shutdown.trigger();
}

#[tokio::test]
async fn wrong_method_is_not_found() {
    let (addr, shutdown) = common::spawn_server(ServerConfig::default(), user_routes()).await;

    let client = reqwest::Client::new();
    let response = client
        .post(format!("http://{addr}/users/42"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);

    shutdown.trigger();
}

#[tokio::test]
async fn rate_limiter_rejects_second_request_with_headers() {
    let mut config = ServerConfig::default();
    config.rate_limit.enabled = true;
    config.rate_limit.capacity = 1;
    config.rate_limit.tokens_per_second = 0.001;

    let (addr, shutdown) = common::spawn_server(config, user_routes()).await;
    let client = reqwest::Client::new();

    let first = client
        .get(format!("http://{addr}/users/1"))
        .send()
        .await
        .unwrap();
    assert_eq!(first.status(), reqwest::StatusCode::OK);
    assert_eq!(first.headers().get("ratelimit-limit").unwrap(), "1");
    assert_eq!(first.headers().get("x-ratelimit-remaining").unwrap(), "0");

    let second = client
        .get(format!("http://{addr}/users/1"))
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), reqwest::StatusCode::TOO_MANY_REQUESTS);
    assert!(second.headers().contains_key("retry-after"));
    assert!(second.headers().contains_key("x-retry-after"));
    assert!(second.headers().contains_key("ratelimit-policy"));

    shutdown.trigger();
}

#[tokio::test]
async fn route_filter_can_short_circuit_before_the_handler() {
    struct Deny;
    impl Filter for Deny {
        fn apply(
            &self,
            _req: &mut RequestContext,
            res: &mut ResponseContext,
            _chain: &mut FilterChain,
        ) {
            res.set_status(StatusCode::FORBIDDEN)
                .set_body(b"denied".to_vec());
            // No advance: the handler must not run.
        }
    }

    let handled = Arc::new(AtomicBool::new(false));
    let handled_flag = handled.clone();

    let mut routes = Router::new();
    routes
        .route(
            Method::GET,
            "/private",
            Arc::new(move |_req: &RequestContext, _res: &mut ResponseContext| {
                handled_flag.store(true, Ordering::SeqCst);
            }),
            vec![Arc::new(Deny)],
        )
        .unwrap();

    let (addr, shutdown) = common::spawn_server(ServerConfig::default(), routes).await;

    let response = reqwest::get(format!("http://{addr}/private")).await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::FORBIDDEN);
    assert_eq!(response.text().await.unwrap(), "denied");
    assert!(!handled.load(Ordering::SeqCst));

    shutdown.trigger();
}

#[tokio::test]
async fn oversized_body_is_rejected_before_dispatch() {
    let mut config = ServerConfig::default();
    config.listener.max_body_size = 64;

    let mut routes = Router::new();
    routes
        .route(
            Method::POST,
            "/upload",
            Arc::new(|req: &RequestContext, res: &mut ResponseContext| {
                res.set_body(req.body().len().to_string().into_bytes());
            }),
            Vec::new(),
        )
        .unwrap();

    let (addr, shutdown) = common::spawn_server(config, routes).await;
    let client = reqwest::Client::new();

    let small = client
        .post(format!("http://{addr}/upload"))
        .body("hello")
        .send()
        .await
        .unwrap();
    assert_eq!(small.status(), reqwest::StatusCode::OK);
    assert_eq!(small.text().await.unwrap(), "5");

    let big = client
        .post(format!("http://{addr}/upload"))
        .body(vec![0u8; 4096])
        .send()
        .await
        .unwrap();
    assert_eq!(big.status(), reqwest::StatusCode::PAYLOAD_TOO_LARGE);

    shutdown.trigger();
}

#[tokio::test]
async fn double_wildcard_route_serves_any_depth() {
    let mut routes = Router::new();
    routes
        .get(
            "/assets/**",
            Arc::new(|req: &RequestContext, res: &mut ResponseContext| {
                res.set_body(req.path().as_bytes().to_vec());
            }),
        )
        .unwrap();

    let (addr, shutdown) = common::spawn_server(ServerConfig::default(), routes).await;

    for path in ["/assets", "/assets/x", "/assets/x/y/z"] {
        let response = reqwest::get(format!("http://{addr}{path}")).await.unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK, "path {path}");
        assert_eq!(response.text().await.unwrap(), path);
    }

    shutdown.trigger();
}
