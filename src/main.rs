//! trellis demo server.
//!
//! Boots the dispatch core with a small set of demonstration routes:
//! literals, a `{id}` parameter route, and a `**` assets route, with
//! rate limiting and metrics wired from config.

use std::path::PathBuf;
use std::sync::Arc;

use axum::http::{header, HeaderValue, StatusCode};
use clap::Parser;
use tokio::net::TcpListener;

use trellis::config::{load_config, ServerConfig};
use trellis::observability::{logging, metrics};
use trellis::{HttpServer, RequestContext, ResponseContext, Router};

#[derive(Parser)]
#[command(name = "trellis", about = "HTTP server toolkit demo")]
struct Args {
    /// Path to a TOML config file; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn demo_routes() -> Result<Router, trellis::RouteError> {
    let mut routes = Router::new();

    routes.get(
        "/health",
        Arc::new(|_req: &RequestContext, res: &mut ResponseContext| {
            res.set_body(b"ok".to_vec());
        }),
    )?;

    routes.get(
        "/users/{id}",
        Arc::new(|req: &RequestContext, res: &mut ResponseContext| {
            let id = req.param("id").unwrap_or("unknown");
            let body = serde_json::json!({ "id": id }).to_string();
            res.header(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            )
            .set_body(body.into_bytes());
        }),
    )?;

    routes.get(
        "/assets/**",
        Arc::new(|req: &RequestContext, res: &mut ResponseContext| {
            // Static file serving is out of scope for the demo.
            res.set_status(StatusCode::NOT_FOUND)
                .set_body(format!("no asset at {}", req.path()).into_bytes());
        }),
    )?;

    Ok(routes)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };

    logging::init(&config.observability.log_level);

    tracing::info!(
        bind_address = %config.listener.bind_address,
        rate_limit_enabled = config.rate_limit.enabled,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let routes = demo_routes()?;
    let server = HttpServer::new(config, routes);
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
