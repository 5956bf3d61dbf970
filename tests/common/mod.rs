//! Shared utilities for integration testing.

use std::net::SocketAddr;

use tokio::net::TcpListener;

use trellis::{HttpServer, Router, ServerConfig, Shutdown};

/// Start a server on an ephemeral port, returning its address and a
/// shutdown handle.
pub async fn spawn_server(config: ServerConfig, routes: Router) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = HttpServer::new(config, routes);
    let shutdown = Shutdown::new();
    let handle = shutdown.clone();
    tokio::spawn(async move {
        server.run_with_shutdown(listener, &handle).await.unwrap();
    });

    (addr, shutdown)
}
