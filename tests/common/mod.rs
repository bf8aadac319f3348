//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use printdeck::config::ServerConfig;
use printdeck::plugins::ExtensionRegistry;
use printdeck::Server;

/// Build a config rooted in a scratch directory, bound to the given port.
pub fn test_config(dir: &Path, port: u16) -> ServerConfig {
    let mut config = ServerConfig::default();
    config.server.host = "127.0.0.1".to_string();
    config.server.port = port;
    config.server.secret_key = "integration-test-secret".to_string();
    config.folders.uploads = dir.join("uploads");
    config.folders.timelapse = dir.join("timelapse");
    config.folders.logs = dir.join("logs");
    config.folders.watched = dir.join("watched");
    config.folders.slicing_profiles = dir.join("slicing_profiles");
    config.observability.metrics_enabled = false;
    config
}

/// Spawn a full server in the background and wait until it accepts
/// connections.
pub async fn spawn_server(config: ServerConfig, extensions: ExtensionRegistry) -> SocketAddr {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .unwrap();

    let server = Server::new(extensions)
        .with_config(config)
        .with_allow_root(true);
    tokio::spawn(async move {
        if let Err(e) = server.run().await {
            eprintln!("test server failed: {e}");
        }
    });

    // Poll until the listener is up rather than sleeping a fixed interval.
    for _ in 0..100 {
        if tokio::net::TcpStream::connect(addr).await.is_ok() {
            return addr;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("server did not come up on {addr}");
}

/// A client that never routes through a proxy and keeps no pooled
/// connections between tests.
#[allow(dead_code)]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
