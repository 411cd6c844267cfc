//! groupcast - line-based group broadcast relay.

mod config;
mod error;
mod handlers;
mod http;
mod metrics;
mod network;
mod state;

use crate::config::{Config, ConfigSource, DEFAULT_PORT};
use crate::network::Gateway;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    // Load configuration
    let (config, source) = Config::from_args(std::env::args().skip(1)).map_err(|e| {
        error!(error = %e, "Failed to load config");
        e
    })?;

    match &source {
        ConfigSource::Defaults => info!(port = DEFAULT_PORT, "No port given, using default"),
        ConfigSource::Port(port) => info!(port, "Using port from command line"),
        ConfigSource::InvalidPort(arg) => {
            warn!(argument = %arg, port = DEFAULT_PORT, "Invalid port argument, using default")
        }
        ConfigSource::File(path) => info!(path = %path.display(), "Loaded config file"),
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        listen = %config.listen.address,
        "Starting groupcast"
    );

    // Start the metrics endpoint if configured
    if let Some(port) = config.metrics_port() {
        metrics::init();
        tokio::spawn(http::run_http_server(port));
    }

    let gateway = Gateway::bind(&config).await?;
    info!(addr = %gateway.local_addr()?, "Accepting connections");

    gateway
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
            info!("Shutdown signal received");
        })
        .await
}
