use anyhow::Context;
use clap::Parser;
use tandem_server::ServerConfig;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = ServerConfig::parse();
    if config.allow_any_origin {
        warn!("Accepting connections from any origin");
    } else {
        info!("Allowed origins: {}", config.allowed_origins.join(", "));
    }

    tandem_server::run(config, shutdown_signal())
        .await
        .context("signaling server failed")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
