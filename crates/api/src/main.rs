//! Slotwise - availability and group coordination service
//!
//! Main entry point for the HTTP service.

use std::sync::Arc;

use slotwise_api::{app, AppContext};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging FIRST so we can see .env loading
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "slotwise=info,axum=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables from .env file
    match dotenvy::dotenv() {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(_) => warn!("no .env file found"),
    }

    let ctx = Arc::new(AppContext::new().await?);
    info!(
        sweeping = ctx.sweeping(),
        read_ceiling = ctx.config.quota.read_ceiling,
        "context initialized"
    );

    let listener = TcpListener::bind(&ctx.config.server.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app(Arc::clone(&ctx)))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    ctx.shutdown().await?;
    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for the shutdown signal");
        return;
    }
    info!("shutdown signal received");
}
