//! debrid-tracker server binary
//!
//! Loads configuration from the environment (and an optional `.env` file),
//! then runs the reconciler and the REST API until SIGINT or SIGTERM.

use debrid_tracker::{Config, DebridTracker, run_with_shutdown};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("debrid_tracker=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;
    if config.debrid.api_key.is_none() {
        warn!("REAL_DEBRID_API_KEY is not set; submissions will be rejected and torrents will not be refreshed");
    }

    info!(version = env!("CARGO_PKG_VERSION"), "Starting debrid-tracker");

    let tracker = Arc::new(DebridTracker::new(config).await?);
    let reconciler = tracker.spawn_reconciler();
    let api = tracker.spawn_api_server();

    run_with_shutdown(tracker.clone()).await?;

    if let Err(e) = reconciler.await {
        error!(error = %e, "Reconciler task failed");
    }
    match api.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!(error = %e, "API server failed"),
        Err(e) => error!(error = %e, "API server task failed"),
    }

    info!("Shutdown complete");
    Ok(())
}
