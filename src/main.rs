//! OCSF Telemetry - Binary Entry Point
//!
//! Serves the telemetry pipeline over HTTP.

use std::sync::Arc;

use ocsf_telemetry::api::{create_router, AppState};
use ocsf_telemetry::{Config, SyntheticGenerator};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ocsf_telemetry=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    info!(
        chunk_size = config.chunk_size,
        max_records = config.max_records,
        "Starting ocsf-telemetry v{}",
        ocsf_telemetry::VERSION
    );

    let state = Arc::new(AppState::from_config(&config, Arc::new(SyntheticGenerator)));
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!("Listening on http://{}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
