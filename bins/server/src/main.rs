//! oneshot relay server
//!
//! Main entry point: accepts uploads and serves each one exactly once.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use oneshot_api::{AppState, create_router};
use oneshot_core::storage::{StorageConfig, StorageProvider, StorageService};
use oneshot_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing (LOG_FORMAT=json for structured output)
    let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "oneshot=debug,tower_http=debug".into()),
        )
        .with(json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json_logs).then(tracing_subscriber::fmt::layer))
        .init();

    // Load configuration
    let config = AppConfig::load().context("Failed to load configuration")?;

    // Prepare storage
    std::fs::create_dir_all(&config.upload_dir).with_context(|| {
        format!(
            "Failed to create upload directory {}",
            config.upload_dir.display()
        )
    })?;
    let storage = StorageService::from_config(StorageConfig::new(StorageProvider::local_fs(
        config.upload_dir.clone(),
    )))?;
    info!(
        provider = storage.provider_name(),
        upload_dir = %config.upload_dir.display(),
        "Storage ready"
    );

    info!(
        max_file_size = config.max_file_size,
        allowed_types = config.allowed_types.len(),
        exclusive_downloads = config.exclusive_downloads,
        "Upload policy configured"
    );

    // Create application state
    let addr = config.bind_address();
    let (state, cleanup) = AppState::assemble(config, Arc::new(storage));

    // Create router
    let app = create_router(state);

    // Start server
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!(pending = cleanup.pending(), "Draining cleanup queue");
    cleanup.shutdown().await;
    info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
