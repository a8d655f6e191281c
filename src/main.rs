//! readwrite-router server entry point.
//!
//! Connects the read-write and read-only pools and serves the item API.

use std::sync::Arc;

use sqlx::Any;
use tracing_subscriber::EnvFilter;

use readwrite_router::api;
use readwrite_router::app_state::AppState;
use readwrite_router::config::RoutingConfig;
use readwrite_router::routing::DataSourceRouter;
use readwrite_router::service::ItemService;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = RoutingConfig::from_env()?;
    tracing::info!(
        addr = %config.listen_addr,
        read_write = %config.read_write.redacted_url(),
        read_only = %config.read_only.redacted_url(),
        "starting readwrite-router"
    );

    // Connect both pools; any failure aborts startup
    sqlx::any::install_default_drivers();
    let router = DataSourceRouter::<Any>::connect(&config).await?;

    // Build service layer
    let item_service = Arc::new(ItemService::new(router.clone()));
    item_service.ensure_schema().await?;

    let app = api::build_app(AppState { item_service });

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    router.close().await;
    tracing::info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for ctrl-c, running until killed");
        std::future::pending::<()>().await;
    }
}
