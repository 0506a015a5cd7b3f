//! TunnelCUSPI Service - HTTP bridge from CUSPI into SICAR
//!
//! This is the main entry point for the tunnel service.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tunnel_service::{create_router, AppState, ServiceConfig};
use tunnel_store::{MemoryStore, MySqlStore, Store};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tunnel=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting TunnelCUSPI Service");

    // Load configuration from environment
    let config = ServiceConfig::from_env();

    tracing::info!(
        listen_addr = %config.listen_addr,
        database_configured = %config.database_url.is_some(),
        api_key_configured = %config.api_key.is_some(),
        void_rule = ?config.void_rule,
        backup_dir = %config.backup.backup_dir.display(),
        "Service configuration loaded"
    );

    let store: Arc<dyn Store> = match &config.database_url {
        Some(url) => {
            tracing::info!(max_connections = config.db_max_connections, "Connecting to SICAR database");
            Arc::new(MySqlStore::connect(url, config.db_max_connections).await?)
        }
        None => {
            tracing::warn!("DATABASE_URL not set - using the in-memory store, nothing is persisted");
            Arc::new(MemoryStore::new())
        }
    };

    // Build app state
    let state = AppState::new(store, config.clone());

    // Create the router
    let app = create_router(state);
    tracing::info!("Router configured with all API endpoints");

    // Start HTTP server
    tracing::info!(listen_addr = %config.listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
