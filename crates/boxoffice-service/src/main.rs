//! Boxoffice Service - ticket purchases and Chapa payment reconciliation.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use boxoffice_service::{create_router, AppState, ServiceConfig};
use boxoffice_store::PgStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env is fine; the environment may already be populated.
    let dotenv = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,boxoffice=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Ok(path) = dotenv {
        tracing::debug!(path = %path.display(), "Loaded .env");
    }

    tracing::info!("Starting Boxoffice Service");

    let config = ServiceConfig::from_env();

    tracing::info!(
        listen_addr = %config.listen_addr,
        chapa_configured = %config.chapa_secret.is_some(),
        chapa_base_url = %config.chapa_base_url,
        webhook_signatures = %config.chapa_webhook_secret.is_some(),
        currency = %config.currency,
        "Service configuration loaded"
    );

    tracing::info!(max_connections = config.database_max_connections, "Connecting to PostgreSQL");
    let store = PgStore::connect(&config.database_url, config.database_max_connections).await?;
    store.migrate().await?;

    let store = Arc::new(store);
    let state = AppState::new(store.clone(), store, config.clone());

    let app = create_router(state);

    tracing::info!(listen_addr = %config.listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
