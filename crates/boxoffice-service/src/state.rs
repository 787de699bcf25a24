//! Application state.

use std::sync::Arc;
use std::time::Duration;

use boxoffice_store::{ReservationStore, UserDirectory};

use crate::chapa::ChapaClient;
use crate::config::ServiceConfig;

/// Application state shared across handlers.
///
/// Holds injected handles only; all coordination between requests goes
/// through the store.
#[derive(Clone)]
pub struct AppState {
    /// Reservations, sales, and tickets.
    pub store: Arc<dyn ReservationStore>,

    /// Read-only user contact lookup.
    pub users: Arc<dyn UserDirectory>,

    /// Service configuration.
    pub config: ServiceConfig,

    /// Chapa client for checkout sessions (optional).
    pub chapa: Option<Arc<ChapaClient>>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(
        store: Arc<dyn ReservationStore>,
        users: Arc<dyn UserDirectory>,
        config: ServiceConfig,
    ) -> Self {
        let chapa = config.chapa_secret.as_ref().and_then(|key| {
            match ChapaClient::new(
                key,
                &config.chapa_base_url,
                Duration::from_secs(config.gateway_timeout_seconds),
            ) {
                Ok(client) => {
                    tracing::info!(base_url = %config.chapa_base_url, "Chapa integration enabled");
                    Some(Arc::new(
                        client
                            .with_currency(&config.currency)
                            .with_default_urls(&config.chapa_callback_url, &config.chapa_return_url),
                    ))
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to create Chapa client");
                    None
                }
            }
        });

        if chapa.is_none() {
            tracing::warn!("Chapa not configured - purchases will fail");
        }

        if config.chapa_webhook_secret.is_none() {
            tracing::warn!(
                "CHAPA_WEBHOOK_SECRET not set - webhooks are accepted without signature checks"
            );
        }

        Self {
            store,
            users,
            config,
            chapa,
        }
    }
}
