//! Chapa webhook handler.

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;

use crate::chapa::WebhookNotification;
use crate::crypto::verify_signature;
use crate::error::ApiError;
use crate::reconcile::{self, reported_amount};
use crate::state::AppState;

/// Headers Chapa may carry the body signature in.
const SIGNATURE_HEADERS: [&str; 2] = ["x-chapa-signature", "chapa-signature"];

/// Webhook response.
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    /// What happened, for the gateway's delivery log.
    pub message: String,
}

impl WebhookResponse {
    fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            message: message.into(),
        })
    }
}

/// Handle Chapa payment notifications.
///
/// Always 200 unless issuance hit a store failure, which returns 500 so the
/// gateway redelivers.
pub async fn chapa_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<WebhookResponse>, ApiError> {
    // Verify signature if webhook_secret is configured
    if let Some(secret) = &state.config.chapa_webhook_secret {
        let signature = SIGNATURE_HEADERS
            .iter()
            .find_map(|name| headers.get(*name).and_then(|v| v.to_str().ok()))
            .ok_or_else(|| {
                tracing::warn!("Chapa webhook without signature");
                ApiError::Unauthorized
            })?;

        if !verify_signature(secret, body.as_bytes(), signature) {
            tracing::warn!("Invalid Chapa webhook signature");
            return Err(ApiError::Unauthorized);
        }
    } else {
        // Trust rests on cross-checking the reference against stored state.
        // AppState warns about the missing secret once at startup.
        tracing::debug!("Chapa webhook_secret not configured - skipping signature verification");
    }

    let notification: WebhookNotification = match serde_json::from_str(&body) {
        Ok(n) => n,
        Err(e) => {
            tracing::warn!(error = %e, "Unparseable Chapa webhook body");
            return Ok(WebhookResponse::new("Invalid webhook data"));
        }
    };

    tracing::info!(
        tx_ref = %notification.tx_ref,
        status = %notification.status,
        amount = %reported_amount(&notification),
        gateway_reference = ?notification.reference,
        "Received Chapa webhook"
    );

    let outcome = reconcile::handle_notification(state.store.as_ref(), &notification)
        .await
        .map_err(|e| ApiError::Internal {
            public: "Failed to issue ticket".into(),
            detail: e.to_string(),
        })?;

    Ok(WebhookResponse::new(outcome.message()))
}
