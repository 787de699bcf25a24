//! Ticket purchase handler.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::purchase::{self, CheckoutResponse, PurchaseRequest};
use crate::state::AppState;

/// Reserve tickets and return a checkout URL.
///
/// The response confirms only that a checkout session is open; the ticket is
/// issued when the payment webhook arrives.
pub async fn purchase_tickets(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    body: Result<Json<PurchaseRequest>, JsonRejection>,
) -> Result<Json<CheckoutResponse>, ApiError> {
    let Json(request) = body.map_err(|e| {
        tracing::debug!(error = %e, "Rejected purchase body");
        ApiError::BadRequest("Invalid request body".into())
    })?;

    let response = purchase::purchase(&state, auth.user_id, request).await?;
    Ok(Json(response))
}
