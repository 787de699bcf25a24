//! Purchase orchestration.
//!
//! The synchronous half of the flow: record a pending reservation, open a
//! checkout session for it, and hand the checkout URL back. Payment itself is
//! confirmed later by [`crate::reconcile`].
//!
//! The reservation is always written before the gateway is called. If the
//! gateway fails the reservation stays pending without a reference, and
//! [`reissue_checkout`] can open a session for it later.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use boxoffice_core::{
    Decimal, EventId, NewReservation, Reservation, ReservationId, ReservationStatus,
    SessionAttachment, TicketTypeId, TxRef, UserId,
};

use crate::chapa::{ChapaError, SessionRequest};
use crate::error::ApiError;
use crate::state::AppState;

/// Body of `POST /v1/tickets/purchase`.
#[derive(Debug, Clone, Deserialize)]
pub struct PurchaseRequest {
    /// Event to buy for.
    pub event_id: EventId,
    /// Ticket type to buy.
    pub ticket_id: TicketTypeId,
    /// Number of tickets.
    pub quantity: i32,
    /// Total amount to charge.
    pub amount: Decimal,
}

/// Response for a purchase or a checkout re-issue.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutResponse {
    /// Always `pending`; completion arrives via webhook.
    pub status: ReservationStatus,
    /// The reservation to poll.
    pub reservation_id: ReservationId,
    /// Where to send the buyer.
    pub checkout_url: String,
    /// When the reservation was recorded.
    pub created_at: DateTime<Utc>,
}

/// Reserve tickets and open a checkout session.
pub async fn purchase(
    state: &AppState,
    user_id: UserId,
    request: PurchaseRequest,
) -> Result<CheckoutResponse, ApiError> {
    let new = NewReservation::new(
        request.event_id,
        request.ticket_id,
        user_id,
        request.quantity,
        request.amount,
    )?;

    let reservation = state.store.create(&new).await?;

    tracing::info!(
        reservation_id = %reservation.id,
        user_id = %user_id,
        event_id = %reservation.event_id,
        amount = %reservation.amount,
        "Reservation created"
    );

    let checkout_url = open_checkout(state, &reservation).await?;

    Ok(CheckoutResponse {
        status: ReservationStatus::Pending,
        reservation_id: reservation.id,
        checkout_url,
        created_at: reservation.created_at,
    })
}

/// Return a checkout URL for one of the caller's pending reservations.
///
/// Reuses the stored session when there is one; otherwise opens a new one.
pub async fn reissue_checkout(
    state: &AppState,
    user_id: UserId,
    reservation_id: ReservationId,
) -> Result<CheckoutResponse, ApiError> {
    let reservation = owned_reservation(state, user_id, reservation_id).await?;

    if !reservation.is_pending() {
        return Err(ApiError::Conflict("Reservation already completed".into()));
    }

    let checkout_url = match &reservation.checkout_url {
        Some(url) if reservation.has_session() => url.clone(),
        _ => open_checkout(state, &reservation).await?,
    };

    Ok(CheckoutResponse {
        status: ReservationStatus::Pending,
        reservation_id: reservation.id,
        checkout_url,
        created_at: reservation.created_at,
    })
}

/// Load a reservation, hiding other users' reservations as not found.
pub async fn owned_reservation(
    state: &AppState,
    user_id: UserId,
    reservation_id: ReservationId,
) -> Result<Reservation, ApiError> {
    state
        .store
        .get(reservation_id)
        .await?
        .filter(|r| r.user_id == user_id)
        .ok_or_else(|| ApiError::NotFound(format!("reservation not found: {reservation_id}")))
}

/// Open a gateway session for a reservation and attach it.
async fn open_checkout(state: &AppState, reservation: &Reservation) -> Result<String, ApiError> {
    let chapa = state
        .chapa
        .as_ref()
        .ok_or_else(|| ChapaError::Configuration("Chapa is not configured".into()))?;

    let email = contact_email(state, reservation.user_id).await;
    let tx_ref = TxRef::stamped_at(reservation.event_id, reservation.user_id, Utc::now()).encode();

    let session = chapa
        .open_session(&SessionRequest {
            amount: reservation.amount,
            email,
            first_name: format!("user-{}", reservation.user_id),
            last_name: "buyer".into(),
            tx_ref: tx_ref.clone(),
            callback_url: None,
            return_url: None,
        })
        .await
        .map_err(|e| {
            tracing::warn!(
                reservation_id = %reservation.id,
                tx_ref = %tx_ref,
                error = %e,
                "Checkout session failed; reservation left pending"
            );
            e
        })?;

    state
        .store
        .attach_reference(
            reservation.id,
            &SessionAttachment {
                tx_ref: tx_ref.clone(),
                checkout_url: session.checkout_url.clone(),
                gateway_reference: session.gateway_reference.clone(),
            },
        )
        .await?;

    tracing::info!(
        reservation_id = %reservation.id,
        tx_ref = %tx_ref,
        gateway_reference = ?session.gateway_reference,
        "Checkout session attached"
    );

    Ok(session.checkout_url)
}

/// Best-effort email lookup. Failures and gaps become an empty string.
async fn contact_email(state: &AppState, user_id: UserId) -> String {
    match state.users.contact_email(user_id).await {
        Ok(Some(email)) => email,
        Ok(None) => {
            tracing::debug!(user_id = %user_id, "No contact email on file");
            String::new()
        }
        Err(e) => {
            tracing::warn!(user_id = %user_id, error = %e, "Contact email lookup failed");
            String::new()
        }
    }
}
