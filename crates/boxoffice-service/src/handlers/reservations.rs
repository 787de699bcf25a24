//! Reservation status and checkout re-issue handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use boxoffice_core::{Decimal, EventId, ReservationId, ReservationStatus, TicketTypeId};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::purchase::{self, CheckoutResponse};
use crate::state::AppState;

/// Reservation as seen by its owner.
#[derive(Debug, Serialize)]
pub struct ReservationResponse {
    /// Reservation ID.
    pub reservation_id: ReservationId,
    /// Event.
    pub event_id: EventId,
    /// Ticket type.
    pub ticket_id: TicketTypeId,
    /// Number of tickets.
    pub quantity: i32,
    /// Amount charged.
    pub amount: Decimal,
    /// `pending` or `completed`.
    pub status: ReservationStatus,
    /// Checkout URL, once a session is open.
    pub checkout_url: Option<String>,
    /// Transaction reference, once a session is open.
    pub tx_ref: Option<String>,
    /// When the reservation was recorded.
    pub created_at: DateTime<Utc>,
    /// When payment was reconciled.
    pub completed_at: Option<DateTime<Utc>>,
    /// Issued ticket number, once completed.
    pub ticket_number: Option<String>,
}

/// Get one of the caller's reservations.
pub async fn get_reservation(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(reservation_id): Path<ReservationId>,
) -> Result<Json<ReservationResponse>, ApiError> {
    let reservation = purchase::owned_reservation(&state, auth.user_id, reservation_id).await?;

    let ticket_number = match &reservation.tx_ref {
        Some(tx_ref) if !reservation.is_pending() => state
            .store
            .ticket_for_reference(tx_ref)
            .await?
            .map(|t| t.ticket_number),
        _ => None,
    };

    Ok(Json(ReservationResponse {
        reservation_id: reservation.id,
        event_id: reservation.event_id,
        ticket_id: reservation.ticket_type_id,
        quantity: reservation.quantity,
        amount: reservation.amount,
        status: reservation.status,
        checkout_url: reservation.checkout_url,
        tx_ref: reservation.tx_ref,
        created_at: reservation.created_at,
        completed_at: reservation.completed_at,
        ticket_number,
    }))
}

/// Return a checkout URL for a pending reservation, opening a session if the
/// original attempt never got one.
pub async fn reissue_checkout(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(reservation_id): Path<ReservationId>,
) -> Result<Json<CheckoutResponse>, ApiError> {
    let response = purchase::reissue_checkout(&state, auth.user_id, reservation_id).await?;
    Ok(Json(response))
}
