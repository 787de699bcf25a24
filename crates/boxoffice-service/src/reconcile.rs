//! Payment reconciliation.
//!
//! Turns a gateway notification into at most one sale/ticket pair. Every
//! outcome except a store failure is acknowledged to the gateway with a 200,
//! so a payment it legitimately failed, or a reference we cannot place, does
//! not get redelivered forever. Store failures surface as errors so the
//! gateway retries; [`ReservationStore::complete`] is idempotent, which makes
//! that safe.

use boxoffice_core::{CoreError, Decimal, ReservationId, Settlement, TxRef};
use boxoffice_store::{Completion, ReservationStore, StoreError};

use crate::chapa::WebhookNotification;

/// What a notification amounted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A sale and a ticket were issued.
    Issued {
        /// The completed reservation.
        reservation_id: ReservationId,
        /// The new ticket's number.
        ticket_number: String,
    },
    /// The reference was settled by an earlier delivery.
    AlreadyIssued,
    /// The gateway reported a non-success status.
    NotSuccessful,
    /// The reference could not be decoded.
    MalformedReference,
    /// No reservation carries the reference.
    UnknownReference,
    /// The reference names a different event or user than its reservation.
    IdentityMismatch,
    /// The paid amount differs from the reserved amount.
    AmountMismatch,
}

impl Outcome {
    /// Message returned to the gateway.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::Issued { .. } => "Webhook processed successfully",
            Self::AlreadyIssued => "Webhook already processed",
            Self::NotSuccessful => "Payment not successful, no ticket issued",
            Self::MalformedReference => "Invalid reference format",
            Self::UnknownReference => "Unknown reference, no ticket issued",
            Self::IdentityMismatch => "Reference does not match reservation, no ticket issued",
            Self::AmountMismatch => "Amount does not match reservation, no ticket issued",
        }
    }
}

/// Reconcile one notification against the store.
///
/// # Errors
///
/// Returns the store error if issuance failed. Nothing was persisted.
pub async fn handle_notification(
    store: &dyn ReservationStore,
    notification: &WebhookNotification,
) -> Result<Outcome, StoreError> {
    if !notification.is_success() {
        tracing::info!(
            tx_ref = %notification.tx_ref,
            status = %notification.status,
            "Payment not successful; nothing to issue"
        );
        return Ok(Outcome::NotSuccessful);
    }

    let reference = match TxRef::decode(&notification.tx_ref) {
        Ok(reference) => reference,
        Err(CoreError::MalformedReference { reference, reason }) => {
            tracing::warn!(tx_ref = %reference, reason = %reason, "Malformed webhook reference");
            return Ok(Outcome::MalformedReference);
        }
        Err(e) => {
            tracing::warn!(tx_ref = %notification.tx_ref, error = %e, "Malformed webhook reference");
            return Ok(Outcome::MalformedReference);
        }
    };

    let settlement = Settlement {
        tx_ref: notification.tx_ref.clone(),
        user_id: reference.user_id,
        event_id: reference.event_id,
        amount: notification.amount,
    };

    let completion = store.complete(&settlement).await.map_err(|e| {
        tracing::error!(tx_ref = %settlement.tx_ref, error = %e, "Ticket issuance failed");
        e
    })?;

    Ok(classify(&settlement, completion))
}

fn classify(settlement: &Settlement, completion: Completion) -> Outcome {
    match completion {
        Completion::Issued {
            reservation_id,
            sale_id,
            ticket_id,
            ticket_number,
        } => {
            tracing::info!(
                tx_ref = %settlement.tx_ref,
                reservation_id = %reservation_id,
                sale_id = %sale_id,
                ticket_id = %ticket_id,
                ticket_number = %ticket_number,
                "Ticket issued"
            );
            Outcome::Issued {
                reservation_id,
                ticket_number,
            }
        }
        Completion::AlreadyIssued { reservation_id } => {
            tracing::info!(
                tx_ref = %settlement.tx_ref,
                reservation_id = %reservation_id,
                "Duplicate notification ignored"
            );
            Outcome::AlreadyIssued
        }
        Completion::UnknownReference => {
            tracing::warn!(tx_ref = %settlement.tx_ref, "Webhook reference matches no reservation");
            Outcome::UnknownReference
        }
        Completion::IdentityMismatch {
            reservation_id,
            event_id,
            user_id,
        } => {
            tracing::warn!(
                tx_ref = %settlement.tx_ref,
                reservation_id = %reservation_id,
                stored_event_id = %event_id,
                stored_user_id = %user_id,
                decoded_event_id = %settlement.event_id,
                decoded_user_id = %settlement.user_id,
                "Webhook reference does not match its reservation"
            );
            Outcome::IdentityMismatch
        }
        Completion::AmountMismatch {
            reservation_id,
            expected,
            reported,
        } => {
            tracing::warn!(
                tx_ref = %settlement.tx_ref,
                reservation_id = %reservation_id,
                expected = %expected,
                reported = %reported,
                "Webhook amount does not match reservation"
            );
            Outcome::AmountMismatch
        }
    }
}

/// Amount to show for a notification in logs.
#[must_use]
pub fn reported_amount(notification: &WebhookNotification) -> String {
    notification
        .amount
        .map_or_else(|| "-".to_string(), |a: Decimal| a.to_string())
}
