//! Reservation types.
//!
//! A reservation records one purchase attempt, from the moment the buyer asks
//! for tickets until the gateway confirms payment.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::ids::{EventId, ReservationId, TicketTypeId, UserId};

/// Decimal places an amount is kept to.
pub const AMOUNT_SCALE: u32 = 2;

/// Lifecycle status of a reservation.
///
/// Statuses are ordered; a reservation only ever moves to a later one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    /// Awaiting payment. The gateway session may or may not be open yet.
    Pending,
    /// Payment reconciled; sale and ticket issued.
    Completed,
}

impl ReservationStatus {
    /// Database/wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }

    /// Parse the database/wire representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }

    /// Check a transition. Only forward moves are allowed.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidTransition` if `next` is not after `self`.
    pub fn transition(self, next: Self) -> Result<Self> {
        if next > self {
            Ok(next)
        } else {
            Err(CoreError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated request to reserve tickets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReservation {
    /// Event being purchased.
    pub event_id: EventId,
    /// Ticket type being purchased.
    pub ticket_type_id: TicketTypeId,
    /// Buyer.
    pub user_id: UserId,
    /// Number of tickets.
    pub quantity: i32,
    /// Total amount to charge.
    pub amount: Decimal,
}

impl NewReservation {
    /// Validate and build a reservation request.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` if an id, the quantity, or the amount
    /// is not positive. The amount is rounded to cents first, since that is
    /// what the gateway charges and what the database keeps.
    pub fn new(
        event_id: EventId,
        ticket_type_id: TicketTypeId,
        user_id: UserId,
        quantity: i32,
        amount: Decimal,
    ) -> Result<Self> {
        if event_id.get() <= 0 || ticket_type_id.get() <= 0 || user_id.get() <= 0 {
            return Err(CoreError::Validation(
                "Event/Ticket identifiers must be positive".into(),
            ));
        }

        let amount = amount.round_dp(AMOUNT_SCALE);
        if quantity <= 0 || amount <= Decimal::ZERO {
            return Err(CoreError::Validation(
                "Quantity/Amount must be greater than zero".into(),
            ));
        }

        Ok(Self {
            event_id,
            ticket_type_id,
            user_id,
            quantity,
            amount,
        })
    }
}

/// Gateway session details attached to a pending reservation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionAttachment {
    /// Our transaction reference, as handed to the gateway.
    pub tx_ref: String,
    /// Where the buyer is sent to pay.
    pub checkout_url: String,
    /// The gateway's own reference for the session, if it returned one.
    pub gateway_reference: Option<String>,
}

/// A stored reservation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    /// Reservation ID.
    pub id: ReservationId,
    /// Event being purchased.
    pub event_id: EventId,
    /// Ticket type being purchased.
    pub ticket_type_id: TicketTypeId,
    /// Buyer.
    pub user_id: UserId,
    /// Number of tickets.
    pub quantity: i32,
    /// Total amount to charge.
    pub amount: Decimal,
    /// Lifecycle status.
    pub status: ReservationStatus,
    /// Transaction reference, set once a gateway session is open.
    pub tx_ref: Option<String>,
    /// Checkout URL, set once a gateway session is open.
    pub checkout_url: Option<String>,
    /// Gateway-assigned reference, if the gateway returned one.
    pub gateway_reference: Option<String>,
    /// When the reservation was recorded.
    pub created_at: DateTime<Utc>,
    /// When payment was reconciled.
    pub completed_at: Option<DateTime<Utc>>,
}

impl Reservation {
    /// Materialise a freshly inserted reservation.
    #[must_use]
    pub fn from_new(id: ReservationId, new: &NewReservation, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            event_id: new.event_id,
            ticket_type_id: new.ticket_type_id,
            user_id: new.user_id,
            quantity: new.quantity,
            amount: new.amount,
            status: ReservationStatus::Pending,
            tx_ref: None,
            checkout_url: None,
            gateway_reference: None,
            created_at,
            completed_at: None,
        }
    }

    /// Whether a gateway session has been attached.
    #[must_use]
    pub fn has_session(&self) -> bool {
        self.tx_ref.is_some()
    }

    /// Whether the reservation is still waiting for payment.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == ReservationStatus::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(quantity: i32, amount: Decimal) -> Result<NewReservation> {
        NewReservation::new(
            EventId::new(7),
            TicketTypeId::new(3),
            UserId::new(42),
            quantity,
            amount,
        )
    }

    #[test]
    fn accepts_positive_quantity_and_amount() {
        let new = request(2, Decimal::new(500, 0)).unwrap();
        assert_eq!(new.quantity, 2);
        assert_eq!(new.amount, Decimal::new(500, 0));
    }

    #[test]
    fn rejects_zero_or_negative_quantity() {
        assert!(matches!(request(0, Decimal::ONE), Err(CoreError::Validation(_))));
        assert!(matches!(request(-1, Decimal::ONE), Err(CoreError::Validation(_))));
    }

    #[test]
    fn rejects_zero_or_negative_amount() {
        assert!(matches!(request(1, Decimal::ZERO), Err(CoreError::Validation(_))));
        assert!(matches!(
            request(1, Decimal::new(-5, 1)),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn rejects_non_positive_ids() {
        for event_id in [0, -7] {
            let result = NewReservation::new(
                EventId::new(event_id),
                TicketTypeId::new(3),
                UserId::new(42),
                1,
                Decimal::ONE,
            );
            assert!(matches!(result, Err(CoreError::Validation(_))));
        }
        let result = NewReservation::new(
            EventId::new(7),
            TicketTypeId::new(-3),
            UserId::new(42),
            1,
            Decimal::ONE,
        );
        assert!(matches!(result, Err(CoreError::Validation(_))));
    }

    #[test]
    fn amount_is_kept_in_cents() {
        let new = request(1, Decimal::new(10_005, 3)).unwrap();
        assert_eq!(new.amount.scale(), 2);
        assert_eq!(new.amount, Decimal::new(10_005, 3).round_dp(2));

        let new = request(1, Decimal::new(1_999, 2)).unwrap();
        assert_eq!(new.amount, Decimal::new(1_999, 2));
    }

    #[test]
    fn sub_cent_amount_is_not_positive() {
        assert!(matches!(
            request(1, Decimal::new(1, 3)),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn status_only_moves_forward() {
        assert_eq!(
            ReservationStatus::Pending.transition(ReservationStatus::Completed),
            Ok(ReservationStatus::Completed)
        );
        assert!(ReservationStatus::Completed
            .transition(ReservationStatus::Pending)
            .is_err());
        assert!(ReservationStatus::Completed
            .transition(ReservationStatus::Completed)
            .is_err());
    }

    #[test]
    fn status_string_roundtrip() {
        for status in [ReservationStatus::Pending, ReservationStatus::Completed] {
            assert_eq!(ReservationStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ReservationStatus::parse("failed"), None);
    }

    #[test]
    fn new_reservation_starts_pending_without_session() {
        let new = request(2, Decimal::new(500, 0)).unwrap();
        let reservation = Reservation::from_new(ReservationId::new(1), &new, Utc::now());
        assert!(reservation.is_pending());
        assert!(!reservation.has_session());
        assert!(reservation.completed_at.is_none());
    }
}
