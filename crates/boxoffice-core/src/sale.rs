//! Sale and ticket records issued on successful payment.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ids::{EventId, ReservationId, SaleId, TicketId, UserId};

/// Prefix of every issued ticket number.
pub const TICKET_NUMBER_PREFIX: &str = "TKT-";

/// Status recorded on a sale created by reconciliation.
pub const SALE_STATUS_COMPLETED: &str = "completed";

/// Status recorded on a freshly issued ticket.
pub const TICKET_STATUS_ACTIVE: &str = "active";

/// Derive the ticket number for a transaction reference.
#[must_use]
pub fn ticket_number(tx_ref: &str) -> String {
    format!("{TICKET_NUMBER_PREFIX}{tx_ref}")
}

/// A confirmed payment to be turned into a sale and a ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    /// Transaction reference echoed by the gateway.
    pub tx_ref: String,
    /// Buyer decoded from the reference.
    pub user_id: UserId,
    /// Event decoded from the reference.
    pub event_id: EventId,
    /// Amount the gateway reports as paid. When absent the reservation's
    /// own amount is recorded.
    pub amount: Option<Decimal>,
}

/// Accounting record of a completed payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    /// Sale ID.
    pub id: SaleId,
    /// Reservation this sale settles.
    pub reservation_id: ReservationId,
    /// Buyer.
    pub user_id: UserId,
    /// Event.
    pub event_id: EventId,
    /// Amount paid.
    pub amount: Decimal,
    /// Always `completed` for reconciled sales.
    pub status: String,
    /// Transaction reference (unique).
    pub tx_ref: String,
    /// When the sale was recorded.
    pub created_at: DateTime<Utc>,
}

/// A ticket granted to a buyer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    /// Ticket ID.
    pub id: TicketId,
    /// Sale that paid for this ticket.
    pub sale_id: SaleId,
    /// Holder.
    pub user_id: UserId,
    /// Event.
    pub event_id: EventId,
    /// Unique ticket number, see [`ticket_number`].
    pub ticket_number: String,
    /// Always `active` on issue.
    pub status: String,
    /// When the ticket was issued.
    pub created_at: DateTime<Utc>,
}
