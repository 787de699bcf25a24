//! Storage layer for boxoffice.
//!
//! This crate owns every row the ticketing flow writes: reservations, sales,
//! and tickets. Two backends implement the same traits:
//!
//! - [`PgStore`]: PostgreSQL via `sqlx`, used in production
//! - [`MemoryStore`]: an in-process store for tests and local development
//!
//! # Issuance
//!
//! [`ReservationStore::complete`] is the only way a sale or ticket comes into
//! existence. It writes both in one transaction and marks the reservation
//! `completed`, or writes nothing at all.
//!
//! # Example
//!
//! ```no_run
//! use boxoffice_store::{PgStore, ReservationStore};
//! use boxoffice_core::ReservationId;
//!
//! # async fn example() -> boxoffice_store::Result<()> {
//! let store = PgStore::connect("postgres://localhost/boxoffice", 5).await?;
//! store.migrate().await?;
//!
//! let reservation = store.get(ReservationId::new(1)).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod memory;
pub mod postgres;
pub mod schema;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use boxoffice_core::{
    Decimal, EventId, NewReservation, Reservation, ReservationId, SaleId, SessionAttachment,
    Settlement, Ticket, TicketId, UserId,
};

/// Outcome of [`ReservationStore::complete`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// A sale and a ticket were written and the reservation completed.
    Issued {
        /// The reservation that was settled.
        reservation_id: ReservationId,
        /// The new sale.
        sale_id: SaleId,
        /// The new ticket.
        ticket_id: TicketId,
        /// The new ticket's number.
        ticket_number: String,
    },

    /// The reference was already settled. Nothing was written.
    AlreadyIssued {
        /// The reservation that was settled earlier.
        reservation_id: ReservationId,
    },

    /// No reservation carries this reference. Nothing was written.
    UnknownReference,

    /// The reference decodes to a different event or user than the
    /// reservation that owns it. Nothing was written.
    IdentityMismatch {
        /// The reservation that owns the reference.
        reservation_id: ReservationId,
        /// Event stored on the reservation.
        event_id: EventId,
        /// User stored on the reservation.
        user_id: UserId,
    },

    /// The reported amount differs from the reserved amount. Nothing was
    /// written.
    AmountMismatch {
        /// The reservation that owns the reference.
        reservation_id: ReservationId,
        /// Amount stored on the reservation.
        expected: Decimal,
        /// Amount the gateway reported.
        reported: Decimal,
    },
}

/// Cross-checks a locked reservation against a settlement.
///
/// Returns `Some` with the anomaly to report, or `None` if issuance may go
/// ahead. Shared by both backends so they agree on what counts as a match.
pub(crate) fn verify_settlement(
    reservation: &Reservation,
    settlement: &Settlement,
) -> Option<Completion> {
    if reservation.event_id != settlement.event_id || reservation.user_id != settlement.user_id {
        return Some(Completion::IdentityMismatch {
            reservation_id: reservation.id,
            event_id: reservation.event_id,
            user_id: reservation.user_id,
        });
    }

    if let Some(reported) = settlement.amount {
        if reported != reservation.amount {
            return Some(Completion::AmountMismatch {
                reservation_id: reservation.id,
                expected: reservation.amount,
                reported,
            });
        }
    }

    None
}

/// Storage for reservations and the records issued from them.
#[async_trait]
pub trait ReservationStore: Send + Sync {
    /// Record a new `pending` reservation.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn create(&self, new: &NewReservation) -> Result<Reservation>;

    /// Get a reservation by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn get(&self, id: ReservationId) -> Result<Option<Reservation>>;

    /// Attach gateway session details to a pending reservation.
    ///
    /// A reference is set at most once.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the reservation doesn't exist.
    /// - `StoreError::Conflict` if it already has a reference, is no longer
    ///   pending, or the reference is used by another reservation.
    async fn attach_reference(&self, id: ReservationId, session: &SessionAttachment)
        -> Result<()>;

    /// Settle a reference: write the sale and the ticket and complete the
    /// reservation, atomically.
    ///
    /// Repeated or concurrent calls for the same reference write at most one
    /// sale/ticket pair; the losers observe `Completion::AlreadyIssued`.
    ///
    /// # Errors
    ///
    /// Returns an error if any write fails. Nothing is persisted in that case.
    async fn complete(&self, settlement: &Settlement) -> Result<Completion>;

    /// Get the ticket issued for a reference, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn ticket_for_reference(&self, tx_ref: &str) -> Result<Option<Ticket>>;
}

/// Read-only access to user contact details owned by the identity service.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Look up a user's contact email.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup itself fails. A missing user or a
    /// missing email is `Ok(None)`.
    async fn contact_email(&self, user_id: UserId) -> Result<Option<String>>;
}
