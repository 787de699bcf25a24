//! In-memory backend for tests and local development.
//!
//! Every operation takes a single lock for its whole duration, which gives
//! the same all-or-nothing behaviour as a database transaction. Writes made by
//! [`ReservationStore::complete`] are staged and only applied once every step
//! has succeeded.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use boxoffice_core::{
    ticket_number, NewReservation, Reservation, ReservationId, ReservationStatus, Sale, SaleId,
    SessionAttachment, Settlement, Ticket, TicketId, UserId, SALE_STATUS_COMPLETED,
    TICKET_STATUS_ACTIVE,
};

use crate::error::{Result, StoreError};
use crate::{verify_settlement, Completion, ReservationStore, UserDirectory};

#[derive(Debug, Default)]
struct Tables {
    reservations: Vec<Reservation>,
    sales: Vec<Sale>,
    tickets: Vec<Ticket>,
    emails: HashMap<UserId, String>,
}

impl Tables {
    fn reservation_mut(&mut self, id: ReservationId) -> Option<&mut Reservation> {
        self.reservations.iter_mut().find(|r| r.id == id)
    }

    fn next_reservation_id(&self) -> ReservationId {
        ReservationId::new(i64::try_from(self.reservations.len()).unwrap_or(i64::MAX - 1) + 1)
    }
}

/// Reservation store held entirely in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    fail_ticket_insert: AtomicBool,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user's contact email.
    pub async fn set_email(&self, user_id: UserId, email: impl Into<String>) {
        self.tables.lock().await.emails.insert(user_id, email.into());
    }

    /// Make the next ticket insert fail after the sale has been staged.
    pub fn inject_ticket_fault(&self) {
        self.fail_ticket_insert.store(true, Ordering::SeqCst);
    }

    /// All sales, in insertion order.
    pub async fn sales(&self) -> Vec<Sale> {
        self.tables.lock().await.sales.clone()
    }

    /// All tickets, in insertion order.
    pub async fn tickets(&self) -> Vec<Ticket> {
        self.tables.lock().await.tickets.clone()
    }

    /// All reservations, in insertion order.
    pub async fn reservations(&self) -> Vec<Reservation> {
        self.tables.lock().await.reservations.clone()
    }
}

#[async_trait]
impl ReservationStore for MemoryStore {
    async fn create(&self, new: &NewReservation) -> Result<Reservation> {
        let mut tables = self.tables.lock().await;
        let reservation = Reservation::from_new(tables.next_reservation_id(), new, Utc::now());
        tables.reservations.push(reservation.clone());
        Ok(reservation)
    }

    async fn get(&self, id: ReservationId) -> Result<Option<Reservation>> {
        let tables = self.tables.lock().await;
        Ok(tables.reservations.iter().find(|r| r.id == id).cloned())
    }

    async fn attach_reference(
        &self,
        id: ReservationId,
        session: &SessionAttachment,
    ) -> Result<()> {
        let mut tables = self.tables.lock().await;

        if tables
            .reservations
            .iter()
            .any(|r| r.tx_ref.as_deref() == Some(session.tx_ref.as_str()))
        {
            return Err(StoreError::Conflict(format!(
                "reference {} already in use",
                session.tx_ref
            )));
        }

        let reservation = tables
            .reservation_mut(id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "reservation",
                id: id.to_string(),
            })?;

        if reservation.has_session() || !reservation.is_pending() {
            return Err(StoreError::Conflict(format!(
                "reservation {id} already has a reference or is not pending"
            )));
        }

        reservation.tx_ref = Some(session.tx_ref.clone());
        reservation.checkout_url = Some(session.checkout_url.clone());
        reservation.gateway_reference.clone_from(&session.gateway_reference);
        Ok(())
    }

    async fn complete(&self, settlement: &Settlement) -> Result<Completion> {
        let mut tables = self.tables.lock().await;

        let Some(reservation) = tables
            .reservations
            .iter()
            .find(|r| r.tx_ref.as_deref() == Some(settlement.tx_ref.as_str()))
            .cloned()
        else {
            return Ok(Completion::UnknownReference);
        };

        if !reservation.is_pending() || tables.sales.iter().any(|s| s.tx_ref == settlement.tx_ref)
        {
            return Ok(Completion::AlreadyIssued {
                reservation_id: reservation.id,
            });
        }

        if let Some(anomaly) = verify_settlement(&reservation, settlement) {
            return Ok(anomaly);
        }

        let now = Utc::now();
        let sale = Sale {
            id: SaleId::new(i64::try_from(tables.sales.len()).unwrap_or(i64::MAX - 1) + 1),
            reservation_id: reservation.id,
            user_id: settlement.user_id,
            event_id: settlement.event_id,
            amount: settlement.amount.unwrap_or(reservation.amount),
            status: SALE_STATUS_COMPLETED.to_string(),
            tx_ref: settlement.tx_ref.clone(),
            created_at: now,
        };

        let number = ticket_number(&settlement.tx_ref);
        if self.fail_ticket_insert.swap(false, Ordering::SeqCst)
            || tables.tickets.iter().any(|t| t.ticket_number == number)
        {
            // The staged sale is dropped with this scope.
            return Err(StoreError::Database(format!(
                "ticket insert failed for {}",
                settlement.tx_ref
            )));
        }

        let ticket = Ticket {
            id: TicketId::new(i64::try_from(tables.tickets.len()).unwrap_or(i64::MAX - 1) + 1),
            sale_id: sale.id,
            user_id: settlement.user_id,
            event_id: settlement.event_id,
            ticket_number: number.clone(),
            status: TICKET_STATUS_ACTIVE.to_string(),
            created_at: now,
        };

        let next = reservation
            .status
            .transition(ReservationStatus::Completed)
            .map_err(|e| StoreError::Corrupt(format!("reservation {}: {e}", reservation.id)))?;

        let completion = Completion::Issued {
            reservation_id: reservation.id,
            sale_id: sale.id,
            ticket_id: ticket.id,
            ticket_number: number,
        };

        tables.sales.push(sale);
        tables.tickets.push(ticket);
        if let Some(stored) = tables.reservation_mut(reservation.id) {
            stored.status = next;
            stored.completed_at = Some(now);
        }

        Ok(completion)
    }

    async fn ticket_for_reference(&self, tx_ref: &str) -> Result<Option<Ticket>> {
        let number = ticket_number(tx_ref);
        let tables = self.tables.lock().await;
        Ok(tables
            .tickets
            .iter()
            .find(|t| t.ticket_number == number)
            .cloned())
    }
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn contact_email(&self, user_id: UserId) -> Result<Option<String>> {
        Ok(self
            .tables
            .lock()
            .await
            .emails
            .get(&user_id)
            .filter(|e| !e.trim().is_empty())
            .cloned())
    }
}
