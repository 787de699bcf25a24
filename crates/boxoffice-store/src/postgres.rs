//! PostgreSQL backend.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions};

use boxoffice_core::{
    ticket_number, EventId, NewReservation, Reservation, ReservationId, ReservationStatus,
    SaleId, SessionAttachment, Settlement, Ticket, TicketId, TicketTypeId, UserId,
    SALE_STATUS_COMPLETED, TICKET_STATUS_ACTIVE,
};

use crate::error::{Result, StoreError};
use crate::schema::{table, RESERVATION_COLUMNS};
use crate::{verify_settlement, Completion, ReservationStore, UserDirectory};

/// Reservation store backed by a PostgreSQL connection pool.
///
/// Cloning is cheap; clones share the pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct ReservationRow {
    id: i64,
    event_id: i64,
    ticket_type_id: i64,
    user_id: i64,
    quantity: i32,
    amount: Decimal,
    status: String,
    tx_ref: Option<String>,
    checkout_url: Option<String>,
    gateway_reference: Option<String>,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl TryFrom<ReservationRow> for Reservation {
    type Error = StoreError;

    fn try_from(row: ReservationRow) -> Result<Self> {
        let status = ReservationStatus::parse(&row.status).ok_or_else(|| {
            StoreError::Corrupt(format!(
                "reservation {} has unknown status {:?}",
                row.id, row.status
            ))
        })?;

        Ok(Self {
            id: ReservationId::new(row.id),
            event_id: EventId::new(row.event_id),
            ticket_type_id: TicketTypeId::new(row.ticket_type_id),
            user_id: UserId::new(row.user_id),
            quantity: row.quantity,
            amount: row.amount,
            status,
            tx_ref: row.tx_ref,
            checkout_url: row.checkout_url,
            gateway_reference: row.gateway_reference,
            created_at: row.created_at,
            completed_at: row.completed_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct TicketRow {
    id: i64,
    sale_id: i64,
    user_id: i64,
    event_id: i64,
    ticket_number: String,
    status: String,
    created_at: DateTime<Utc>,
}

impl From<TicketRow> for Ticket {
    fn from(row: TicketRow) -> Self {
        Self {
            id: TicketId::new(row.id),
            sale_id: SaleId::new(row.sale_id),
            user_id: UserId::new(row.user_id),
            event_id: EventId::new(row.event_id),
            ticket_number: row.ticket_number,
            status: row.status,
            created_at: row.created_at,
        }
    }
}

impl PgStore {
    /// Wrap an existing pool. The caller owns the pool's lifecycle.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool against `database_url`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` if the database is unreachable.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        Ok(Self::new(pool))
    }

    /// Apply the embedded migrations.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` if a migration fails.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        tracing::info!("Database migrations applied");
        Ok(())
    }

    /// The underlying pool, for ad hoc queries and fixtures.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl ReservationStore for PgStore {
    async fn create(&self, new: &NewReservation) -> Result<Reservation> {
        let (id, created_at): (i64, DateTime<Utc>) = sqlx::query_as(
            r"
            INSERT INTO reservations (event_id, ticket_type_id, user_id, quantity, amount, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, created_at
            ",
        )
        .bind(new.event_id.get())
        .bind(new.ticket_type_id.get())
        .bind(new.user_id.get())
        .bind(new.quantity)
        .bind(new.amount)
        .bind(ReservationStatus::Pending.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(Reservation::from_new(ReservationId::new(id), new, created_at))
    }

    async fn get(&self, id: ReservationId) -> Result<Option<Reservation>> {
        let row: Option<ReservationRow> = sqlx::query_as(&format!(
            "SELECT {RESERVATION_COLUMNS} FROM {} WHERE id = $1",
            table::RESERVATIONS
        ))
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Reservation::try_from).transpose()
    }

    async fn attach_reference(
        &self,
        id: ReservationId,
        session: &SessionAttachment,
    ) -> Result<()> {
        let result = sqlx::query(
            r"
            UPDATE reservations
            SET tx_ref = $2, checkout_url = $3, gateway_reference = $4
            WHERE id = $1 AND tx_ref IS NULL AND status = 'pending'
            ",
        )
        .bind(id.get())
        .bind(&session.tx_ref)
        .bind(&session.checkout_url)
        .bind(session.gateway_reference.as_deref())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(());
        }

        // Zero rows: either the reservation is gone or it is no longer
        // eligible. Tell the two apart for the caller.
        match self.get(id).await? {
            None => Err(StoreError::NotFound {
                entity: "reservation",
                id: id.to_string(),
            }),
            Some(_) => Err(StoreError::Conflict(format!(
                "reservation {id} already has a reference or is not pending"
            ))),
        }
    }

    async fn complete(&self, settlement: &Settlement) -> Result<Completion> {
        // Dropping `tx` without commit rolls back, so every early return and
        // every `?` below leaves the database untouched.
        let mut tx = self.pool.begin().await?;

        // The row lock serialises concurrent deliveries of the same reference.
        let row: Option<ReservationRow> = sqlx::query_as(&format!(
            "SELECT {RESERVATION_COLUMNS} FROM {} WHERE tx_ref = $1 FOR UPDATE",
            table::RESERVATIONS
        ))
        .bind(&settlement.tx_ref)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Ok(Completion::UnknownReference);
        };
        let reservation = Reservation::try_from(row)?;

        // A settled reference stays settled, whatever a redelivery reports.
        if !reservation.is_pending() {
            return Ok(Completion::AlreadyIssued {
                reservation_id: reservation.id,
            });
        }

        if let Some(anomaly) = verify_settlement(&reservation, settlement) {
            return Ok(anomaly);
        }

        let amount = settlement.amount.unwrap_or(reservation.amount);

        let sale_id: Option<i64> = sqlx::query_scalar(
            r"
            INSERT INTO sales (reservation_id, user_id, event_id, amount, status, tx_ref)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (tx_ref) DO NOTHING
            RETURNING id
            ",
        )
        .bind(reservation.id.get())
        .bind(settlement.user_id.get())
        .bind(settlement.event_id.get())
        .bind(amount)
        .bind(SALE_STATUS_COMPLETED)
        .bind(&settlement.tx_ref)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(sale_id) = sale_id else {
            return Ok(Completion::AlreadyIssued {
                reservation_id: reservation.id,
            });
        };

        let number = ticket_number(&settlement.tx_ref);
        let ticket_id: i64 = sqlx::query_scalar(
            r"
            INSERT INTO tickets (sale_id, user_id, event_id, ticket_number, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            ",
        )
        .bind(sale_id)
        .bind(settlement.user_id.get())
        .bind(settlement.event_id.get())
        .bind(&number)
        .bind(TICKET_STATUS_ACTIVE)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| StoreError::Database(format!("ticket insert failed: {e}")))?;

        let next = reservation.status.transition(ReservationStatus::Completed).map_err(|e| {
            StoreError::Corrupt(format!("reservation {}: {e}", reservation.id))
        })?;

        sqlx::query(
            r"
            UPDATE reservations
            SET status = $2, completed_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(reservation.id.get())
        .bind(next.as_str())
        .execute(&mut *tx)
        .await?;

        tx.commit()
            .await
            .map_err(|e| StoreError::Database(format!("commit failed: {e}")))?;

        tracing::debug!(
            reservation_id = %reservation.id,
            sale_id = sale_id,
            ticket_id = ticket_id,
            "Sale and ticket committed"
        );

        Ok(Completion::Issued {
            reservation_id: reservation.id,
            sale_id: SaleId::new(sale_id),
            ticket_id: TicketId::new(ticket_id),
            ticket_number: number,
        })
    }

    async fn ticket_for_reference(&self, tx_ref: &str) -> Result<Option<Ticket>> {
        let row: Option<TicketRow> = sqlx::query_as(
            r"
            SELECT id, sale_id, user_id, event_id, ticket_number, status, created_at
            FROM tickets
            WHERE ticket_number = $1
            ",
        )
        .bind(ticket_number(tx_ref))
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Ticket::from))
    }
}

#[async_trait]
impl UserDirectory for PgStore {
    async fn contact_email(&self, user_id: UserId) -> Result<Option<String>> {
        let email: Option<Option<String>> = sqlx::query_scalar(&format!(
            "SELECT email FROM {} WHERE id = $1",
            table::USERS
        ))
        .bind(user_id.get())
        .fetch_optional(&self.pool)
        .await?;

        Ok(email.flatten().filter(|e| !e.trim().is_empty()))
    }
}
