//! Table and column names shared by the PostgreSQL backend.
//!
//! The DDL itself lives in `migrations/`.

/// Table names.
pub mod table {
    /// Purchase attempts, keyed by `id`. `tx_ref` is UNIQUE.
    pub const RESERVATIONS: &str = "reservations";

    /// Reconciled payments, keyed by `id`. `tx_ref` is UNIQUE.
    pub const SALES: &str = "sales";

    /// Issued tickets, keyed by `id`. `ticket_number` is UNIQUE.
    pub const TICKETS: &str = "tickets";

    /// Owned by the identity service; only `id` and `email` are read.
    pub const USERS: &str = "users";
}

/// Column list selected whenever a full reservation is loaded.
pub const RESERVATION_COLUMNS: &str = "id, event_id, ticket_type_id, user_id, quantity, amount, \
     status, tx_ref, checkout_url, gateway_reference, created_at, completed_at";

