//! Core types and utilities for boxoffice.
//!
//! This crate provides the foundational types used throughout the ticketing service:
//!
//! - **Identifiers**: `UserId`, `EventId`, `TicketTypeId`, `ReservationId`, `SaleId`, `TicketId`
//! - **Reservations**: `Reservation`, `NewReservation`, `ReservationStatus`
//! - **Issuance**: `Settlement`, `Sale`, `Ticket`
//! - **References**: `TxRef`, the codec for gateway transaction references
//!
//! # Amounts
//!
//! Amounts are `rust_decimal::Decimal` and carry no currency; the currency is
//! a property of the gateway configuration.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod ids;
pub mod reference;
pub mod reservation;
pub mod sale;

pub use error::{CoreError, Result};
pub use ids::{EventId, IdError, ReservationId, SaleId, TicketId, TicketTypeId, UserId};
pub use reference::{TxRef, REFERENCE_DELIMITER, REFERENCE_PREFIX};
pub use reservation::{
    NewReservation, Reservation, ReservationStatus, SessionAttachment, AMOUNT_SCALE,
};
pub use sale::{
    ticket_number, Sale, Settlement, Ticket, SALE_STATUS_COMPLETED, TICKET_NUMBER_PREFIX,
    TICKET_STATUS_ACTIVE,
};

pub use rust_decimal::Decimal;
