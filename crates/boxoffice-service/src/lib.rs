//! Boxoffice HTTP API service.
//!
//! This crate provides the HTTP side of ticket sales:
//!
//! - Ticket purchase (reservation + Chapa checkout session)
//! - Reservation polling and checkout re-issue
//! - Chapa payment webhooks, reconciled into sales and tickets
//!
//! # Authentication
//!
//! Buyer endpoints take an HS256 Bearer JWT issued by the identity service.
//! The webhook endpoint is unauthenticated unless `CHAPA_WEBHOOK_SECRET` is
//! set, in which case the body must carry a matching HMAC-SHA256 signature.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Health handler is async for routing

pub mod auth;
pub mod chapa;
pub mod config;
pub mod crypto;
pub mod error;
pub mod handlers;
pub mod purchase;
pub mod reconcile;
pub mod routes;
pub mod state;

pub use chapa::{ChapaClient, ChapaError};
pub use config::ServiceConfig;
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
