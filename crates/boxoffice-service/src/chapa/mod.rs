//! Chapa integration for opening hosted checkout sessions.
//!
//! Chapa handles:
//! - Checkout sessions via `POST /transaction/initialize`
//! - Payment notifications posted back to `/webhooks/chapa`
//!
//! The client never retries. A failed initialization leaves the reservation
//! pending for the checkout re-issue endpoint to pick up.

pub mod client;
pub mod types;

pub use client::{ChapaClient, ChapaError};
pub use types::*;
