//! API handlers.

pub mod health;
pub mod purchases;
pub mod reservations;
pub mod webhooks;
