//! Error types for boxoffice domain logic.

/// Result type for boxoffice domain operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised by domain validation and the reference codec.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    /// A purchase request failed validation.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A transaction reference could not be decoded.
    #[error("malformed transaction reference {reference:?}: {reason}")]
    MalformedReference {
        /// The offending reference, verbatim.
        reference: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A status transition would move a reservation backwards.
    #[error("invalid status transition from {from} to {to}")]
    InvalidTransition {
        /// The current status.
        from: crate::ReservationStatus,
        /// The requested status.
        to: crate::ReservationStatus,
    },
}
