//! Identifier types for boxoffice.
//!
//! Every row the service touches is keyed by a database-assigned `BIGINT`.
//! Wrapping them in distinct newtypes keeps an event id from being passed
//! where a user id is expected.
//!
//! # Macro-based ID Types
//!
//! The `int_id_type!` macro reduces boilerplate for integer identifier types,
//! ensuring consistent implementation of serialization, parsing, and display traits.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Macro to define an `i64`-based identifier type with standard trait implementations.
///
/// This macro generates a newtype wrapper around `i64` with implementations for:
/// - `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - `Serialize`, `Deserialize` (as a bare JSON integer)
/// - `FromStr`, `Display`, `Debug`
/// - `From<i64>`, `From<Id> for i64`
///
/// # Example
///
/// ```ignore
/// int_id_type!(MyId, "A custom identifier type.");
/// let id = MyId::new(7);
/// let parsed: MyId = id.to_string().parse().unwrap();
/// ```
macro_rules! int_id_type {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wrap a raw database identifier.
            #[must_use]
            pub const fn new(raw: i64) -> Self {
                Self(raw)
            }

            /// Return the raw identifier.
            #[must_use]
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse::<i64>()
                    .map(Self)
                    .map_err(|_| IdError::NotAnInteger(s.to_string()))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(raw: i64) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

int_id_type!(UserId, "A user identifier.\n\nUser IDs come from the identity provider and are extracted from JWT claims.");
int_id_type!(EventId, "An event identifier from the event catalog.");
int_id_type!(TicketTypeId, "A ticket-type identifier (the kind of ticket on sale for an event).");
int_id_type!(ReservationId, "A reservation identifier, assigned when a purchase attempt is recorded.");
int_id_type!(SaleId, "A sale identifier, assigned when a payment is reconciled.");
int_id_type!(TicketId, "An issued ticket identifier.");

/// Errors that can occur when parsing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// The input is not a base-10 integer.
    #[error("not an integer identifier: {0}")]
    NotAnInteger(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_roundtrip() {
        let id = UserId::new(42);
        let parsed = UserId::from_str(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn ids_serialize_as_plain_integers() {
        let json = serde_json::to_string(&EventId::new(7)).unwrap();
        assert_eq!(json, "7");

        let parsed: ReservationId = serde_json::from_str("19").unwrap();
        assert_eq!(parsed.get(), 19);
    }

    #[test]
    fn rejects_non_numeric_input() {
        assert_eq!(
            "abc".parse::<UserId>(),
            Err(IdError::NotAnInteger("abc".into()))
        );
        assert!("".parse::<EventId>().is_err());
    }

    #[test]
    fn debug_names_the_type() {
        assert_eq!(format!("{:?}", TicketId::new(3)), "TicketId(3)");
    }
}
