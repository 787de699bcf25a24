//! Transaction reference codec.
//!
//! The payment gateway echoes back whatever reference we hand it when a
//! session is opened. References have the shape
//!
//! ```text
//! tx-<event_id>-<stamp>-<user_id>
//! ```
//!
//! where `stamp` is a microsecond timestamp taken when the session was
//! requested, so two references for the same event/user pair differ.
//!
//! Decoding only proves the string is well-formed. Whether the reference
//! actually belongs to a reservation is checked against the store.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::error::{CoreError, Result};
use crate::ids::{EventId, UserId};

/// Leading segment of every reference.
pub const REFERENCE_PREFIX: &str = "tx";

/// Segment delimiter.
pub const REFERENCE_DELIMITER: char = '-';

/// Number of delimited segments in a well-formed reference.
const SEGMENT_COUNT: usize = 4;

/// The decoded parts of a transaction reference.
///
/// Event and user ids must be positive for `decode(encode(r)) == r` to hold;
/// database-assigned ids always are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TxRef {
    /// Event the purchase is for.
    pub event_id: EventId,
    /// Uniqueness stamp.
    pub stamp: u64,
    /// Purchasing user.
    pub user_id: UserId,
}

impl TxRef {
    /// Build a reference from its parts.
    #[must_use]
    pub const fn new(event_id: EventId, user_id: UserId, stamp: u64) -> Self {
        Self {
            event_id,
            stamp,
            user_id,
        }
    }

    /// Build a reference stamped with the given instant.
    #[must_use]
    pub fn stamped_at(event_id: EventId, user_id: UserId, at: DateTime<Utc>) -> Self {
        Self::new(event_id, user_id, stamp_from(at))
    }

    /// Render the reference string handed to the gateway.
    #[must_use]
    pub fn encode(&self) -> String {
        self.to_string()
    }

    /// Parse a reference string received from the gateway.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::MalformedReference` if the string does not have
    /// exactly four `-` separated segments, the prefix is not `tx`, or any
    /// numeric segment is not a base-10 integer.
    pub fn decode(reference: &str) -> Result<Self> {
        let segments: Vec<&str> = reference.split(REFERENCE_DELIMITER).collect();

        if segments.len() != SEGMENT_COUNT {
            return Err(malformed(
                reference,
                format!(
                    "expected {SEGMENT_COUNT} segments, found {}",
                    segments.len()
                ),
            ));
        }

        if segments[0] != REFERENCE_PREFIX {
            return Err(malformed(
                reference,
                format!("expected prefix {REFERENCE_PREFIX:?}"),
            ));
        }

        let event_id = parse_segment::<i64>(reference, "event id", segments[1])?;
        let stamp = parse_segment::<u64>(reference, "stamp", segments[2])?;
        let user_id = parse_segment::<i64>(reference, "user id", segments[3])?;

        Ok(Self {
            event_id: EventId::new(event_id),
            stamp,
            user_id: UserId::new(user_id),
        })
    }
}

impl fmt::Display for TxRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = REFERENCE_DELIMITER;
        write!(
            f,
            "{REFERENCE_PREFIX}{d}{}{d}{}{d}{}",
            self.event_id, self.stamp, self.user_id
        )
    }
}

impl FromStr for TxRef {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::decode(s)
    }
}

/// Microseconds since the Unix epoch, clamped at zero.
#[must_use]
pub fn stamp_from(at: DateTime<Utc>) -> u64 {
    u64::try_from(at.timestamp_micros()).unwrap_or(0)
}

fn parse_segment<T: FromStr>(reference: &str, what: &str, segment: &str) -> Result<T> {
    // `str::parse` accepts a leading `+`, which `encode` never emits.
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed(
            reference,
            format!("{what} segment {segment:?} is not numeric"),
        ));
    }

    segment
        .parse::<T>()
        .map_err(|_| malformed(reference, format!("{what} segment {segment:?} is out of range")))
}

fn malformed(reference: &str, reason: String) -> CoreError {
    CoreError::MalformedReference {
        reference: reference.to_string(),
        reason,
    }
}
