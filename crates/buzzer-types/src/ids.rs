//! Strongly-typed identifiers and the arrival timestamp.
//!
//! Participant identifiers are supplied by the participants themselves
//! (badge or seat numbers), so unlike generated IDs they wrap a
//! [`String`]. [`ArrivalTime`] is a monotonic nanosecond reading that
//! defines ranking order.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Maximum accepted length of a participant identifier, in characters.
pub const MAX_PARTICIPANT_ID_LEN: usize = 64;

/// Externally supplied, unique identifier of a participant.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ParticipantId(pub String);

impl ParticipantId {
    /// Wrap a raw identifier without validation.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Parse a raw identifier, trimming surrounding whitespace.
    ///
    /// Returns `None` if the trimmed identifier is empty or longer than
    /// [`MAX_PARTICIPANT_ID_LEN`] characters.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.chars().count() > MAX_PARTICIPANT_ID_LEN {
            return None;
        }
        Some(Self(trimmed.to_owned()))
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Trims surrounding whitespace the same way registration does, so an
/// ID converted from a padded string matches the registered entry. Length
/// is not checked; use [`ParticipantId::parse`] for untrusted input.
impl From<&str> for ParticipantId {
    fn from(id: &str) -> Self {
        Self(id.trim().to_owned())
    }
}

/// Monotonic arrival reading in nanoseconds since the event epoch.
///
/// Values handed out by the arrival clock are strictly increasing, so two
/// accepted presses never share an arrival time.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
pub struct ArrivalTime(pub u64);

impl ArrivalTime {
    /// Return the raw nanosecond value.
    pub const fn as_nanos(self) -> u64 {
        self.0
    }
}

impl core::fmt::Display for ArrivalTime {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}ns", self.0)
    }
}
