//! Core entity structs: participants, press events, and leaderboard rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::{ArrivalTime, ParticipantId};

// ---------------------------------------------------------------------------
// Participant
// ---------------------------------------------------------------------------

/// A registered participant.
///
/// Created on first successful registration and never changed or removed
/// for the lifetime of the event. Names are not required to be unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Participant {
    /// Unique, externally supplied identifier.
    pub id: ParticipantId,
    /// Display name.
    pub name: String,
}

// ---------------------------------------------------------------------------
// PressEvent
// ---------------------------------------------------------------------------

/// The single accepted buzzer press of one participant in the current round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PressEvent {
    /// Insertion sequence number (1-based, restarts after a reset).
    pub sequence: u64,
    /// The participant who pressed.
    pub participant_id: ParticipantId,
    /// The participant's display name at press time.
    pub name: String,
    /// Wall-clock acceptance time formatted for display (`HH:MM:SS.mmm`).
    pub display_time: String,
    /// Monotonic acceptance time; defines ranking.
    pub arrival_time: ArrivalTime,
    /// Wall-clock acceptance instant.
    pub pressed_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Leaderboard
// ---------------------------------------------------------------------------

/// One row of the ranked leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct LeaderboardEntry {
    /// 1-based position with no gaps or ties.
    pub position: u32,
    /// The participant occupying this position.
    pub participant_id: ParticipantId,
    /// The participant's display name.
    pub name: String,
    /// Display time of the press.
    pub display_time: String,
}

/// The head of the leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct FirstPlace {
    /// Name of the fastest participant.
    pub name: String,
    /// Display time of their press.
    pub display_time: String,
}

impl From<&LeaderboardEntry> for FirstPlace {
    fn from(entry: &LeaderboardEntry) -> Self {
        Self {
            name: entry.name.clone(),
            display_time: entry.display_time.clone(),
        }
    }
}

/// Point-in-time summary of the buzzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct BuzzerStatus {
    /// Whether presses are currently accepted.
    pub active: bool,
    /// Number of registered participants.
    pub participants: u64,
    /// Number of presses recorded this round.
    pub presses: u64,
}
