//! Shared type definitions for the quiz buzzer.
//!
//! This crate is the single source of truth for the data model used by
//! the arbitration core, the persistence layer, and the HTTP API. Types
//! flow downstream to `TypeScript` via `ts-rs` for browser clients.
//!
//! # Modules
//!
//! - [`ids`] -- Participant identifiers and the monotonic arrival time
//! - [`enums`] -- Buzzer phase, rejection reasons, dump orderings
//! - [`structs`] -- Participants, press events, leaderboard rows

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{BuzzerPhase, PressOrder, RejectionReason};
pub use ids::{ArrivalTime, MAX_PARTICIPANT_ID_LEN, ParticipantId};
pub use structs::{BuzzerStatus, FirstPlace, LeaderboardEntry, Participant, PressEvent};
