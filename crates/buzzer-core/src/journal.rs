//! Durable write-through seam for the service.
//!
//! The arbitration core is purely in-memory. When durability across
//! restarts is wanted, [`crate::BuzzerService`] writes every mutation to a
//! [`Journal`] *before* making it visible in memory. A journal that
//! reports [`JournalError::Conflict`] is telling the service that the
//! store's uniqueness constraint fired. The store then holds a row memory
//! does not (typically a write whose acknowledgement was lost), so the
//! service loads that row back, adopts it, and only then reports the
//! matching domain rejection.

use buzzer_types::{Participant, ParticipantId, PressEvent};
use futures::future::BoxFuture;

/// Future returned by journal operations.
pub type JournalFuture<'a> = BoxFuture<'a, Result<(), JournalError>>;

/// Future returned by journal lookups.
pub type LoadFuture<'a, T> = BoxFuture<'a, Result<Option<T>, JournalError>>;

/// Errors reported by a journal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JournalError {
    /// A uniqueness constraint rejected the write.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The store failed; the write may or may not have happened.
    #[error("storage failure: {0}")]
    Storage(String),
}

/// Write-through persistence for buzzer state.
pub trait Journal: Send + Sync {
    /// Persist a newly registered participant.
    fn record_participant<'a>(&'a self, participant: &'a Participant) -> JournalFuture<'a>;

    /// Persist an accepted press.
    fn record_press<'a>(&'a self, press: &'a PressEvent) -> JournalFuture<'a>;

    /// Persist the buzzer flag.
    fn record_active(&self, active: bool) -> JournalFuture<'_>;

    /// Clear presses and set the flag to active, atomically.
    fn record_reset(&self) -> JournalFuture<'_>;

    /// Load a stored participant by ID.
    fn load_participant<'a>(&'a self, id: &'a ParticipantId) -> LoadFuture<'a, Participant>;

    /// Load the stored press of a participant in the current round.
    fn load_press<'a>(&'a self, participant_id: &'a ParticipantId) -> LoadFuture<'a, PressEvent>;
}
