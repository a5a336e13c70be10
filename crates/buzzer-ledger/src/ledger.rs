//! The press ledger: an append-only, deduplicated log of accepted presses.
//!
//! # Design
//!
//! - **At most one press per participant**: a second insert for the same
//!   ID is rejected with [`RejectionReason::AlreadyPressed`] and the first
//!   press is left untouched.
//! - **Append-only**: entries are never modified; the only removal is a
//!   whole-ledger [`clear`](PressLedger::clear).
//! - **Insertion order is kept**: entries are stored in the order they
//!   were accepted, which doubles as the tie-break for ranking.
//!
//! The ledger itself is not synchronised; [`crate::Arbiter`] owns it
//! behind the round lock.
//!
//! [`RejectionReason::AlreadyPressed`]: buzzer_types::RejectionReason::AlreadyPressed

use std::collections::BTreeMap;

use buzzer_types::{ArrivalTime, ParticipantId, PressEvent};

use crate::PressRejected;

/// Deduplicated press log for the current round.
#[derive(Debug, Default, Clone)]
pub struct PressLedger {
    /// Accepted presses, in insertion order.
    entries: Vec<PressEvent>,
    /// Participant ID to position in `entries`.
    index: BTreeMap<ParticipantId, usize>,
}

impl PressLedger {
    /// Create an empty ledger.
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: BTreeMap::new(),
        }
    }

    /// Number of recorded presses.
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no press has been recorded.
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sequence number the next accepted press will receive (1-based).
    pub fn next_sequence(&self) -> u64 {
        u64::try_from(self.entries.len())
            .unwrap_or(u64::MAX)
            .saturating_add(1)
    }

    /// Whether the participant already has a press recorded.
    pub fn contains(&self, id: &ParticipantId) -> bool {
        self.index.contains_key(id)
    }

    /// The participant's press, if any.
    pub fn get(&self, id: &ParticipantId) -> Option<&PressEvent> {
        self.index.get(id).and_then(|&i| self.entries.get(i))
    }

    /// Append a press.
    ///
    /// The check for an existing press and the insert happen under the
    /// same `&mut` borrow, so they are atomic with respect to every other
    /// ledger operation.
    ///
    /// # Errors
    ///
    /// Returns [`PressRejected::DUPLICATE`] if the participant already has
    /// a press; the ledger is unchanged.
    pub fn insert(&mut self, event: PressEvent) -> Result<(), PressRejected> {
        if self.index.contains_key(&event.participant_id) {
            return Err(PressRejected::DUPLICATE);
        }
        let position = self.entries.len();
        self.index.insert(event.participant_id.clone(), position);
        self.entries.push(event);
        Ok(())
    }

    /// Remove every press.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }

    /// Presses in insertion order (the audit view).
    pub fn in_insertion_order(&self) -> &[PressEvent] {
        &self.entries
    }

    /// Presses by ascending arrival time.
    ///
    /// The sort is stable, so if two presses ever carried the same arrival
    /// time they would keep their insertion order.
    pub fn in_arrival_order(&self) -> Vec<PressEvent> {
        let mut sorted = self.entries.clone();
        sorted.sort_by_key(|e| e.arrival_time);
        sorted
    }

    /// Largest arrival time recorded, if any.
    pub fn latest_arrival(&self) -> Option<ArrivalTime> {
        self.entries.iter().map(|e| e.arrival_time).max()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Utc;

    pub(crate) fn press(id: &str, arrival: u64, sequence: u64) -> PressEvent {
        PressEvent {
            sequence,
            participant_id: id.into(),
            name: format!("name-{id}"),
            display_time: String::from("00:00:00.000"),
            arrival_time: ArrivalTime(arrival),
            pressed_at: Utc::now(),
        }
    }

    #[test]
    fn new_ledger_is_empty() {
        let ledger = PressLedger::new();
        assert!(ledger.is_empty());
        assert_eq!(ledger.next_sequence(), 1);
    }

    #[test]
    fn second_press_is_rejected_and_first_kept() {
        let mut ledger = PressLedger::new();
        assert!(ledger.insert(press("p1", 10, 1)).is_ok());

        let again = ledger.insert(press("p1", 20, 2));
        assert_eq!(again, Err(PressRejected::DUPLICATE));
        assert_eq!(ledger.len(), 1);
        assert_eq!(
            ledger.get(&"p1".into()).map(|e| e.arrival_time),
            Some(ArrivalTime(10))
        );
    }

    #[test]
    fn arrival_order_is_stable_for_equal_times() {
        let mut ledger = PressLedger::new();
        let _ = ledger.insert(press("late", 30, 1));
        let _ = ledger.insert(press("tie-a", 10, 2));
        let _ = ledger.insert(press("tie-b", 10, 3));

        let order: Vec<String> = ledger
            .in_arrival_order()
            .into_iter()
            .map(|e| e.participant_id.0)
            .collect();
        assert_eq!(order, ["tie-a", "tie-b", "late"]);

        let audit: Vec<&str> = ledger
            .in_insertion_order()
            .iter()
            .map(|e| e.participant_id.as_str())
            .collect();
        assert_eq!(audit, ["late", "tie-a", "tie-b"]);
    }

    #[test]
    fn clear_allows_pressing_again() {
        let mut ledger = PressLedger::new();
        let _ = ledger.insert(press("p1", 1, 1));
        ledger.clear();
        assert!(ledger.is_empty());
        assert!(!ledger.contains(&"p1".into()));
        assert!(ledger.insert(press("p1", 2, 1)).is_ok());
    }

    #[test]
    fn latest_arrival_tracks_maximum() {
        let mut ledger = PressLedger::new();
        assert_eq!(ledger.latest_arrival(), None);
        let _ = ledger.insert(press("a", 50, 1));
        let _ = ledger.insert(press("b", 20, 2));
        assert_eq!(ledger.latest_arrival(), Some(ArrivalTime(50)));
    }
}
