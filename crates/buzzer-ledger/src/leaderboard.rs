//! Leaderboard view: a ranked projection of a ledger snapshot.
//!
//! Nothing here mutates. Callers hand in a ledger they have already
//! locked, so the ranking is always computed from one consistent read.

use buzzer_types::{FirstPlace, LeaderboardEntry};

use crate::ledger::PressLedger;

/// Rank every press by ascending arrival time.
///
/// Positions run `1..=N` with no gaps or ties. Equal arrival times, which
/// the arrival clock never produces, fall back to insertion order.
pub fn rank(ledger: &PressLedger) -> Vec<LeaderboardEntry> {
    ledger
        .in_arrival_order()
        .into_iter()
        .zip(1_u32..)
        .map(|(event, position)| LeaderboardEntry {
            position,
            participant_id: event.participant_id,
            name: event.name,
            display_time: event.display_time,
        })
        .collect()
}

/// The fastest press, or `None` when nobody has pressed.
pub fn first(ledger: &PressLedger) -> Option<FirstPlace> {
    ledger
        .in_insertion_order()
        .iter()
        .min_by_key(|e| e.arrival_time)
        .map(|e| FirstPlace {
            name: e.name.clone(),
            display_time: e.display_time.clone(),
        })
}
