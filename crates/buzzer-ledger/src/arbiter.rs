//! The shared arbitration store.
//!
//! An [`Arbiter`] is constructed once per event and handed by reference
//! (usually inside an `Arc`) to every request handler. It owns the
//! [`Registry`] and the current *round*: the [`BuzzerSwitch`], the
//! [`PressLedger`], and the [`ArrivalClock`].
//!
//! # Atomic sections
//!
//! | Operation | Locks |
//! |-----------|-------|
//! | `register` | registry (write) |
//! | `try_press` | round (write), then registry (read) |
//! | `adopt_participant` | registry (write) |
//! | `adopt_press` | round (write), then registry (read) |
//! | `reset` | round (write) |
//! | `set_active` | round (write) |
//! | readers | round (read), registry (read) when needed |
//!
//! A press holds the round write lock from the moment it reads the flag
//! until its event is inserted, so two presses from the same participant
//! cannot both pass the duplicate check, a reset can never interleave
//! with a half-recorded press, and arrival readings are issued in
//! acceptance order.
//!
//! Every critical section leaves the data consistent before anything that
//! could panic, so a poisoned lock is recovered rather than propagated.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use buzzer_types::{
    BuzzerStatus, FirstPlace, LeaderboardEntry, Participant, ParticipantId, PressEvent, PressOrder,
};
use chrono::FixedOffset;
use tracing::{debug, info};

use crate::clock::ArrivalClock;
use crate::leaderboard;
use crate::ledger::PressLedger;
use crate::registry::Registry;
use crate::switch::BuzzerSwitch;
use crate::{NotAuthorized, PressRejected, RegistryError};

/// Everything guarded by the round lock.
#[derive(Debug, Default)]
struct Round {
    switch: BuzzerSwitch,
    ledger: PressLedger,
    clock: ArrivalClock,
}

/// A consistent view of the round, taken under a single read lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundSnapshot {
    /// Whether presses are accepted.
    pub active: bool,
    /// The ranked leaderboard.
    pub leaderboard: Vec<LeaderboardEntry>,
    /// Number of presses recorded in the round.
    pub presses: u64,
}

/// State loaded from durable storage at startup.
#[derive(Debug, Clone, Default)]
pub struct RestoredState {
    /// Registered participants.
    pub participants: Vec<Participant>,
    /// Presses of the current round, in insertion order.
    pub presses: Vec<PressEvent>,
    /// Persisted buzzer flag.
    pub active: bool,
}

/// The shared store for one quiz event.
#[derive(Debug, Default)]
pub struct Arbiter {
    registry: RwLock<Registry>,
    round: RwLock<Round>,
}

impl Arbiter {
    /// Create an empty store whose display times use `display_offset`.
    pub fn new(display_offset: FixedOffset) -> Self {
        Self {
            registry: RwLock::new(Registry::new()),
            round: RwLock::new(Round {
                switch: BuzzerSwitch::new(),
                ledger: PressLedger::new(),
                clock: ArrivalClock::new(display_offset),
            }),
        }
    }

    /// Create a store pre-populated from storage.
    ///
    /// Restored presses are re-inserted in insertion order with fresh
    /// 1-based sequence numbers; a press whose participant is unknown or
    /// duplicated is skipped. The arrival clock resumes after the largest
    /// restored arrival time.
    pub fn restore(display_offset: FixedOffset, state: RestoredState) -> Self {
        let arbiter = Self::new(display_offset);
        {
            let mut registry = write(&arbiter.registry);
            for participant in state.participants {
                let _ = registry.restore(participant);
            }
        }
        {
            let mut round = write(&arbiter.round);
            round.switch = BuzzerSwitch::with_active(state.active);
            let registry = read(&arbiter.registry);
            for mut event in state.presses {
                if registry.lookup(&event.participant_id).is_none() {
                    debug!(participant = %event.participant_id, "Skipping restored press for unknown participant");
                    continue;
                }
                event.sequence = round.ledger.next_sequence();
                if round.ledger.insert(event).is_err() {
                    debug!("Skipping duplicate restored press");
                }
            }
            if let Some(latest) = round.ledger.latest_arrival() {
                round.clock.resume_after(latest);
            }
            info!(
                participants = registry.len(),
                presses = round.ledger.len(),
                active = round.switch.is_active(),
                "Arbiter restored"
            );
        }
        arbiter
    }

    // -----------------------------------------------------------------------
    // Registry
    // -----------------------------------------------------------------------

    /// Register a participant.
    ///
    /// # Errors
    ///
    /// [`RegistryError::AlreadyRegistered`] if the ID is taken (the
    /// existing name is kept), or an input validation error.
    pub fn register(&self, id: &str, name: &str) -> Result<Participant, RegistryError> {
        let participant = write(&self.registry).register(id, name)?;
        info!(participant = %participant.id, name = %participant.name, "Participant registered");
        Ok(participant)
    }

    /// Validate a registration without recording it.
    ///
    /// # Errors
    ///
    /// Same as [`register`](Self::register).
    pub fn check_registration(&self, id: &str, name: &str) -> Result<Participant, RegistryError> {
        read(&self.registry).check(id, name)
    }

    /// Record a participant that has already been validated and persisted.
    ///
    /// # Errors
    ///
    /// [`RegistryError::AlreadyRegistered`] if the ID was taken in the
    /// meantime.
    pub fn commit_registration(&self, participant: &Participant) -> Result<Participant, RegistryError> {
        self.register(participant.id.as_str(), &participant.name)
    }

    /// Record a participant that storage already holds.
    ///
    /// Used when a write conflicts with a row this process has not seen.
    /// An entry already in memory is kept.
    pub fn adopt_participant(&self, participant: Participant) -> Participant {
        let adopted = write(&self.registry).restore(participant).clone();
        info!(participant = %adopted.id, name = %adopted.name, "Stored participant adopted");
        adopted
    }

    /// Look up a participant.
    pub fn lookup(&self, id: &ParticipantId) -> Option<Participant> {
        read(&self.registry).lookup(id).cloned()
    }

    /// All participants as an ID-to-name mapping.
    pub fn participants(&self) -> BTreeMap<ParticipantId, String> {
        read(&self.registry).names()
    }

    // -----------------------------------------------------------------------
    // Buzzer state
    // -----------------------------------------------------------------------

    /// Whether presses are currently accepted.
    pub fn is_active(&self) -> bool {
        read(&self.round).switch.is_active()
    }

    /// Enable or disable the buzzer.
    ///
    /// # Errors
    ///
    /// [`NotAuthorized`] when `caller_is_admin` is false.
    pub fn set_active(&self, active: bool, caller_is_admin: bool) -> Result<(), NotAuthorized> {
        write(&self.round).switch.set_active(active, caller_is_admin)?;
        info!(active, "Buzzer state changed");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Presses
    // -----------------------------------------------------------------------

    /// Attempt to record a press for `participant_id`.
    ///
    /// The arrival time is taken inside the critical section, so it
    /// reflects the order in which presses were accepted, never a time
    /// claimed by the caller.
    ///
    /// # Errors
    ///
    /// In priority order: buzzer disabled, unknown participant, already
    /// pressed.
    pub fn try_press(&self, participant_id: &ParticipantId) -> Result<PressEvent, PressRejected> {
        let mut round = write(&self.round);
        let event = self.admit(&mut round, participant_id)?;
        round.ledger.insert(event.clone())?;
        info!(
            participant = %event.participant_id,
            sequence = event.sequence,
            arrival = %event.arrival_time,
            display_time = %event.display_time,
            "Press accepted"
        );
        Ok(event)
    }

    /// Run every press check and stamp the would-be event without
    /// recording it.
    ///
    /// Used when the press has to be persisted before it becomes visible.
    /// The caller must serialise prepare and
    /// [`commit_press`](Self::commit_press) against other mutations.
    ///
    /// # Errors
    ///
    /// Same as [`try_press`](Self::try_press).
    pub fn prepare_press(&self, participant_id: &ParticipantId) -> Result<PressEvent, PressRejected> {
        let mut round = write(&self.round);
        self.admit(&mut round, participant_id)
    }

    /// Record a press produced by [`prepare_press`](Self::prepare_press).
    ///
    /// All checks are repeated, so a commit can never violate the
    /// at-most-one invariant even if the caller's serialisation failed.
    ///
    /// # Errors
    ///
    /// Same as [`try_press`](Self::try_press).
    pub fn commit_press(&self, event: PressEvent) -> Result<PressEvent, PressRejected> {
        let mut round = write(&self.round);
        if !round.switch.is_active() {
            return Err(PressRejected::DISABLED);
        }
        if read(&self.registry).lookup(&event.participant_id).is_none() {
            return Err(PressRejected::UNKNOWN);
        }
        let event = PressEvent {
            sequence: round.ledger.next_sequence(),
            ..event
        };
        round.ledger.insert(event.clone())?;
        info!(
            participant = %event.participant_id,
            sequence = event.sequence,
            arrival = %event.arrival_time,
            "Press committed"
        );
        Ok(event)
    }

    /// Record a press that storage already holds.
    ///
    /// The buzzer flag is not checked: the press was accepted when it was
    /// persisted. If the participant already has a press in memory that
    /// one is returned unchanged. The arrival clock is advanced past the
    /// stored reading.
    ///
    /// # Errors
    ///
    /// [`PressRejected::UNKNOWN`] if the participant is not registered.
    pub fn adopt_press(&self, event: PressEvent) -> Result<PressEvent, PressRejected> {
        let mut round = write(&self.round);
        if read(&self.registry).lookup(&event.participant_id).is_none() {
            return Err(PressRejected::UNKNOWN);
        }
        if let Some(existing) = round.ledger.get(&event.participant_id) {
            return Ok(existing.clone());
        }
        let event = PressEvent {
            sequence: round.ledger.next_sequence(),
            ..event
        };
        round.clock.observe(event.arrival_time);
        round.ledger.insert(event.clone())?;
        info!(
            participant = %event.participant_id,
            sequence = event.sequence,
            arrival = %event.arrival_time,
            "Stored press adopted"
        );
        Ok(event)
    }

    fn admit(
        &self,
        round: &mut Round,
        participant_id: &ParticipantId,
    ) -> Result<PressEvent, PressRejected> {
        if !round.switch.is_active() {
            debug!(participant = %participant_id, "Press rejected: buzzer disabled");
            return Err(PressRejected::DISABLED);
        }
        let Some(participant) = read(&self.registry).lookup(participant_id).cloned() else {
            debug!(participant = %participant_id, "Press rejected: unknown participant");
            return Err(PressRejected::UNKNOWN);
        };
        if round.ledger.contains(participant_id) {
            debug!(participant = %participant_id, "Press rejected: already pressed");
            return Err(PressRejected::DUPLICATE);
        }

        let stamp = round.clock.stamp();
        Ok(PressEvent {
            sequence: round.ledger.next_sequence(),
            participant_id: participant.id,
            name: participant.name,
            display_time: stamp.display,
            arrival_time: stamp.arrival,
            pressed_at: stamp.wall,
        })
    }

    /// Clear every press and re-activate the buzzer in one step.
    ///
    /// Authorization is checked by the caller.
    pub fn reset(&self) {
        let mut round = write(&self.round);
        let cleared = round.ledger.len();
        round.ledger.clear();
        round.switch.force_active();
        info!(cleared, "Round reset");
    }

    /// Display time of the participant's press, if they have one.
    pub fn press_status(&self, participant_id: &ParticipantId) -> Option<String> {
        read(&self.round)
            .ledger
            .get(participant_id)
            .map(|e| e.display_time.clone())
    }

    /// All presses in the requested order.
    pub fn presses(&self, order: PressOrder) -> Vec<PressEvent> {
        let round = read(&self.round);
        match order {
            PressOrder::Arrival => round.ledger.in_arrival_order(),
            PressOrder::Insertion => round.ledger.in_insertion_order().to_vec(),
        }
    }

    // -----------------------------------------------------------------------
    // Leaderboard
    // -----------------------------------------------------------------------

    /// The ranked leaderboard.
    pub fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        leaderboard::rank(&read(&self.round).ledger)
    }

    /// The fastest press, if any.
    pub fn first(&self) -> Option<FirstPlace> {
        leaderboard::first(&read(&self.round).ledger)
    }

    /// Flag and leaderboard from the same read.
    pub fn snapshot(&self) -> RoundSnapshot {
        let round = read(&self.round);
        RoundSnapshot {
            active: round.switch.is_active(),
            leaderboard: leaderboard::rank(&round.ledger),
            presses: u64::try_from(round.ledger.len()).unwrap_or(u64::MAX),
        }
    }

    /// Active flag and counts.
    pub fn status(&self) -> BuzzerStatus {
        let round = read(&self.round);
        let participants = read(&self.registry).len();
        BuzzerStatus {
            active: round.switch.is_active(),
            participants: u64::try_from(participants).unwrap_or(u64::MAX),
            presses: u64::try_from(round.ledger.len()).unwrap_or(u64::MAX),
        }
    }
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
