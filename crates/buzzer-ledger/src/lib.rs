//! First-press arbitration and ranking engine for the quiz buzzer.
//!
//! Given concurrent press attempts from many clients, the engine decides
//! admission (at most one recorded press per participant), assigns a total
//! order by arrival, and serves a consistent leaderboard to every reader.
//!
//! # Architecture
//!
//! - [`clock`] -- [`ArrivalClock`]: strictly increasing arrival readings
//!   and the display timestamp.
//! - [`registry`] -- [`Registry`]: participant ID to name, IDs unique.
//! - [`switch`] -- [`BuzzerSwitch`]: the admin-gated active/disabled flag.
//! - [`ledger`] -- [`PressLedger`]: append-only, deduplicated press log.
//! - [`leaderboard`] -- ranking derived from a ledger snapshot.
//! - [`arbiter`] -- [`Arbiter`]: the shared store composing all of the
//!   above behind locks, constructed once per event.
//!
//! # Locking
//!
//! The registry sits behind its own lock. The switch, the ledger, and the
//! clock share one lock (the *round*), so a press reads the flag, checks
//! the registry, stamps its arrival, and inserts in a single write
//! section, and a reset clears presses and re-activates the buzzer in a
//! single write section. Locks are always taken round first, registry
//! second.
//!
//! # Usage
//!
//! ```
//! use buzzer_ledger::Arbiter;
//!
//! let arbiter = Arbiter::default();
//! arbiter.register("p1", "Alice").ok();
//! arbiter.register("p2", "Bob").ok();
//!
//! arbiter.try_press(&"p2".into()).ok();
//! arbiter.try_press(&"p1".into()).ok();
//!
//! let board = arbiter.leaderboard();
//! assert_eq!(board.len(), 2);
//! assert_eq!(board.first().map(|e| e.name.as_str()), Some("Bob"));
//! ```

pub mod arbiter;
pub mod clock;
pub mod leaderboard;
pub mod ledger;
pub mod registry;
pub mod switch;

// Re-export primary types at crate root.
pub use arbiter::{Arbiter, RestoredState, RoundSnapshot};
pub use clock::{ArrivalClock, Stamp};
pub use ledger::PressLedger;
pub use registry::{MAX_NAME_LEN, Registry};
pub use switch::BuzzerSwitch;

use buzzer_types::{ParticipantId, RejectionReason};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors returned by participant registration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// The ID is already registered. The existing entry is left untouched.
    #[error("participant {id} is already registered")]
    AlreadyRegistered {
        /// The conflicting identifier.
        id: ParticipantId,
    },

    /// The supplied ID is blank or too long.
    #[error("invalid participant id: {reason}")]
    InvalidId {
        /// What is wrong with the ID.
        reason: &'static str,
    },

    /// The supplied display name is blank or too long.
    #[error("invalid participant name: {reason}")]
    InvalidName {
        /// What is wrong with the name.
        reason: &'static str,
    },
}

/// A press attempt that was not recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("press rejected: {reason}")]
pub struct PressRejected {
    /// The highest-priority reason the press failed.
    pub reason: RejectionReason,
}

impl PressRejected {
    /// The buzzer is disabled.
    pub const DISABLED: Self = Self {
        reason: RejectionReason::BuzzerDisabled,
    };
    /// The caller is not registered.
    pub const UNKNOWN: Self = Self {
        reason: RejectionReason::UnknownParticipant,
    };
    /// The caller already pressed this round.
    pub const DUPLICATE: Self = Self {
        reason: RejectionReason::AlreadyPressed,
    };
}

impl From<RejectionReason> for PressRejected {
    fn from(reason: RejectionReason) -> Self {
        Self { reason }
    }
}

/// A state-mutating admin operation was attempted without admin rights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("admin authorization required")]
pub struct NotAuthorized;
