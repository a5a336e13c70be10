//! Enumeration types shared by the arbitration core and its callers.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Global buzzer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum BuzzerPhase {
    /// Presses are accepted. This is the initial state and the state after
    /// every reset.
    #[default]
    Active,
    /// Presses are rejected with [`RejectionReason::BuzzerDisabled`].
    Disabled,
}

impl BuzzerPhase {
    /// Map the boolean `active` flag onto a phase.
    pub const fn from_active(active: bool) -> Self {
        if active { Self::Active } else { Self::Disabled }
    }

    /// Whether this phase accepts presses.
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

/// Why a press attempt was not recorded.
///
/// Variants are listed in the priority order in which they are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum RejectionReason {
    /// The buzzer is disabled.
    BuzzerDisabled,
    /// The caller is not a registered participant.
    UnknownParticipant,
    /// The participant already has a recorded press this round.
    AlreadyPressed,
}

impl RejectionReason {
    /// Stable machine-readable code, identical to the serde name.
    pub const fn code(self) -> &'static str {
        match self {
            Self::BuzzerDisabled => "buzzer_disabled",
            Self::UnknownParticipant => "unknown_participant",
            Self::AlreadyPressed => "already_pressed",
        }
    }
}

impl core::fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg = match self {
            Self::BuzzerDisabled => "buzzer is currently disabled",
            Self::UnknownParticipant => "participant is not registered",
            Self::AlreadyPressed => "participant has already pressed the buzzer",
        };
        f.write_str(msg)
    }
}

/// Ordering applied to an admin press dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum PressOrder {
    /// Ascending arrival time (ranking order).
    #[default]
    Arrival,
    /// Order in which presses were recorded (audit order).
    Insertion,
}
