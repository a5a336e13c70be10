//! Buzzer state machine: `Active` / `Disabled`, admin-gated.

use buzzer_types::BuzzerPhase;

use crate::NotAuthorized;

/// The global buzzer flag. Starts [`BuzzerPhase::Active`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuzzerSwitch {
    phase: BuzzerPhase,
}

impl BuzzerSwitch {
    /// Create a switch in the active state.
    pub const fn new() -> Self {
        Self {
            phase: BuzzerPhase::Active,
        }
    }

    /// Create a switch in a given state (used when restoring).
    pub const fn with_active(active: bool) -> Self {
        Self {
            phase: BuzzerPhase::from_active(active),
        }
    }

    /// Enable or disable the buzzer.
    ///
    /// # Errors
    ///
    /// Returns [`NotAuthorized`] when `caller_is_admin` is false; the
    /// state is left unchanged.
    pub const fn set_active(
        &mut self,
        active: bool,
        caller_is_admin: bool,
    ) -> Result<(), NotAuthorized> {
        if !caller_is_admin {
            return Err(NotAuthorized);
        }
        self.phase = BuzzerPhase::from_active(active);
        Ok(())
    }

    /// Whether presses are accepted.
    pub const fn is_active(&self) -> bool {
        self.phase.is_active()
    }

    /// Current phase.
    pub const fn phase(&self) -> BuzzerPhase {
        self.phase
    }

    /// Force the active state. Only reachable through a reset, which is
    /// itself gated at its call site.
    pub(crate) const fn force_active(&mut self) {
        self.phase = BuzzerPhase::Active;
    }
}
