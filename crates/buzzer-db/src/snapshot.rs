//! Boot-time restore of the full buzzer state.

use buzzer_ledger::RestoredState;
use buzzer_types::PressOrder;
use sqlx::PgPool;

use crate::error::DbError;
use crate::participant_store::ParticipantStore;
use crate::press_store::PressStore;
use crate::state_store::SystemStateStore;

/// Load participants, presses (insertion order), and the buzzer flag.
///
/// # Errors
///
/// Returns [`DbError`] if any query fails or a row is invalid.
pub async fn load_snapshot(pool: &PgPool) -> Result<RestoredState, DbError> {
    let participants = ParticipantStore::new(pool).all().await?;
    let presses = PressStore::new(pool).all(PressOrder::Insertion).await?;
    let active = SystemStateStore::new(pool).buzzer_active().await?;

    tracing::info!(
        participants = participants.len(),
        presses = presses.len(),
        active,
        "Loaded buzzer state from PostgreSQL"
    );

    Ok(RestoredState {
        participants,
        presses,
        active,
    })
}
