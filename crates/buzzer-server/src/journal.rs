//! `PostgreSQL`-backed [`Journal`] for the buzzer service.

use buzzer_core::{Journal, JournalError, JournalFuture, LoadFuture};
use buzzer_db::{DbError, ParticipantStore, PostgresPool, PressStore, SystemStateStore};
use buzzer_types::{Participant, ParticipantId, PressEvent};

/// Writes every service mutation through to `PostgreSQL`.
#[derive(Debug, Clone)]
pub struct PgJournal {
    pool: PostgresPool,
}

impl PgJournal {
    /// Journal into `pool`.
    pub const fn new(pool: PostgresPool) -> Self {
        Self { pool }
    }
}

fn journal_error(err: DbError) -> JournalError {
    match err {
        DbError::Conflict { constraint } => JournalError::Conflict(constraint),
        other => JournalError::Storage(other.to_string()),
    }
}

impl Journal for PgJournal {
    fn record_participant<'a>(&'a self, participant: &'a Participant) -> JournalFuture<'a> {
        Box::pin(async move {
            ParticipantStore::new(self.pool.pool())
                .insert(participant)
                .await
                .map_err(journal_error)
        })
    }

    fn record_press<'a>(&'a self, press: &'a PressEvent) -> JournalFuture<'a> {
        Box::pin(async move {
            PressStore::new(self.pool.pool())
                .insert(press)
                .await
                .map_err(journal_error)
        })
    }

    fn record_active(&self, active: bool) -> JournalFuture<'_> {
        Box::pin(async move {
            SystemStateStore::new(self.pool.pool())
                .set_buzzer_active(active)
                .await
                .map_err(journal_error)
        })
    }

    fn record_reset(&self) -> JournalFuture<'_> {
        Box::pin(async move {
            SystemStateStore::new(self.pool.pool())
                .reset_round()
                .await
                .map_err(journal_error)
        })
    }

    fn load_participant<'a>(&'a self, id: &'a ParticipantId) -> LoadFuture<'a, Participant> {
        Box::pin(async move {
            ParticipantStore::new(self.pool.pool())
                .get(id)
                .await
                .map_err(journal_error)
        })
    }

    fn load_press<'a>(&'a self, participant_id: &'a ParticipantId) -> LoadFuture<'a, PressEvent> {
        Box::pin(async move {
            PressStore::new(self.pool.pool())
                .get(participant_id)
                .await
                .map_err(journal_error)
        })
    }
}
