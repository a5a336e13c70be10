//! Operations on the `participants` table.

use buzzer_types::{Participant, ParticipantId};
use sqlx::PgPool;

use crate::error::DbError;

/// Operations on the `participants` table.
pub struct ParticipantStore<'a> {
    pool: &'a PgPool,
}

impl<'a> ParticipantStore<'a> {
    /// Create a new participant store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a participant.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Conflict`] if the ID is already stored, or
    /// [`DbError::Postgres`] for any other failure.
    pub async fn insert(&self, participant: &Participant) -> Result<(), DbError> {
        sqlx::query(r"INSERT INTO participants (id, name) VALUES ($1, $2)")
            .bind(participant.id.as_str())
            .bind(&participant.name)
            .execute(self.pool)
            .await
            .map_err(DbError::from_write)?;

        tracing::debug!(participant = %participant.id, "Stored participant");
        Ok(())
    }

    /// Load one participant by ID.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn get(&self, id: &ParticipantId) -> Result<Option<Participant>, DbError> {
        let row = sqlx::query_as::<_, ParticipantRow>(
            r"SELECT id, name FROM participants WHERE id = $1",
        )
        .bind(id.as_str())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Participant::from))
    }

    /// Load every participant, ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn all(&self) -> Result<Vec<Participant>, DbError> {
        let rows = sqlx::query_as::<_, ParticipantRow>(
            r"SELECT id, name FROM participants ORDER BY id",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Participant::from).collect())
    }
}

/// A row from the `participants` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ParticipantRow {
    /// Participant ID.
    pub id: String,
    /// Display name.
    pub name: String,
}

impl From<ParticipantRow> for Participant {
    fn from(row: ParticipantRow) -> Self {
        Self {
            id: ParticipantId::new(row.id),
            name: row.name,
        }
    }
}
