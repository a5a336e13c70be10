//! Operations on the `presses` table.
//!
//! The `participant_id UNIQUE` constraint is the storage-side guard of the
//! one-press-per-participant rule; a second insert for the same participant
//! fails with [`DbError::Conflict`].

use buzzer_types::{ArrivalTime, ParticipantId, PressEvent, PressOrder};
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::error::DbError;

/// Operations on the `presses` table.
pub struct PressStore<'a> {
    pool: &'a PgPool,
}

impl<'a> PressStore<'a> {
    /// Create a new press store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert an accepted press.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Conflict`] if the participant already has a
    /// stored press, or [`DbError::Postgres`] for any other failure.
    pub async fn insert(&self, press: &PressEvent) -> Result<(), DbError> {
        let arrival = i64::try_from(press.arrival_time.as_nanos()).unwrap_or(i64::MAX);
        sqlx::query(
            r"INSERT INTO presses (name, participant_id, display_time, arrival_time, pressed_at)
              VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&press.name)
        .bind(press.participant_id.as_str())
        .bind(&press.display_time)
        .bind(arrival)
        .bind(press.pressed_at)
        .execute(self.pool)
        .await
        .map_err(DbError::from_write)?;

        tracing::debug!(participant = %press.participant_id, "Stored press");
        Ok(())
    }

    /// Delete every press.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the delete fails.
    pub async fn clear(&self) -> Result<u64, DbError> {
        let result = sqlx::query(r"DELETE FROM presses")
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Load the press of one participant, if stored.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails, or
    /// [`DbError::InvalidRow`] if the stored row is malformed.
    pub async fn get(&self, participant_id: &ParticipantId) -> Result<Option<PressEvent>, DbError> {
        let row = sqlx::query_as::<_, PressRow>(
            r"SELECT id, name, participant_id, display_time, arrival_time, pressed_at
              FROM presses WHERE participant_id = $1",
        )
        .bind(participant_id.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(PressEvent::try_from).transpose()
    }

    /// Load every press in the requested order.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails, or
    /// [`DbError::InvalidRow`] if a stored arrival time is negative.
    pub async fn all(&self, order: PressOrder) -> Result<Vec<PressEvent>, DbError> {
        let sql = match order {
            PressOrder::Arrival => {
                r"SELECT id, name, participant_id, display_time, arrival_time, pressed_at
                  FROM presses ORDER BY arrival_time, id"
            }
            PressOrder::Insertion => {
                r"SELECT id, name, participant_id, display_time, arrival_time, pressed_at
                  FROM presses ORDER BY id"
            }
        };
        let rows = sqlx::query_as::<_, PressRow>(sql)
            .fetch_all(self.pool)
            .await?;

        rows.into_iter().map(PressEvent::try_from).collect()
    }
}

/// A row from the `presses` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PressRow {
    /// Auto-incremented insertion ID.
    pub id: i64,
    /// Participant name at press time.
    pub name: String,
    /// Participant ID.
    pub participant_id: String,
    /// Formatted wall-clock time.
    pub display_time: String,
    /// Monotonic arrival time in nanoseconds.
    pub arrival_time: i64,
    /// Wall-clock acceptance instant.
    pub pressed_at: DateTime<Utc>,
}

impl TryFrom<PressRow> for PressEvent {
    type Error = DbError;

    fn try_from(row: PressRow) -> Result<Self, Self::Error> {
        let arrival = u64::try_from(row.arrival_time).map_err(|_| {
            DbError::InvalidRow(format!("negative arrival_time for press {}", row.id))
        })?;
        let sequence = u64::try_from(row.id)
            .map_err(|_| DbError::InvalidRow(format!("negative press id {}", row.id)))?;
        Ok(Self {
            sequence,
            participant_id: ParticipantId::new(row.participant_id),
            name: row.name,
            display_time: row.display_time,
            arrival_time: ArrivalTime(arrival),
            pressed_at: row.pressed_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: i64, arrival_time: i64) -> PressRow {
        PressRow {
            id,
            name: String::from("Alice"),
            participant_id: String::from("p1"),
            display_time: String::from("10:00:00.000"),
            arrival_time,
            pressed_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    #[test]
    fn row_converts_to_event() {
        let event = PressEvent::try_from(row(3, 1_500));
        assert!(matches!(
            event,
            Ok(PressEvent { sequence: 3, arrival_time: ArrivalTime(1_500), .. })
        ));
    }

    #[test]
    fn negative_arrival_is_rejected() {
        assert!(matches!(
            PressEvent::try_from(row(1, -1)),
            Err(DbError::InvalidRow(_))
        ));
    }
}
