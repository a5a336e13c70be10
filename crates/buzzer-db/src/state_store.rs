//! Operations on the `system_state` key/value table.

use sqlx::PgPool;

use crate::error::DbError;

/// Key of the buzzer flag.
pub const BUZZER_ACTIVE_KEY: &str = "buzzer_active";

/// Operations on the `system_state` table.
pub struct SystemStateStore<'a> {
    pool: &'a PgPool,
}

impl<'a> SystemStateStore<'a> {
    /// Create a new state store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Read the buzzer flag. A missing row reads as active.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn buzzer_active(&self) -> Result<bool, DbError> {
        let row: Option<(String,)> =
            sqlx::query_as(r"SELECT value FROM system_state WHERE key = $1")
                .bind(BUZZER_ACTIVE_KEY)
                .fetch_optional(self.pool)
                .await?;

        Ok(row.is_none_or(|(value,)| parse_flag(&value)))
    }

    /// Write the buzzer flag.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the upsert fails.
    pub async fn set_buzzer_active(&self, active: bool) -> Result<(), DbError> {
        sqlx::query(
            r"INSERT INTO system_state (key, value) VALUES ($1, $2)
              ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value",
        )
        .bind(BUZZER_ACTIVE_KEY)
        .bind(flag_value(active))
        .execute(self.pool)
        .await?;

        tracing::debug!(active, "Stored buzzer flag");
        Ok(())
    }

    /// Clear all presses and set the buzzer active in one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if any statement fails; nothing is
    /// committed in that case.
    pub async fn reset_round(&self) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;

        let cleared = sqlx::query(r"DELETE FROM presses")
            .execute(&mut *tx)
            .await?
            .rows_affected();

        sqlx::query(
            r"INSERT INTO system_state (key, value) VALUES ($1, $2)
              ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value",
        )
        .bind(BUZZER_ACTIVE_KEY)
        .bind(flag_value(true))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(cleared, "Round reset persisted");
        Ok(())
    }
}

const fn flag_value(active: bool) -> &'static str {
    if active { "true" } else { "false" }
}

fn parse_flag(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_encoding() {
        assert_eq!(flag_value(true), "true");
        assert_eq!(flag_value(false), "false");
        assert!(parse_flag("true"));
        assert!(parse_flag(" TRUE "));
        assert!(!parse_flag("false"));
        assert!(!parse_flag("garbage"));
    }
}
