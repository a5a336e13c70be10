//! Error types for the persistence layer.
//!
//! All errors are propagated via [`DbError`]. A `PostgreSQL` unique
//! violation is lifted out of [`sqlx::Error`] into [`DbError::Conflict`]
//! so callers can map it to the matching domain rejection.

/// Errors that can occur in the persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A `PostgreSQL` operation failed.
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// A `PostgreSQL` migration failed.
    #[error("PostgreSQL migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A unique constraint rejected the write.
    #[error("Unique constraint violated: {constraint}")]
    Conflict {
        /// Name of the violated constraint, if reported.
        constraint: String,
    },

    /// A stored row could not be turned back into a domain value.
    #[error("Invalid stored row: {0}")]
    InvalidRow(String),

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl DbError {
    /// Classify a raw [`sqlx::Error`], lifting unique violations.
    pub fn from_write(err: sqlx::Error) -> Self {
        let conflict = err
            .as_database_error()
            .filter(|db| db.is_unique_violation())
            .map(|db| db.constraint().unwrap_or("unique").to_owned());
        match conflict {
            Some(constraint) => Self::Conflict { constraint },
            None => Self::Postgres(err),
        }
    }
}
