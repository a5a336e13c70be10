//! Error types for the buzzer server binary.

/// Top-level error for the server binary.
///
/// Each variant wraps a subsystem error so `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: buzzer_core::ConfigError,
    },

    /// `PostgreSQL` connection, migration, or restore failed.
    #[error("database error: {source}")]
    Database {
        /// The underlying database error.
        #[from]
        source: buzzer_db::DbError,
    },

    /// The HTTP server failed to bind or serve.
    #[error("server error: {source}")]
    Serve {
        /// The underlying serve error.
        #[from]
        source: buzzer_api::ServeError,
    },

    /// Bad command-line usage.
    #[error("usage: {message}")]
    Usage {
        /// What was wrong with the invocation.
        message: String,
    },
}
