//! `PostgreSQL` persistence for the quiz buzzer.
//!
//! Three tables back one event: `participants`, `presses` (with
//! `participant_id UNIQUE`), and the `system_state` key/value table holding
//! `buzzer_active`. Writes go through the stores below; boot-time restore
//! goes through [`load_snapshot`].
//!
//! # Modules
//!
//! - [`postgres`] -- connection pool and configuration
//! - [`participant_store`] -- participant inserts and listing
//! - [`press_store`] -- press inserts, clearing, and listing
//! - [`state_store`] -- buzzer flag and the atomic round reset
//! - [`snapshot`] -- full state load at startup
//! - [`error`] -- shared error types

pub mod error;
pub mod participant_store;
pub mod postgres;
pub mod press_store;
pub mod snapshot;
pub mod state_store;

// Re-export primary types for convenience.
pub use error::DbError;
pub use participant_store::{ParticipantRow, ParticipantStore};
pub use postgres::{PostgresConfig, PostgresPool};
pub use press_store::{PressRow, PressStore};
pub use snapshot::load_snapshot;
pub use state_store::{BUZZER_ACTIVE_KEY, SystemStateStore};
