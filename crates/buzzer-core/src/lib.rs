//! Configuration, admin gate, and service facade for the quiz buzzer.
//!
//! # Modules
//!
//! - [`config`] -- YAML configuration with environment overrides
//! - [`admin`] -- [`AdminGate`], [`CredentialStore`], password hashing
//! - [`journal`] -- the [`Journal`] write-through seam for durability
//! - [`service`] -- [`BuzzerService`], the API presentation layers call

pub mod admin;
pub mod config;
pub mod journal;
pub mod service;

// Re-export primary types for convenience.
pub use admin::{
    AdminGate, AdminSession, AdminToken, CredentialStore, StaticCredentials, StoredCredential,
    generate_salt, hash_password,
};
pub use buzzer_ledger::NotAuthorized;
pub use config::{BuzzerConfig, ConfigError};
pub use journal::{Journal, JournalError, JournalFuture, LoadFuture};
pub use service::{BuzzerService, ServiceError};
