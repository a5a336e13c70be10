//! Admin gate: credential checks and admin sessions.
//!
//! Credentials come from a [`CredentialStore`], a swappable collaborator
//! so the secret never lives in the core. The bundled
//! [`StaticCredentials`] holds one username with a salted SHA-256 digest
//! taken from configuration; plaintext passwords are never stored.
//!
//! A successful [`AdminGate::login`] issues an opaque [`AdminToken`]. The
//! presentation layer passes the token back on every admin call and
//! resolves it to an [`AdminSession`] with [`AdminGate::session`]; the
//! core assumes no ambient identity.

use std::collections::HashSet;
use std::str::FromStr;
use std::sync::{Arc, PoisonError, RwLock};

use buzzer_ledger::NotAuthorized;
use rand::Rng;
use sha2::{Digest, Sha256};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::AdminConfig;

/// Number of random bytes in a generated salt.
const SALT_BYTES: usize = 16;

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// A stored, hashed credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCredential {
    /// Salt prepended to the password before hashing.
    pub salt: String,
    /// Hex-encoded SHA-256 of `salt || password`.
    pub sha256_hex: String,
}

impl StoredCredential {
    /// Whether `password` hashes to the stored digest.
    ///
    /// A malformed stored digest never matches.
    pub fn verify(&self, password: &str) -> bool {
        let Ok(expected) = hex::decode(self.sha256_hex.trim()) else {
            return false;
        };
        digest(&self.salt, password).as_slice() == expected.as_slice()
    }
}

/// Source of admin credentials.
pub trait CredentialStore: Send + Sync {
    /// The stored credential for `username`, if that user exists.
    fn credential(&self, username: &str) -> Option<StoredCredential>;
}

/// A single admin account read from configuration.
#[derive(Debug, Clone)]
pub struct StaticCredentials {
    username: String,
    credential: Option<StoredCredential>,
}

impl StaticCredentials {
    /// Build from the `admin` config section. An empty digest disables
    /// the account.
    pub fn from_config(config: &AdminConfig) -> Self {
        let credential = config.is_configured().then(|| StoredCredential {
            salt: config.password_salt.clone(),
            sha256_hex: config.password_sha256.clone(),
        });
        Self {
            username: config.username.clone(),
            credential,
        }
    }

    /// Build an account directly from a plaintext password, hashing it
    /// with a fresh salt.
    pub fn with_password(username: &str, password: &str) -> Self {
        let salt = generate_salt();
        let sha256_hex = hash_password(&salt, password);
        Self {
            username: username.to_owned(),
            credential: Some(StoredCredential { salt, sha256_hex }),
        }
    }
}

impl CredentialStore for StaticCredentials {
    fn credential(&self, username: &str) -> Option<StoredCredential> {
        (username == self.username)
            .then(|| self.credential.clone())
            .flatten()
    }
}

/// Hex-encoded SHA-256 of `salt || password`.
pub fn hash_password(salt: &str, password: &str) -> String {
    hex::encode(digest(salt, password))
}

/// A random hex salt.
pub fn generate_salt() -> String {
    let bytes: [u8; SALT_BYTES] = rand::rng().random();
    hex::encode(bytes)
}

fn digest(salt: &str, password: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hasher.finalize().into()
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

/// Opaque bearer token identifying an admin session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AdminToken(Uuid);

impl core::fmt::Display for AdminToken {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl FromStr for AdminToken {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// Authorization state of one caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AdminSession {
    /// Whether the caller proved admin credentials.
    pub authenticated: bool,
}

impl AdminSession {
    /// A caller without admin rights.
    pub const ANONYMOUS: Self = Self {
        authenticated: false,
    };

    /// A caller with admin rights.
    pub const ADMIN: Self = Self {
        authenticated: true,
    };
}

/// Credential check and session registry for admin operations.
pub struct AdminGate {
    credentials: Arc<dyn CredentialStore>,
    sessions: RwLock<HashSet<AdminToken>>,
}

impl core::fmt::Debug for AdminGate {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let sessions = self
            .sessions
            .read()
            .map_or(0, |s| s.len());
        f.debug_struct("AdminGate")
            .field("sessions", &sessions)
            .finish_non_exhaustive()
    }
}

impl AdminGate {
    /// Create a gate backed by `credentials`.
    pub fn new(credentials: Arc<dyn CredentialStore>) -> Self {
        Self {
            credentials,
            sessions: RwLock::new(HashSet::new()),
        }
    }

    /// Check a username/password pair. Never errors; bad input is simply
    /// `false`.
    pub fn authenticate(&self, username: &str, password: &str) -> bool {
        self.credentials
            .credential(username)
            .is_some_and(|c| c.verify(password))
    }

    /// Authenticate and open a session.
    pub fn login(&self, username: &str, password: &str) -> Option<AdminToken> {
        if !self.authenticate(username, password) {
            warn!(username, "Admin login failed");
            return None;
        }
        let token = AdminToken(Uuid::new_v4());
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(token);
        info!(username, "Admin logged in");
        Some(token)
    }

    /// Close a session. Returns whether it existed.
    pub fn logout(&self, token: &AdminToken) -> bool {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(token)
    }

    /// Resolve a token to a session. Unknown tokens are anonymous.
    pub fn session(&self, token: Option<&AdminToken>) -> AdminSession {
        let authenticated = token.is_some_and(|t| {
            self.sessions
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .contains(t)
        });
        AdminSession { authenticated }
    }

    /// Guard for `set_active`, `reset`, and the admin dumps.
    ///
    /// # Errors
    ///
    /// [`NotAuthorized`] unless the session is authenticated.
    pub const fn require_admin(session: &AdminSession) -> Result<(), NotAuthorized> {
        if session.authenticated {
            Ok(())
        } else {
            Err(NotAuthorized)
        }
    }
}
