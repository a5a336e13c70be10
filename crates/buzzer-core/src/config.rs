//! Configuration loading and typed config structures for the quiz buzzer.
//!
//! The configuration lives in `buzzer-config.yaml` next to the binary.
//! Every field has a default, so an empty or missing file yields a working
//! in-memory server whose admin login is disabled until credentials are
//! configured.

use std::path::Path;

use chrono::FixedOffset;
use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but is out of range.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level buzzer configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BuzzerConfig {
    /// HTTP listener settings.
    #[serde(default)]
    pub http: HttpConfig,

    /// Admin credential.
    #[serde(default)]
    pub admin: AdminConfig,

    /// Display time settings.
    #[serde(default)]
    pub display: DisplayConfig,

    /// Durable storage.
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl BuzzerConfig {
    /// Load configuration from a YAML file, then apply environment
    /// overrides.
    ///
    /// Environment variables:
    /// - `DATABASE_URL` overrides `persistence.postgres_url`
    /// - `BUZZER_PORT` overrides `http.port`
    /// - `BUZZER_ADMIN_USERNAME` overrides `admin.username`
    /// - `BUZZER_ADMIN_PASSWORD_SALT` overrides `admin.password_salt`
    /// - `BUZZER_ADMIN_PASSWORD_SHA256` overrides `admin.password_sha256`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Like [`from_file`](Self::from_file), but a missing file yields the
    /// defaults (still subject to environment overrides).
    ///
    /// # Errors
    ///
    /// Same as [`from_file`](Self::from_file) for files that exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            return Self::from_file(path);
        }
        let mut config = Self::default();
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a YAML string, then apply environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("DATABASE_URL") {
            self.persistence.postgres_url = Some(val);
        }
        if let Ok(val) = std::env::var("BUZZER_PORT")
            && let Ok(port) = val.parse()
        {
            self.http.port = port;
        }
        if let Ok(val) = std::env::var("BUZZER_ADMIN_USERNAME") {
            self.admin.username = val;
        }
        if let Ok(val) = std::env::var("BUZZER_ADMIN_PASSWORD_SALT") {
            self.admin.password_salt = val;
        }
        if let Ok(val) = std::env::var("BUZZER_ADMIN_PASSWORD_SHA256") {
            self.admin.password_sha256 = val;
        }
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HttpConfig {
    /// Address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// The single admin credential.
///
/// Only a salted SHA-256 digest is stored; generate one with
/// `buzzer-server hash-password <password>`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AdminConfig {
    /// Admin username.
    #[serde(default = "default_admin_username")]
    pub username: String,

    /// Salt prepended to the password before hashing.
    #[serde(default)]
    pub password_salt: String,

    /// Hex-encoded SHA-256 of `salt || password`. Empty disables login.
    #[serde(default)]
    pub password_sha256: String,
}

impl AdminConfig {
    /// Whether a digest has been configured.
    pub const fn is_configured(&self) -> bool {
        !self.password_sha256.is_empty()
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            username: default_admin_username(),
            password_salt: String::new(),
            password_sha256: String::new(),
        }
    }
}

/// Display time settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DisplayConfig {
    /// Offset of displayed press times, in minutes east of UTC.
    #[serde(default = "default_utc_offset_minutes")]
    pub utc_offset_minutes: i32,
}

impl DisplayConfig {
    /// The configured offset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for offsets beyond +/- 24 hours.
    pub fn offset(&self) -> Result<FixedOffset, ConfigError> {
        buzzer_ledger::clock::offset_from_minutes(self.utc_offset_minutes).ok_or_else(|| {
            ConfigError::Invalid {
                reason: format!(
                    "display.utc_offset_minutes out of range: {}",
                    self.utc_offset_minutes
                ),
            }
        })
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: default_utc_offset_minutes(),
        }
    }
}

/// Durable storage settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PersistenceConfig {
    /// `PostgreSQL` URL. When absent the event lives in memory only.
    #[serde(default)]
    pub postgres_url: Option<String>,

    /// Connection pool size.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            postgres_url: None,
            max_connections: default_max_connections(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error) used when `RUST_LOG`
    /// is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

fn default_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_port() -> u16 {
    8080
}

fn default_admin_username() -> String {
    "admin".to_owned()
}

const fn default_utc_offset_minutes() -> i32 {
    -300
}

const fn default_max_connections() -> u32 {
    5
}

fn default_log_level() -> String {
    "info".to_owned()
}
