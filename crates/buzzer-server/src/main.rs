//! Quiz buzzer server binary.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `buzzer-config.yaml` (or `$BUZZER_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Build the admin gate from the configured credential
//! 4. Connect to `PostgreSQL` and restore state, if configured
//! 5. Serve the HTTP + `WebSocket` API until `Ctrl-C`
//!
//! `buzzer-server hash-password <password>` prints a salt and digest for
//! the `admin` config section and exits.

mod error;
mod journal;

use std::path::PathBuf;
use std::sync::Arc;

use buzzer_api::{AppState, ServerConfig};
use buzzer_core::config::LoggingConfig;
use buzzer_core::{
    AdminGate, BuzzerConfig, BuzzerService, StaticCredentials, generate_salt, hash_password,
};
use buzzer_db::{PostgresConfig, PostgresPool};
use buzzer_ledger::Arbiter;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::ServerError;
use crate::journal::PgJournal;

/// Default configuration file name.
const CONFIG_FILE: &str = "buzzer-config.yaml";

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    let mut args = std::env::args().skip(1);
    if let Some(command) = args.next() {
        return match (command.as_str(), args.next()) {
            ("hash-password", Some(password)) => {
                print_credential(&password);
                Ok(())
            }
            _ => Err(ServerError::Usage {
                message: String::from("buzzer-server [hash-password <password>]"),
            }),
        };
    }

    // 1. Load configuration.
    let config_path = std::env::var("BUZZER_CONFIG")
        .map_or_else(|_| PathBuf::from(CONFIG_FILE), PathBuf::from);
    let config = BuzzerConfig::load_or_default(&config_path)?;

    // 2. Initialize structured logging.
    init_tracing(&config.logging);
    info!(
        config = %config_path.display(),
        port = config.http.port,
        utc_offset_minutes = config.display.utc_offset_minutes,
        persistent = config.persistence.postgres_url.is_some(),
        "buzzer-server starting"
    );

    // 3. Admin gate.
    if !config.admin.is_configured() {
        warn!("No admin credential configured; admin login is disabled");
    }
    let gate = AdminGate::new(Arc::new(StaticCredentials::from_config(&config.admin)));
    let offset = config.display.offset()?;

    // 4. Persistence and restore.
    let (service, pool) = match &config.persistence.postgres_url {
        Some(url) => {
            let pg_config = PostgresConfig::new(url)
                .with_max_connections(config.persistence.max_connections);
            let pool = PostgresPool::connect(&pg_config).await?;
            pool.run_migrations().await?;
            let restored = buzzer_db::load_snapshot(pool.pool()).await?;
            let arbiter = Arbiter::restore(offset, restored);
            let journal = Arc::new(PgJournal::new(pool.clone()));
            (BuzzerService::with_journal(arbiter, gate, journal), Some(pool))
        }
        None => {
            info!("No postgres_url configured; state lives in memory only");
            (BuzzerService::new(Arbiter::new(offset), gate), None)
        }
    };

    // 5. Serve.
    let state = Arc::new(AppState::new(Arc::new(service)));
    let server_config = ServerConfig {
        host: config.http.host.clone(),
        port: config.http.port,
    };
    let served = buzzer_api::start_server(&server_config, state).await;

    if let Some(pool) = pool {
        pool.close().await;
    }
    served?;

    info!("buzzer-server stopped");
    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    if logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

#[allow(clippy::print_stdout)]
fn print_credential(password: &str) {
    let salt = generate_salt();
    let digest = hash_password(&salt, password);
    println!("admin:");
    println!("  password_salt: \"{salt}\"");
    println!("  password_sha256: \"{digest}\"");
}
