//! Checkout configuration.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tally_db::DbConfig;

/// Checkout configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutConfig {
    /// SQLite database file (`TALLY_DB_PATH`)
    pub db_path: PathBuf,

    /// Pool size (`TALLY_DB_MAX_CONNECTIONS`)
    pub max_connections: u32,

    /// How long a reservation waits for the stock lock, in milliseconds
    /// (`TALLY_LOCK_WAIT_TIMEOUT_MS`)
    pub lock_wait_timeout_ms: u64,

    /// Apply embedded migrations at startup (`TALLY_RUN_MIGRATIONS`)
    pub run_migrations: bool,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        CheckoutConfig {
            db_path: PathBuf::from("./tally.db"),
            max_connections: 5,
            lock_wait_timeout_ms: 5000,
            run_migrations: true,
        }
    }
}

impl CheckoutConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Load configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = CheckoutConfig::default();

        let config = CheckoutConfig {
            db_path: lookup("TALLY_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),

            max_connections: parse_or(&lookup, "TALLY_DB_MAX_CONNECTIONS", defaults.max_connections)?,

            lock_wait_timeout_ms: parse_or(
                &lookup,
                "TALLY_LOCK_WAIT_TIMEOUT_MS",
                defaults.lock_wait_timeout_ms,
            )?,

            run_migrations: parse_or(&lookup, "TALLY_RUN_MIGRATIONS", defaults.run_migrations)?,
        };

        if config.max_connections == 0 {
            return Err(ConfigError::InvalidValue("TALLY_DB_MAX_CONNECTIONS".to_string()));
        }

        Ok(config)
    }

    pub fn lock_wait_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_wait_timeout_ms)
    }

    /// Database settings derived from this configuration.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.db_path)
            .max_connections(self.max_connections)
            .lock_wait_timeout(self.lock_wait_timeout())
            .run_migrations(self.run_migrations)
    }
}

fn parse_or<F, T>(lookup: &F, var: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(var) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(var.to_string())),
        None => Ok(default),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}
