//! Settings for the daemon.
//!
//! Read from an optional `settings.toml` in the working directory, then from
//! `LEDGER__*` environment variables (e.g. `LEDGER__SERVER__PORT=8080`,
//! `LEDGER__SERVER__DATABASE__SQLITE=/var/lib/ledger.db`). Every key has a
//! default.
use config::{Config, ConfigError, Environment, File};
use engine::IdStrategy;
use serde::Deserialize;
use server::AccountCreation;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct App {
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Server {
    pub bind: String,
    pub port: u16,
    pub database: Database,
    pub id_strategy: IdStrategy,
    pub account_creation: AccountCreation,
    pub token_ttl_secs: i64,
    pub request_timeout_secs: u64,
    pub max_retries: u32,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 3000,
            database: Database::Sqlite("ledger.db".to_string()),
            id_strategy: IdStrategy::default(),
            account_creation: AccountCreation::default(),
            token_ttl_secs: 3600,
            request_timeout_secs: 30,
            max_retries: 5,
        }
    }
}

impl Server {
    /// `token_ttl_secs` as a lifetime; must be positive and representable.
    pub fn token_ttl(&self) -> Result<chrono::Duration, ConfigError> {
        match chrono::Duration::try_seconds(self.token_ttl_secs) {
            Some(ttl) if ttl > chrono::Duration::zero() => Ok(ttl),
            _ => Err(ConfigError::Message(format!(
                "server.token_ttl_secs out of range: {}",
                self.token_ttl_secs
            ))),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub app: App,
    pub server: Server,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name("settings").required(false))
            .add_source(Environment::with_prefix("LEDGER").separator("__"))
            .build()?
            .try_deserialize()
    }
}
