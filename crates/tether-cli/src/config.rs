//! CLI configuration loading from file and environment variables.

use serde::Deserialize;
use tether_db::{IdleTimeout, SqliteSettings};
use tether_types::Credentials;
use thiserror::Error;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Connection settings.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Connection settings.
#[derive(Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database server host. Unused by the SQLite driver.
    #[serde(default = "default_host")]
    pub host: String,

    /// Login user. Unused by the SQLite driver.
    #[serde(default)]
    pub user: String,

    /// Login password. Unused by the SQLite driver.
    #[serde(default)]
    pub password: String,

    /// Database name; for SQLite, the database file path.
    #[serde(default = "default_database")]
    pub database: String,

    /// Seconds a connection may sit idle before it is closed. Zero or
    /// negative disables idle eviction.
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: i64,

    /// SQLite busy timeout, in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "tether_db=debug,warn").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_database() -> String {
    "tether.db".to_string()
}

fn default_idle_timeout_secs() -> i64 {
    300
}

fn default_busy_timeout_ms() -> u64 {
    SqliteSettings::default().busy_timeout_ms
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            user: String::new(),
            password: String::new(),
            database: default_database(),
            idle_timeout_secs: default_idle_timeout_secs(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("database", &self.database)
            .field("idle_timeout_secs", &self.idle_timeout_secs)
            .field("busy_timeout_ms", &self.busy_timeout_ms)
            .finish_non_exhaustive()
    }
}

impl DatabaseConfig {
    /// The credential set handed to the driver.
    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.host, &self.user, &self.password, &self.database)
    }

    /// The configured idle timeout.
    pub fn idle_timeout(&self) -> IdleTimeout {
        IdleTimeout::from_secs(self.idle_timeout_secs)
    }

    /// SQLite driver settings.
    pub fn sqlite_settings(&self) -> SqliteSettings {
        SqliteSettings {
            busy_timeout_ms: self.busy_timeout_ms,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `TETHER_DB_HOST` overrides `database.host`
/// - `TETHER_DB_USER` overrides `database.user`
/// - `TETHER_DB_PASSWORD` overrides `database.password`
/// - `TETHER_DB_NAME` overrides `database.database`
/// - `TETHER_IDLE_TIMEOUT_SECS` overrides `database.idle_timeout_secs`
/// - `TETHER_LOG_LEVEL` overrides `logging.level`
/// - `TETHER_LOG_JSON` overrides `logging.json` (set to "true" to enable)
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

fn apply_env_overrides(config: &mut Config, var: impl Fn(&str) -> Option<String>) {
    if let Some(host) = var("TETHER_DB_HOST") {
        config.database.host = host;
    }
    if let Some(user) = var("TETHER_DB_USER") {
        config.database.user = user;
    }
    if let Some(password) = var("TETHER_DB_PASSWORD") {
        config.database.password = password;
    }
    if let Some(database) = var("TETHER_DB_NAME") {
        config.database.database = database;
    }
    if let Some(secs) = var("TETHER_IDLE_TIMEOUT_SECS") {
        if let Ok(parsed) = secs.parse() {
            config.database.idle_timeout_secs = parsed;
        }
    }
    if let Some(level) = var("TETHER_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = var("TETHER_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
}
