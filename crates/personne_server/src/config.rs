//! Server configuration.
//!
//! # Responsibility
//! - Load the TOML configuration file and apply section defaults.
//! - Validate bind address, database location and reset gating.
//!
//! # Invariants
//! - A loaded config has passed `validate()`.
//! - `admin.reset_token = None` disables the reset endpoint entirely.

use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Database path that selects an in-memory store.
pub const IN_MEMORY_DATABASE: &str = ":memory:";

const MAX_CONFIG_FILE_SIZE: usize = 64 * 1024;

/// Configuration loading and validation failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config io error: {0}")]
    Io(String),
    #[error("config parse error: {0}")]
    Parse(String),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: HttpConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub admin: AdminConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct HttpConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

/// SQLite store location.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// File path, or `:memory:` for a throwaway store.
    #[serde(default = "default_database_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

/// Logging level and optional file directory.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Absolute directory for rolling files; stderr when absent.
    #[serde(default)]
    pub dir: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            dir: None,
        }
    }
}

/// Gating for destructive operations.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct AdminConfig {
    /// Value expected in the `x-admin-token` header for table resets.
    #[serde(default)]
    pub reset_token: Option<String>,
}

impl ServerConfig {
    /// Loads configuration from `path`, or defaults when `path` is `None`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when reading, parsing or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            let mut config = Self::default();
            config.validate()?;
            return Ok(config);
        };

        let bytes = fs::read(path)
            .map_err(|err| ConfigError::Io(format!("{}: {err}", path.display())))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid(
                "config file exceeds size limit".to_string(),
            ));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml_str(content)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let mut config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first violation.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        self.bind_addr()?;

        self.database.path = self.database.path.trim().to_string();
        if self.database.path.is_empty() {
            return Err(ConfigError::Invalid(
                "database.path must not be empty".to_string(),
            ));
        }

        if let Some(token) = &self.admin.reset_token {
            if token.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "admin.reset_token must not be empty when set".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Parsed listener address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when `server.bind` is not `host:port`.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server
            .bind
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("invalid bind address `{}`", self.server.bind)))
    }

    /// File path of the store, `None` for the in-memory store.
    pub fn database_file(&self) -> Option<PathBuf> {
        if self.database.path == IN_MEMORY_DATABASE {
            None
        } else {
            Some(PathBuf::from(&self.database.path))
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_database_path() -> String {
    "personnes.sqlite3".to_string()
}

fn default_log_level() -> String {
    personne_core::default_log_level().to_string()
}
