//! Server configuration loaded with figment.
//!
//! Sources, lowest to highest precedence:
//! 1. Built-in defaults
//! 2. `todo-server.toml` in the working directory, or an explicit file
//! 3. `TODO_`-prefixed environment variables (`__` separates nested keys)
//! 4. The bare `PORT` variable
//! 5. Command-line overrides ([`CliOverrides`])

use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "todo-server.toml";

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] figment::Error),

    #[error("invalid configuration value for '{key}': {message}")]
    InvalidValue { key: &'static str, message: String },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Sqlite,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Database file for the sqlite backend; `:memory:` for a private
    /// in-memory database.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// `tracing_subscriber::EnvFilter` directives; `RUST_LOG` takes precedence.
    pub log_filter: String,
    pub storage: StorageConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            log_filter: "info,todo_server=debug,tower_http=debug".to_string(),
            storage: StorageConfig::default(),
        }
    }
}

/// Values given on the command line; each one set wins over every other source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    /// Selects the sqlite backend at this path.
    pub database: Option<PathBuf>,
}

impl CliOverrides {
    pub fn merge_into(&self, mut figment: Figment) -> Figment {
        if let Some(host) = &self.host {
            figment = figment.merge(Serialized::default("host", host));
        }
        if let Some(port) = self.port {
            figment = figment.merge(Serialized::default("port", port));
        }
        if let Some(database) = &self.database {
            figment = figment
                .merge(Serialized::default("storage.backend", StorageBackend::Sqlite))
                .merge(Serialized::default("storage.path", database));
        }
        figment
    }
}

impl ServerConfig {
    /// Layered figment for the given (or default) config file.
    pub fn figment(config_file: Option<&Path>) -> Figment {
        let file = config_file.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(file))
            .merge(Env::prefixed("TODO_").split("__"))
            .merge(Env::raw().only(&["PORT"]))
    }

    pub fn from_figment(figment: &Figment) -> ConfigResult<Self> {
        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Every layer, command-line overrides included, extracted and validated.
    pub fn load(config_file: Option<&Path>, overrides: &CliOverrides) -> ConfigResult<Self> {
        Self::from_figment(&overrides.merge_into(Self::figment(config_file)))
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "host",
                message: "must not be empty".to_string(),
            });
        }
        if self.storage.backend == StorageBackend::Sqlite && self.storage.path.is_none() {
            return Err(ConfigError::InvalidValue {
                key: "storage.path",
                message: "required when storage.backend is sqlite".to_string(),
            });
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
