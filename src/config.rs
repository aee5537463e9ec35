//! Server configuration
//!
//! Values are layered: built-in defaults, then an optional YAML file, then
//! `PATHCORE_*` environment variables. Command-line flags are applied last
//! by the binary.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid value for {name}: {value}")]
    InvalidEnv { name: &'static str, value: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

pub const ENV_ADDRESS: &str = "PATHCORE_ADDRESS";
pub const ENV_PORT: &str = "PATHCORE_PORT";
pub const ENV_DATA: &str = "PATHCORE_DATA";
pub const ENV_STATIC: &str = "PATHCORE_STATIC";
pub const ENV_SESSION_CAPACITY: &str = "PATHCORE_SESSION_CAPACITY";

/// Server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address
    pub address: String,
    /// Port
    pub port: u16,
    /// RocksDB directory holding the imported collections
    pub data_path: PathBuf,
    /// Directory served under `/static` (network files, docs)
    pub static_path: PathBuf,
    /// Maximum number of live sessions
    pub session_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".to_string(),
            port: 5000,
            data_path: PathBuf::from("./pathcore_data"),
            static_path: PathBuf::from("./static"),
            session_capacity: 10_000,
        }
    }
}

impl ServerConfig {
    pub fn from_yaml_str(yaml: &str) -> ConfigResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }

    /// Override fields from `PATHCORE_*` variables in the process environment
    pub fn apply_env(&mut self) -> ConfigResult<()> {
        self.apply_vars(|name| std::env::var(name).ok())
    }

    /// Override fields from a variable lookup
    pub fn apply_vars<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(address) = lookup(ENV_ADDRESS) {
            self.address = address;
        }
        if let Some(port) = lookup(ENV_PORT) {
            self.port = port.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                name: ENV_PORT,
                value: port,
            })?;
        }
        if let Some(data) = lookup(ENV_DATA) {
            self.data_path = PathBuf::from(data);
        }
        if let Some(static_path) = lookup(ENV_STATIC) {
            self.static_path = PathBuf::from(static_path);
        }
        if let Some(capacity) = lookup(ENV_SESSION_CAPACITY) {
            self.session_capacity =
                capacity
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidEnv {
                        name: ENV_SESSION_CAPACITY,
                        value: capacity,
                    })?;
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}
