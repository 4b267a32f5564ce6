use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use thiserror::Error;

pub const DEFAULT_DB_PATH: &str = "todos.db";
pub const DEFAULT_PORT: u16 = 8080;
/// `DB_PATH` value selecting the in-memory store instead of a SQLite file.
pub const VOLATILE_SENTINEL: &str = "volatile";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Storage {
    Durable(PathBuf),
    Volatile,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub storage: Storage,
    pub host: IpAddr,
    pub port: u16,
    /// Mounts the bulk-delete route used by test and reset flows.
    pub enable_reset: bool,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("PORT must be an integer between 0 and 65535 (got {0:?})")]
    InvalidPort(String),

    #[error("HOST must be an IP address (got {0:?})")]
    InvalidHost(String),

    #[error("TODO_ENABLE_RESET must be true/false/1/0 (got {0:?})")]
    InvalidFlag(String),
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: Storage::Durable(PathBuf::from(DEFAULT_DB_PATH)),
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: DEFAULT_PORT,
            enable_reset: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup. Unset or empty values take the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(path) = get("DB_PATH") {
            let path = path.trim();
            config.storage = if path == VOLATILE_SENTINEL {
                Storage::Volatile
            } else {
                Storage::Durable(PathBuf::from(path))
            };
        }
        if let Some(port) = get("PORT") {
            config.port = port.trim().parse().map_err(|_| ConfigError::InvalidPort(port))?;
        }
        if let Some(host) = get("HOST") {
            config.host = host.trim().parse().map_err(|_| ConfigError::InvalidHost(host))?;
        }
        if let Some(flag) = get("TODO_ENABLE_RESET") {
            config.enable_reset = match flag.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                _ => return Err(ConfigError::InvalidFlag(flag)),
            };
        }
        Ok(config)
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
