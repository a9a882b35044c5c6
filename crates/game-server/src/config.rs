//! Configuration loading for the game server.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when loading the configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse the configuration file as valid TOML.
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Longest clock a game may be created with, in seconds.
    #[serde(default = "default_max_timer_seconds")]
    pub max_timer_seconds: u64,
    /// SQLite file for finished games. Without it they are discarded.
    #[serde(default)]
    pub history_db: Option<PathBuf>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    9999
}

fn default_max_timer_seconds() -> u64 {
    3 * 60 * 60
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: default_host(),
            port: default_port(),
            max_timer_seconds: default_max_timer_seconds(),
            history_db: None,
        }
    }
}

impl ServerConfig {
    /// Default configuration file, looked up in the working directory.
    pub const DEFAULT_PATH: &'static str = "server.toml";

    /// Loads the configuration at `path`, or the defaults if no file exists.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config = Self::parse(&content)?;
        tracing::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Socket address to listen on.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn max_timer(&self) -> Duration {
        Duration::from_secs(self.max_timer_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = ServerConfig::parse("").unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.addr(), "127.0.0.1:9999");
        assert_eq!(config.max_timer(), Duration::from_secs(10800));
        assert_eq!(config.history_db, None);
    }

    #[test]
    fn partial_file_overrides_fields() {
        let config = ServerConfig::parse(
            r#"
            port = 8080
            history_db = "data/games.db"
            "#,
        )
        .unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.history_db, Some(PathBuf::from("data/games.db")));
    }

    #[test]
    fn invalid_toml_is_parse_error() {
        assert!(matches!(
            ServerConfig::parse("port = \"not a number\""),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn missing_file_uses_defaults() {
        let config = ServerConfig::load(Path::new("definitely/not/here/server.toml")).unwrap();
        assert_eq!(config, ServerConfig::default());
    }
}
