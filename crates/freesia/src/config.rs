// File: src/config.rs
// Purpose: Configuration parsing from freesia.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub routing: RoutingConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

/// Routing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Reject routes whose placeholder count differs from the handler's
    /// parameter count (default: true)
    #[serde(default = "default_true")]
    pub checking_param: bool,
}

/// Logging configuration, used when `RUST_LOG` is not set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive, e.g. "info" or "freesia=debug,tower=warn"
    #[serde(default = "default_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

// Default values
fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            checking_param: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
        }
    }
}

impl ServerConfig {
    /// `host:port` for binding
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        // If file doesn't exist or is empty, return default config
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        Ok(config)
    }

    /// Load configuration from default path (./freesia.toml)
    pub fn load_default() -> Result<Self> {
        Self::load("freesia.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.addr(), "127.0.0.1:3000");
        assert!(config.routing.checking_param);
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json);
    }

    #[test]
    fn test_parse_partial_config() {
        let toml_str = r#"
            [server]
            port = 8080

            [routing]
            checking_param = false
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert!(!config.routing.checking_param);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_parse_logging() {
        let toml_str = r#"
            [logging]
            level = "freesia=debug"
            json = true
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.logging.level, "freesia=debug");
        assert!(config.logging.json);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = Config::load("definitely/not/here/freesia.toml").unwrap();
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let path = std::env::temp_dir().join(format!("freesia-bad-{}.toml", std::process::id()));
        fs::write(&path, "[server\nport = ").unwrap();
        let result = Config::load(&path);
        let _ = fs::remove_file(&path);
        assert!(result.is_err());
    }
}
