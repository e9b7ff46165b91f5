//! Reffy configuration management

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main Reffy configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReffyConfig {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Filesystem watcher configuration
    #[serde(default)]
    pub watch: WatchConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8787,
        }
    }
}

/// Filesystem watcher configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Reindex automatically when artifact files change
    pub enabled: bool,

    /// Quiet period before a change burst triggers a reindex
    pub debounce_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            debounce_ms: 500,
        }
    }
}

impl ReffyConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| Error::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ReffyConfig::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8787);
        assert!(!config.watch.enabled);
        assert_eq!(config.watch.debounce_ms, 500);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: ReffyConfig = toml::from_str(
            r#"
            [server]
            port = 9999
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 9999);
        assert_eq!(config.server.host, "127.0.0.1");
        assert!(!config.watch.enabled);
    }

    #[test]
    fn test_round_trip() {
        let config = ReffyConfig {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            watch: WatchConfig {
                enabled: true,
                debounce_ms: 250,
            },
        };
        let toml = toml::to_string_pretty(&config).unwrap();
        let parsed: ReffyConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.server.host, "0.0.0.0");
        assert!(parsed.watch.enabled);
        assert_eq!(parsed.watch.debounce_ms, 250);
    }
}
