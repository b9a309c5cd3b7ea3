//! Configuration management.
//!
//! Configuration is read from `~/.config/coracle/config.toml` at startup.
//! If the file doesn't exist, a default configuration with comments is
//! created. Missing fields fall back to their defaults.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::fetcher::http_fetcher::{TransportConfig, DEFAULT_USER_AGENT};
use crate::server::DEFAULT_PORT;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub fetch: FetchConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Read timeout in seconds.
    pub read_timeout_secs: u64,
    pub user_agent: String,
    pub follow_redirects: bool,
    /// Opt-in testing mode: accept invalid TLS certificates for this
    /// process's fetch client only.
    pub accept_invalid_certs: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
            read_timeout_secs: 20,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            follow_redirects: true,
            accept_invalid_certs: false,
        }
    }
}

impl FetchConfig {
    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            read_timeout: Duration::from_secs(self.read_timeout_secs),
            user_agent: self.user_agent.clone(),
            accept_invalid_certs: self.accept_invalid_certs,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: DEFAULT_PORT }
    }
}

impl Config {
    /// Load configuration from the default path, creating a commented
    /// default file on first run.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
            return Ok(Self::default());
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Default config file path: `~/.config/coracle/config.toml`.
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("coracle").join("config.toml"))
    }

    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    fn default_config_content() -> String {
        r##"# Coracle configuration

[fetch]
# Connect and read timeouts, in seconds.
connect_timeout_secs = 10
read_timeout_secs = 20

# Follow 3xx redirects at the transport level.
follow_redirects = true

# Accept invalid TLS certificates. Testing only; scoped to this process's
# fetch client, never a system-wide default.
accept_invalid_certs = false

[server]
# Port for the local demo server (`coracle serve`).
port = 8080
"##
        .to_string()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_deserializes() {
        let content = Config::default_config_content();
        let config: Config = toml::from_str(&content).expect("Default config should be valid TOML");

        assert_eq!(config.fetch.connect_timeout_secs, 10);
        assert_eq!(config.server.port, 8080);
        assert!(!config.fetch.accept_invalid_certs);
    }

    #[test]
    fn test_partial_config() {
        let content = r##"
[fetch]
read_timeout_secs = 5
"##;
        let config: Config = toml::from_str(content).expect("Partial config should work");

        assert_eq!(config.fetch.read_timeout_secs, 5);
        // Defaults fill the rest.
        assert_eq!(config.fetch.connect_timeout_secs, 10);
        assert!(config.fetch.follow_redirects);
    }

    #[test]
    fn test_empty_config() {
        let config: Config = toml::from_str("").expect("Empty config should work");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.fetch.user_agent, DEFAULT_USER_AGENT);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server]\nport = 9090\n").expect("write config");

        let config = Config::load_from(&path).expect("load config");
        assert_eq!(config.server.port, 9090);
    }

    #[test]
    fn test_load_from_invalid_toml_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "not [valid toml").expect("write config");

        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_transport_from_fetch_config() {
        let fetch = FetchConfig::default();
        let transport = fetch.transport();
        assert_eq!(transport.connect_timeout, Duration::from_secs(10));
        assert_eq!(transport.read_timeout, Duration::from_secs(20));
    }
}
