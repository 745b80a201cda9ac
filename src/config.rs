//! CLI configuration.
//!
//! Configuration is loaded in the following order (later overrides earlier):
//! 1. Default values
//! 2. YAML config file (`--config` or ZWASSOC_CONFIG)
//! 3. Environment variables
//! 4. Command-line flags (applied by the caller)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use zwassoc_protocol::DEFAULT_PORT;

/// CLI configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server connection settings.
    pub server: ServerConfig,
    /// Client-side timeouts.
    pub timeouts: TimeoutConfig,
}

impl Config {
    /// Loads configuration from `path` (or ZWASSOC_CONFIG if unset), then
    /// applies environment variable overrides and finally `server`, the
    /// command-line URL. Validates the merged result once.
    pub fn load(path: Option<&Path>, server: Option<&str>) -> Result<Self, ConfigError> {
        let path = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os("ZWASSOC_CONFIG").map(PathBuf::from));

        let mut config = match path {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_env_overrides();
        if let Some(url) = server {
            config.server.url = url.to_string();
        }
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(path.to_path_buf(), e))?;
        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        self.server.apply_env_overrides();
        self.timeouts.apply_env_overrides();
    }

    /// Checks that the settings can be used.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.timeouts.validate()
    }
}

/// Server connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// WebSocket URL of zwave-js-server.
    pub url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: format!("ws://127.0.0.1:{}", DEFAULT_PORT),
        }
    }
}

impl ServerConfig {
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("ZWASSOC_URL") {
            self.url = url;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        match self.url.strip_prefix("ws://") {
            Some(rest) if !rest.is_empty() => Ok(()),
            _ => Err(ConfigError::ValidationError(format!(
                "server url must be a ws:// URL, got '{}'",
                self.url
            ))),
        }
    }
}

/// Client-side timeouts, in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// How long to wait for the version message and the handshake.
    pub ready_secs: u64,
    /// How long a single command may take.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            ready_secs: 10,
            request_secs: 30,
        }
    }
}

impl TimeoutConfig {
    pub fn ready(&self) -> Duration {
        Duration::from_secs(self.ready_secs)
    }

    pub fn request(&self) -> Duration {
        Duration::from_secs(self.request_secs)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(secs) = std::env::var("ZWASSOC_READY_TIMEOUT_SECS") {
            if let Ok(parsed) = secs.parse() {
                self.ready_secs = parsed;
            }
        }
        if let Ok(secs) = std::env::var("ZWASSOC_REQUEST_TIMEOUT_SECS") {
            if let Ok(parsed) = secs.parse() {
                self.request_secs = parsed;
            }
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.ready_secs == 0 || self.request_secs == 0 {
            return Err(ConfigError::ValidationError(
                "timeouts must be at least one second".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration error.
#[derive(Debug)]
pub enum ConfigError {
    IoError(PathBuf, std::io::Error),
    ParseError(PathBuf, String),
    ValidationError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(path, e) => {
                write!(f, "failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::ValidationError(msg) => {
                write!(f, "configuration validation failed: {}", msg)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.url, "ws://127.0.0.1:3000");
        assert_eq!(config.timeouts.ready(), Duration::from_secs(10));
        assert_eq!(config.timeouts.request(), Duration::from_secs(30));
        config.validate().unwrap();
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "server:\n  url: ws://hub.local:3000").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.server.url, "ws://hub.local:3000");
        assert_eq!(config.timeouts.request_secs, 30);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::from_file(dir.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(..)));
        assert!(err.to_string().contains("absent.yaml"));
    }

    #[test]
    fn test_invalid_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "timeouts:\n  ready_secs: soon").unwrap();
        assert!(matches!(
            Config::from_file(file.path()),
            Err(ConfigError::ParseError(..))
        ));
    }

    #[test]
    fn test_validation() {
        let mut config = Config::default();
        config.server.url = "wss://secure.example:3000".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));

        config.server.url = "ws://".to_string();
        assert!(config.validate().is_err());

        config.server.url = "ws://10.0.0.2:3000".to_string();
        config.timeouts.ready_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_server_override() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "server:\n  url: ws://hub.local:3000").unwrap();

        let config = Config::load(Some(file.path()), Some("ws://10.0.0.7:3000")).unwrap();
        assert_eq!(config.server.url, "ws://10.0.0.7:3000");

        let err = Config::load(Some(file.path()), Some("http://10.0.0.7")).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_yaml_roundtrip() {
        let config = Config::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.server.url, config.server.url);
        assert_eq!(parsed.timeouts.ready_secs, config.timeouts.ready_secs);
    }
}
