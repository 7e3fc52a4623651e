//! Persisted CLI configuration: a YAML key/value file resolved through the
//! XDG base directory chain.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration load result, mirroring the caller-visible distinction
/// between "first run" and "file present but broken".
#[derive(Debug)]
pub enum ConfigLoadResult {
    Loaded(CliConfig),
    Missing,
    Invalid(ConfigError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("unknown config key {0:?}")]
    UnknownKey(String),
}

/// Persisted CLI configuration (`$XDG_CONFIG_HOME/rbzk/config.yml`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CliConfig {
    #[serde(default = "default_ip")]
    pub ip: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    #[serde(default)]
    pub password: u32,
    #[serde(default)]
    pub verbose: bool,
    #[serde(default)]
    pub force_udp: bool,
    #[serde(default)]
    pub no_ping: bool,
    #[serde(default = "default_encoding")]
    pub encoding: String,
}

fn default_ip() -> String {
    "192.168.1.201".to_string()
}
fn default_port() -> u16 {
    4370
}
fn default_timeout() -> u64 {
    60
}
fn default_encoding() -> String {
    "UTF-8".to_string()
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            ip: default_ip(),
            port: default_port(),
            timeout: default_timeout(),
            password: 0,
            verbose: false,
            force_udp: false,
            no_ping: false,
            encoding: default_encoding(),
        }
    }
}

impl CliConfig {
    /// Resolve the config path: `$XDG_CONFIG_HOME/rbzk/config.yml`, falling
    /// back to `$HOME/.config/rbzk/config.yml`, then `./.rbzk.yml` if
    /// neither a home nor a config directory can be determined.
    pub fn resolve_path() -> PathBuf {
        ProjectDirs::from("", "", "rbzk")
            .map(|dirs| dirs.config_dir().join("config.yml"))
            .unwrap_or_else(|| PathBuf::from(".rbzk.yml"))
    }

    pub fn try_load(path: &Path) -> ConfigLoadResult {
        if !path.exists() {
            return ConfigLoadResult::Missing;
        }
        match std::fs::read_to_string(path) {
            Ok(content) => match serde_yaml::from_str::<CliConfig>(&content) {
                Ok(config) => match config.validate() {
                    Ok(()) => ConfigLoadResult::Loaded(config),
                    Err(e) => ConfigLoadResult::Invalid(e),
                },
                Err(e) => ConfigLoadResult::Invalid(ConfigError::Parse(e)),
            },
            Err(e) => ConfigLoadResult::Invalid(ConfigError::Read(e)),
        }
    }

    /// Load the persisted config, or defaults if absent; propagate if the
    /// file exists but fails to parse/validate.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        match Self::try_load(path) {
            ConfigLoadResult::Loaded(config) => Ok(config),
            ConfigLoadResult::Missing => Ok(Self::default()),
            ConfigLoadResult::Invalid(e) => Err(e),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ip.trim().is_empty() {
            return Err(ConfigError::Validation("ip cannot be empty".to_string()));
        }
        if self.port == 0 {
            return Err(ConfigError::Validation("port must be greater than 0".to_string()));
        }
        if self.timeout == 0 {
            return Err(ConfigError::Validation("timeout must be greater than 0".to_string()));
        }
        if self.encoding.trim().is_empty() {
            return Err(ConfigError::Validation("encoding cannot be empty".to_string()));
        }
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Update a single key by name (as used by `config-set KEY VALUE`).
    pub fn set_key(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "ip" => self.ip = value.to_string(),
            "port" => self.port = parse_field(key, value)?,
            "timeout" => self.timeout = parse_field(key, value)?,
            "password" => self.password = parse_field(key, value)?,
            "verbose" => self.verbose = parse_bool(key, value)?,
            "force_udp" => self.force_udp = parse_bool(key, value)?,
            "no_ping" => self.no_ping = parse_bool(key, value)?,
            "encoding" => self.encoding = value.to_string(),
            other => return Err(ConfigError::UnknownKey(other.to_string())),
        }
        self.validate()
    }
}

fn parse_field<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::Validation(format!("{key} expects a number, got {value:?}")))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::Validation(format!("{key} expects true/false, got {value:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(CliConfig::default().validate().is_ok());
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = std::env::temp_dir().join("rbzk-config-test-missing");
        let path = dir.join("config.yml");
        let _ = std::fs::remove_file(&path);
        let config = CliConfig::load_or_default(&path).unwrap();
        assert_eq!(config, CliConfig::default());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = std::env::temp_dir().join("rbzk-config-test-roundtrip");
        let path = dir.join("config.yml");
        let mut config = CliConfig::default();
        config.ip = "10.0.0.5".to_string();
        config.password = 123456;
        config.save(&path).unwrap();

        let loaded = CliConfig::load_or_default(&path).unwrap();
        assert_eq!(loaded, config);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn set_key_updates_and_validates() {
        let mut config = CliConfig::default();
        config.set_key("port", "4000").unwrap();
        assert_eq!(config.port, 4000);

        config.set_key("verbose", "true").unwrap();
        assert!(config.verbose);

        assert!(config.set_key("port", "not-a-number").is_err());
        assert!(config.set_key("bogus", "x").is_err());
    }

    #[test]
    fn rejects_zero_port_and_timeout() {
        let mut config = CliConfig::default();
        config.port = 0;
        assert!(config.validate().is_err());

        config.port = 4370;
        config.timeout = 0;
        assert!(config.validate().is_err());
    }
}
