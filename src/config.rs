//! Configuration module for ntc-reboot
//!
//! Handles loading and merging configuration from multiple sources:
//! - Default values
//! - System configuration (/etc/ntc-reboot/config.toml)
//! - User configuration (~/.ntc-reboot.toml)
//! - Project configuration (./ntc-reboot.toml)
//! - Environment variables
//!
//! Later sources override earlier ones key by key, so a project file that
//! only sets `defaults.timeout` keeps everything else from the user file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::device::{DeviceSettings, DEFAULT_TIMEOUT};
use crate::telemetry::LoggingConfig;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default settings
    pub defaults: Defaults,

    /// Logging settings
    pub logging: LoggingConfig,
}

/// Default values applied to every device connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Defaults {
    /// Connect/request timeout in seconds
    pub timeout: u64,

    /// Validate TLS certificates for https transports
    pub validate_certs: bool,

    /// Check SSH host keys against ~/.ssh/known_hosts
    pub host_key_checking: bool,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            validate_certs: true,
            host_key_checking: false,
        }
    }
}

impl Config {
    /// Load configuration from all sources
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        let mut merged = serde_json::to_value(Config::default())?;

        for path in Self::get_config_paths(config_path) {
            if config_path.is_some() || path.exists() {
                let layer = Self::read_file(&path)?;
                merge_values(&mut merged, layer);
            }
        }

        let mut config: Config = serde_json::from_value(merged)
            .context("Invalid configuration")?;

        // Apply environment variable overrides
        config.apply_env_overrides()?;

        Ok(config)
    }

    /// Load from a single file on top of the defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let mut merged = serde_json::to_value(Config::default())?;
        merge_values(&mut merged, Self::read_file(path.as_ref())?);
        serde_json::from_value(merged).context("Invalid configuration")
    }

    /// Get the list of configuration file paths to check
    fn get_config_paths(explicit_path: Option<&PathBuf>) -> Vec<PathBuf> {
        // Explicit path replaces the search list
        if let Some(path) = explicit_path {
            return vec![path.clone()];
        }

        let mut paths = vec![PathBuf::from("/etc/ntc-reboot/config.toml")];

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".ntc-reboot.toml"));
        }

        paths.push(PathBuf::from("ntc-reboot.toml"));
        paths
    }

    /// Read one configuration file as a generic value
    fn read_file(path: &Path) -> Result<serde_json::Value> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        // Determine format based on extension
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let value = match extension {
            "yml" | "yaml" => serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?,
            "json" => serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?,
            _ => toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?,
        };

        Ok(value)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) -> Result<()> {
        // NTC_REBOOT_TIMEOUT
        if let Ok(timeout) = std::env::var("NTC_REBOOT_TIMEOUT") {
            self.defaults.timeout = timeout
                .trim()
                .parse()
                .with_context(|| format!("NTC_REBOOT_TIMEOUT is not a number: {}", timeout))?;
        }

        // NTC_REBOOT_VALIDATE_CERTS
        if let Ok(value) = std::env::var("NTC_REBOOT_VALIDATE_CERTS") {
            self.defaults.validate_certs = parse_env_bool("NTC_REBOOT_VALIDATE_CERTS", &value)?;
        }

        // NTC_REBOOT_HOST_KEY_CHECKING
        if let Ok(value) = std::env::var("NTC_REBOOT_HOST_KEY_CHECKING") {
            self.defaults.host_key_checking =
                parse_env_bool("NTC_REBOOT_HOST_KEY_CHECKING", &value)?;
        }

        // NTC_REBOOT_LOG_LEVEL
        if let Ok(level) = std::env::var("NTC_REBOOT_LOG_LEVEL") {
            self.logging.level = level.parse().map_err(anyhow::Error::msg)?;
        }

        Ok(())
    }

    /// Settings handed to the native device factory
    pub fn device_settings(&self) -> DeviceSettings {
        DeviceSettings {
            timeout: self.defaults.timeout,
            validate_certs: self.defaults.validate_certs,
            host_key_checking: self.defaults.host_key_checking,
        }
    }
}

fn parse_env_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => anyhow::bail!("{} must be a boolean, got: {}", name, value),
    }
}

/// Recursively merge `overlay` into `base`; overlay wins on conflicts
fn merge_values(base: &mut serde_json::Value, overlay: serde_json::Value) {
    match (base, overlay) {
        (serde_json::Value::Object(base), serde_json::Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::{LogFormat, LogLevel};

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.defaults.timeout, 30);
        assert!(config.defaults.validate_certs);
        assert!(!config.defaults.host_key_checking);
        assert_eq!(config.device_settings(), DeviceSettings::default());
    }

    #[test]
    fn test_merge_keeps_lower_layers() {
        let mut base = serde_json::json!({
            "defaults": {"timeout": 10, "validate_certs": false},
            "logging": {"level": "info"}
        });
        merge_values(
            &mut base,
            serde_json::json!({"defaults": {"timeout": 60}}),
        );

        assert_eq!(base["defaults"]["timeout"], 60);
        assert_eq!(base["defaults"]["validate_certs"], false);
        assert_eq!(base["logging"]["level"], "info");
    }

    #[test]
    fn test_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[defaults]\nvalidate_certs = false\n\n[logging]\nformat = \"json\"\nlevel = \"debug\"\n",
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert!(!config.defaults.validate_certs);
        assert_eq!(config.defaults.timeout, 30);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.level, LogLevel::Debug);
    }

    #[test]
    fn test_invalid_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.yaml");
        std::fs::write(&path, "defaults: [unclosed").unwrap();

        let err = Config::from_file(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("broken.yaml"));
    }

    #[test]
    fn test_parse_env_bool() {
        assert!(parse_env_bool("X", "Yes").unwrap());
        assert!(!parse_env_bool("X", "0").unwrap());
        assert!(parse_env_bool("X", "maybe").is_err());
    }
}
