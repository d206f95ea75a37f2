//! TOML-based application configuration.
//!
//! Stores the two timing knobs the engine exposes:
//! - heartbeat period (minutes between full due-scans)
//! - processing lease (minutes before an in-flight claim counts as abandoned)
//!
//! Configuration is stored at `~/.config/snoozer/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/snoozer/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Minutes between heartbeat scans. Bounds how late a delivery can be
    /// when a precise trigger was missed.
    #[serde(default = "default_heartbeat_min")]
    pub heartbeat_min: u32,
    /// Minutes before a processing claim is considered abandoned and the
    /// record becomes deliverable again.
    #[serde(default = "default_processing_lease_min")]
    pub processing_lease_min: u32,
}

fn default_heartbeat_min() -> u32 {
    5
}
fn default_processing_lease_min() -> u32 {
    15
}

impl Default for Config {
    fn default() -> Self {
        Self {
            heartbeat_min: default_heartbeat_min(),
            processing_lease_min: default_processing_lease_min(),
        }
    }
}

impl Config {
    fn path() -> Result<PathBuf, Box<dyn std::error::Error>> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or return default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content)?;
                Ok(cfg)
            }
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(Self::path()?, content)?;
        Ok(())
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Set a config value by key. Returns error if key is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), Box<dyn std::error::Error>> {
        match key {
            "heartbeat_min" => self.heartbeat_min = value.parse()?,
            "processing_lease_min" => self.processing_lease_min = value.parse()?,
            _ => return Err(format!("unknown config key: {key}").into()),
        }
        self.save()?;
        Ok(())
    }

    /// Get a config value as string by key.
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "heartbeat_min" => Some(self.heartbeat_min.to_string()),
            "processing_lease_min" => Some(self.processing_lease_min.to_string()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.heartbeat_min, 5);
        assert_eq!(parsed.processing_lease_min, 15);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let parsed: Config = toml::from_str("heartbeat_min = 2").unwrap();
        assert_eq!(parsed.heartbeat_min, 2);
        assert_eq!(parsed.processing_lease_min, 15);
    }

    #[test]
    fn get_known_and_unknown_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("heartbeat_min").as_deref(), Some("5"));
        assert!(cfg.get("nope").is_none());
    }
}
