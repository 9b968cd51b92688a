// src/config.rs
//! Configuration management

use crate::error::{GpsError, Result};
use crate::gps::nmea::NumericFieldPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Serial device the GPS receiver is attached to
    pub gps_port: String,
    /// Serial speed in baud
    pub gps_speed: u32,
    /// Hex-dump every raw serial chunk
    pub gps_debug: bool,
    /// Print every applied position fix
    pub debug: bool,
    /// UDP port answered with the current position
    pub network_port: u16,
    /// Hex-dump every inbound datagram
    pub network_debug: bool,
    /// How malformed numeric fields are handled
    pub numeric_fields: NumericFieldPolicy,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            gps_port: "/dev/ttyUSB0".to_string(),
            gps_speed: 9600,
            gps_debug: false,
            debug: false,
            network_port: 7834,
            network_debug: false,
            numeric_fields: NumericFieldPolicy::default(),
        }
    }
}

impl GatewayConfig {
    /// Load configuration from an explicit file or the default location
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => {
                let config_path = Self::get_config_path()?;
                if !config_path.exists() {
                    return Ok(Self::default());
                }
                Self::load_from_file(&config_path)
            }
        }
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| GpsError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| GpsError::Config(format!("Failed to parse config file: {}", e)))?;

        Ok(config)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        let config_path = Self::get_config_path()?;

        // Create config directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| GpsError::Config(format!("Failed to create config directory: {}", e)))?;
        }

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| GpsError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(&config_path, contents)
            .map_err(|e| GpsError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Get the default config file path
    fn get_config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME")
            .map_err(|_| GpsError::Config("HOME environment variable not set".to_string()))?;

        Ok(PathBuf::from(home)
            .join(".config")
            .join("gps-gateway")
            .join("config.json"))
    }
}
