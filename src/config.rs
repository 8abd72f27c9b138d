// src/config.rs
//! Configuration loading and storage

use crate::animate::PulseStyle;
use crate::error::{AppError, Result};
use crate::gps::PositionSource;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub source: SourceConfig,
    pub map: MapConfig,
    pub pulse: PulseStyle,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub source_type: String, // "gpsd" or "serial"
    pub serial_port: Option<String>,
    pub serial_baudrate: u32,
    pub gpsd_host: String,
    pub gpsd_port: u16,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            source_type: "gpsd".to_string(),
            serial_port: None,
            serial_baudrate: 9600,
            gpsd_host: "localhost".to_string(),
            gpsd_port: 2947,
        }
    }
}

impl SourceConfig {
    /// Resolve the configured source into a connectable one.
    pub fn position_source(&self) -> Result<PositionSource> {
        match self.source_type.as_str() {
            "gpsd" => Ok(PositionSource::Gpsd {
                host: self.gpsd_host.clone(),
                port: self.gpsd_port,
            }),
            "serial" => {
                let port = self.serial_port.clone().ok_or_else(|| {
                    AppError::Other("Source type 'serial' needs a serial port".to_string())
                })?;
                Ok(PositionSource::Serial {
                    port,
                    baudrate: self.serial_baudrate,
                })
            }
            other => Err(AppError::Other(format!("Unknown source type: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub center_lon: f64,
    pub center_lat: f64,
    pub zoom: u8,
    pub tile_cache_dir: Option<PathBuf>,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center_lon: 0.0,
            center_lat: 47.35,
            zoom: 4,
            tile_cache_dir: None,
        }
    }
}

impl MapConfig {
    /// Tile cache location, defaulting under the user cache directory.
    pub fn cache_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.tile_cache_dir {
            return Ok(dir.clone());
        }
        let home = std::env::var("HOME")
            .map_err(|_| AppError::Other("HOME environment variable not set".to_string()))?;
        Ok(PathBuf::from(home).join(".cache").join("geoflash").join("tiles"))
    }
}

impl AppConfig {
    /// Load from the default path, falling back to defaults when the
    /// file does not exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &PathBuf) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)
            .map_err(|e| AppError::Other(format!("Failed to read config file: {}", e)))?;
        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| AppError::Other(format!("Failed to parse config file: {}", e)))?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| AppError::Other(format!("Failed to create config dir: {}", e)))?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, contents)
            .map_err(|e| AppError::Other(format!("Failed to write config file: {}", e)))?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME")
            .map_err(|_| AppError::Other("HOME environment variable not set".to_string()))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("geoflash")
            .join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animate::Easing;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.source.source_type, "gpsd");
        assert_eq!(config.source.gpsd_port, 2947);
        assert_eq!(config.pulse.duration_ms, 3000.0);
        assert_eq!(config.pulse.easing, Easing::QuadOut);
        assert_eq!(config.map.zoom, 4);
    }

    #[test]
    fn test_serial_source_requires_port() {
        let mut source = SourceConfig::default();
        source.source_type = "serial".to_string();
        assert!(source.position_source().is_err());

        source.serial_port = Some("/dev/ttyUSB0".to_string());
        match source.position_source().unwrap() {
            PositionSource::Serial { port, baudrate } => {
                assert_eq!(port, "/dev/ttyUSB0");
                assert_eq!(baudrate, 9600);
            }
            other => panic!("unexpected source {:?}", other),
        }
    }

    #[test]
    fn test_unknown_source_type_is_an_error() {
        let mut source = SourceConfig::default();
        source.source_type = "carrier-pigeon".to_string();
        assert!(source.position_source().is_err());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"pulse":{"duration_ms":1500.0}}"#).unwrap();
        assert_eq!(config.pulse.duration_ms, 1500.0);
        assert_eq!(config.pulse.easing, Easing::QuadOut);
        assert_eq!(config.source.gpsd_host, "localhost");
    }

    #[test]
    fn test_round_trip() {
        let mut config = AppConfig::default();
        config.map.zoom = 13;
        config.pulse.easing = Easing::CubicOut;

        let json = serde_json::to_string(&config).unwrap();
        let back: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.map.zoom, 13);
        assert_eq!(back.pulse.easing, Easing::CubicOut);
    }
}
