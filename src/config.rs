//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::Deserialize;
use serde::de::Error;
use std::fs;
use std::path::Path;

use crate::error::Result;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub serial: SerialConfig,

    #[serde(default)]
    pub obd: ObdConfig,

    #[serde(default)]
    pub trip: TripConfig,
}

/// Serial sensor feed configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SerialConfig {
    #[serde(default = "default_serial_port")]
    pub port: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
}

/// OBD-II diagnostic link configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ObdConfig {
    /// Polling tick period; a new tick never starts before the previous
    /// tick's queries complete.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Half-duplex settling delay between writing a command and reading
    /// its response.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Device name prefixes accepted during discovery
    #[serde(default = "default_name_prefixes")]
    pub name_prefixes: Vec<String>,

    #[serde(default = "default_service_uuid")]
    pub service_uuid: String,

    #[serde(default = "default_characteristic_uuid")]
    pub characteristic_uuid: String,

    /// Driving range on a full tank, used to derive remaining range
    #[serde(default = "default_full_range_km")]
    pub full_range_km: u32,
}

/// Trip recording configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TripConfig {
    /// Fuel tank capacity used to convert percent-of-tank to liters
    #[serde(default = "default_tank_capacity_l")]
    pub tank_capacity_l: f64,

    /// Speed in km/h divided by this per tick gives km (2-second tick:
    /// 3600 / 2 = 1800)
    #[serde(default = "default_distance_divisor")]
    pub distance_divisor: f64,

    /// Live chart ring bound (newest samples retained)
    #[serde(default = "default_sample_ring_len")]
    pub sample_ring_len: usize,

    /// Trip history bound (newest records retained)
    #[serde(default = "default_history_cap")]
    pub history_cap: usize,
}

// Default value functions
fn default_serial_port() -> String { "/dev/ttyACM0".to_string() }
fn default_baud_rate() -> u32 { 9600 }

fn default_poll_interval_ms() -> u64 { 2000 }
fn default_settle_delay_ms() -> u64 { 100 }
fn default_name_prefixes() -> Vec<String> {
    ["OBD", "OBDII", "ELM327", "V-LINK", "Vgate"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_service_uuid() -> String { "0000fff0-0000-1000-8000-00805f9b34fb".to_string() }
fn default_characteristic_uuid() -> String { "0000fff1-0000-1000-8000-00805f9b34fb".to_string() }
fn default_full_range_km() -> u32 { 600 }

fn default_tank_capacity_l() -> f64 { 60.0 }
fn default_distance_divisor() -> f64 { 1800.0 }
fn default_sample_ring_len() -> usize { 30 }
fn default_history_cap() -> usize { 10 }

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: default_serial_port(),
            baud_rate: default_baud_rate(),
        }
    }
}

impl Default for ObdConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            settle_delay_ms: default_settle_delay_ms(),
            name_prefixes: default_name_prefixes(),
            service_uuid: default_service_uuid(),
            characteristic_uuid: default_characteristic_uuid(),
            full_range_km: default_full_range_km(),
        }
    }
}

impl Default for TripConfig {
    fn default() -> Self {
        Self {
            tank_capacity_l: default_tank_capacity_l(),
            distance_divisor: default_distance_divisor(),
            sample_ring_len: default_sample_ring_len(),
            history_cap: default_history_cap(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            serial: SerialConfig::default(),
            obd: ObdConfig::default(),
            trip: TripConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        if self.serial.port.is_empty() {
            return Err(crate::error::TelemetryError::Config(
                toml::de::Error::custom("serial port cannot be empty")
            ));
        }

        if ![4800, 9600, 19200, 38400, 57600, 115200].contains(&self.serial.baud_rate) {
            return Err(crate::error::TelemetryError::Config(
                toml::de::Error::custom("baud_rate must be one of: 4800, 9600, 19200, 38400, 57600, 115200")
            ));
        }

        if self.obd.poll_interval_ms < 100 || self.obd.poll_interval_ms > 60000 {
            return Err(crate::error::TelemetryError::Config(
                toml::de::Error::custom("poll_interval_ms must be between 100 and 60000")
            ));
        }

        if self.obd.settle_delay_ms == 0 || self.obd.settle_delay_ms > 5000 {
            return Err(crate::error::TelemetryError::Config(
                toml::de::Error::custom("settle_delay_ms must be between 1 and 5000")
            ));
        }

        if self.obd.name_prefixes.is_empty() {
            return Err(crate::error::TelemetryError::Config(
                toml::de::Error::custom("name_prefixes cannot be empty")
            ));
        }

        if self.obd.service_uuid.is_empty() || self.obd.characteristic_uuid.is_empty() {
            return Err(crate::error::TelemetryError::Config(
                toml::de::Error::custom("service_uuid and characteristic_uuid cannot be empty")
            ));
        }

        if self.obd.full_range_km == 0 || self.obd.full_range_km > 5000 {
            return Err(crate::error::TelemetryError::Config(
                toml::de::Error::custom("full_range_km must be between 1 and 5000")
            ));
        }

        if self.trip.tank_capacity_l <= 0.0 {
            return Err(crate::error::TelemetryError::Config(
                toml::de::Error::custom("tank_capacity_l must be greater than 0")
            ));
        }

        if self.trip.distance_divisor <= 0.0 {
            return Err(crate::error::TelemetryError::Config(
                toml::de::Error::custom("distance_divisor must be greater than 0")
            ));
        }

        if self.trip.sample_ring_len == 0 || self.trip.sample_ring_len > 1000 {
            return Err(crate::error::TelemetryError::Config(
                toml::de::Error::custom("sample_ring_len must be between 1 and 1000")
            ));
        }

        if self.trip.history_cap == 0 || self.trip.history_cap > 100 {
            return Err(crate::error::TelemetryError::Config(
                toml::de::Error::custom("history_cap must be between 1 and 100")
            ));
        }

        Ok(())
    }
}
