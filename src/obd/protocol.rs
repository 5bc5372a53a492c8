//! # OBD-II Protocol Constants and Types
//!
//! Parameter identifiers, unit conversions, and the composite reading type.

use serde::Serialize;

/// Mode 01 response marker: responses echo `41` followed by the PID
pub const RESPONSE_MARKER: &str = "41";

/// Command terminator required by the adapter (half-duplex serial dialect)
pub const COMMAND_TERMINATOR: u8 = b'\r';

/// Parameter identifiers polled each tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pid {
    /// Fuel tank level input (`012F`)
    FuelLevel,
    /// Engine coolant temperature (`0105`)
    EngineTemp,
    /// Vehicle speed (`010D`)
    Speed,
    /// Engine RPM (`010C`)
    Rpm,
}

impl Pid {
    /// Full command string (mode `01` + PID) sent to the adapter
    pub fn command(self) -> &'static str {
        match self {
            Pid::FuelLevel => "012F",
            Pid::EngineTemp => "0105",
            Pid::Speed => "010D",
            Pid::Rpm => "010C",
        }
    }

    /// Two-hex-digit PID echo expected after the `41` response marker
    pub fn response_echo(self) -> &'static str {
        match self {
            Pid::FuelLevel => "2F",
            Pid::EngineTemp => "05",
            Pid::Speed => "0D",
            Pid::Rpm => "0C",
        }
    }
}

/// Fuel level: raw 0-255 scaled to percent
pub fn fuel_level_pct(raw: u32) -> i32 {
    ((raw as f64 / 255.0) * 100.0).round() as i32
}

/// Engine temperature: standard diagnostic offset of -40
pub fn engine_temp_c(raw: u32) -> i32 {
    raw as i32 - 40
}

/// Vehicle speed: raw value is already km/h
pub fn speed_kph(raw: u32) -> i32 {
    raw as i32
}

/// Engine RPM: raw value counts quarter-revolutions
pub fn rpm(raw: u32) -> i32 {
    (raw as f64 / 4.0).round() as i32
}

/// Remaining range derived from fuel level and the full-tank range constant
pub fn range_km(fuel_level_pct: i32, full_range_km: u32) -> i32 {
    if fuel_level_pct > 0 {
        ((fuel_level_pct as f64 / 100.0) * full_range_km as f64).round() as i32
    } else {
        0
    }
}

/// Composite reading assembled from one full round of diagnostic queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DiagnosticReading {
    pub fuel_level_pct: i32,
    pub engine_temp_c: i32,
    pub speed_kph: i32,
    pub rpm: i32,
    /// Derived, not queried: remaining range in km
    pub range_km: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pid_commands() {
        assert_eq!(Pid::FuelLevel.command(), "012F");
        assert_eq!(Pid::EngineTemp.command(), "0105");
        assert_eq!(Pid::Speed.command(), "010D");
        assert_eq!(Pid::Rpm.command(), "010C");
    }

    #[test]
    fn test_pid_response_echo_drops_mode_prefix() {
        assert_eq!(Pid::FuelLevel.response_echo(), "2F");
        assert_eq!(Pid::EngineTemp.response_echo(), "05");
        assert_eq!(Pid::Speed.response_echo(), "0D");
        assert_eq!(Pid::Rpm.response_echo(), "0C");
    }

    #[test]
    fn test_fuel_level_conversion() {
        assert_eq!(fuel_level_pct(0), 0);
        assert_eq!(fuel_level_pct(128), 50);
        assert_eq!(fuel_level_pct(255), 100);
    }

    #[test]
    fn test_engine_temp_conversion() {
        assert_eq!(engine_temp_c(110), 70);
        assert_eq!(engine_temp_c(40), 0);
        // Zero raw value lands below freezing, not at zero
        assert_eq!(engine_temp_c(0), -40);
    }

    #[test]
    fn test_speed_is_verbatim() {
        assert_eq!(speed_kph(0), 0);
        assert_eq!(speed_kph(90), 90);
    }

    #[test]
    fn test_rpm_conversion() {
        assert_eq!(rpm(0), 0);
        assert_eq!(rpm(3000), 750);
        // 0x1AF8 = 6904 quarter-revs = 1726 rpm
        assert_eq!(rpm(0x1AF8), 1726);
    }

    #[test]
    fn test_range_derivation() {
        assert_eq!(range_km(50, 600), 300);
        assert_eq!(range_km(100, 600), 600);
        // Empty or unknown tank reads as zero range
        assert_eq!(range_km(0, 600), 0);
        assert_eq!(range_km(-5, 600), 0);
    }
}
