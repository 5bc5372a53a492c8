//! # Sensor Sample Parser
//!
//! Converts one framed serial record into a typed sensor sample.
//!
//! Two record formats are accepted:
//! - JSON object with keys `temp,hum,pres,volt,c1,c2` (preferred)
//! - Comma-separated positional fallback
//!   `temperature,humidity,pressure,voltage[,custom1[,custom2]]` with a
//!   minimum of 4 fields
//!
//! Missing or unparsable fields resolve to 0 through [`num_or_zero`] /
//! [`field_or_zero`], keeping the pipeline running with degraded precision
//! rather than stalling on garbled input.

use serde::Serialize;
use serde_json::Value;

/// One normalized reading from the serial sensor feed
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SensorSample {
    pub temperature: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub voltage: f64,
    pub custom1: f64,
    pub custom2: f64,
}

/// Parse-or-default for JSON values: always yields a defined number
///
/// Non-numeric and absent values become 0. The zero-default policy is
/// deliberate and matches the diagnostic channel's decode fallback.
pub fn num_or_zero(value: Option<&Value>) -> f64 {
    value.and_then(Value::as_f64).unwrap_or(0.0)
}

/// Parse-or-default for positional CSV fields
///
/// Out-of-range indices and unparsable text become 0.
pub fn field_or_zero(fields: &[&str], index: usize) -> f64 {
    fields
        .get(index)
        .and_then(|field| field.trim().parse::<f64>().ok())
        .unwrap_or(0.0)
}

/// Parse one framed line into a sensor sample
///
/// # Arguments
///
/// * `line` - One complete line from the framer
///
/// # Returns
///
/// * `Option<SensorSample>` - `None` for empty lines and for CSV records
///   with fewer than 4 fields; such lines are silently ignored, not errors
pub fn parse_line(line: &str) -> Option<SensorSample> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    // Primary path: structured JSON record
    if let Ok(value) = serde_json::from_str::<Value>(line) {
        return Some(SensorSample {
            temperature: num_or_zero(value.get("temp")),
            humidity: num_or_zero(value.get("hum")),
            pressure: num_or_zero(value.get("pres")),
            voltage: num_or_zero(value.get("volt")),
            custom1: num_or_zero(value.get("c1")),
            custom2: num_or_zero(value.get("c2")),
        });
    }

    // Fallback path: comma-separated positional record
    let parts: Vec<&str> = line.split(',').collect();
    if parts.len() < 4 {
        return None;
    }

    Some(SensorSample {
        temperature: field_or_zero(&parts, 0),
        humidity: field_or_zero(&parts, 1),
        pressure: field_or_zero(&parts, 2),
        voltage: field_or_zero(&parts, 3),
        custom1: field_or_zero(&parts, 4),
        custom2: field_or_zero(&parts, 5),
    })
}
