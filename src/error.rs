//! # Error Types
//!
//! Custom error types for Car Telemetry using `thiserror`.

use thiserror::Error;

/// Main error type for Car Telemetry
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Transport-level failures (port open, link loss, write/read)
    #[error("Transport error: {0}")]
    Transport(String),

    /// OBD-II protocol errors
    #[error("OBD protocol error: {0}")]
    Protocol(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Car Telemetry
pub type Result<T> = std::result::Result<T, TelemetryError>;
