//! # OBD-II Diagnostic Module
//!
//! Protocol layer for the ELM327-style Bluetooth diagnostic link.
//!
//! This module handles:
//! - PID command encoding (carriage-return terminated queries)
//! - Hexadecimal response decoding with the `41<PID>` marker scan
//! - Unit conversions from raw values to physical units
//! - The composite reading assembled once per polling tick

pub mod protocol;
pub mod codec;
