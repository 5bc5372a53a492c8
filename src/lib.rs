//! # Car Telemetry Library
//!
//! Live vehicle telemetry over two independent transport channels.
//!
//! This library provides the core functionality for acquiring readings from
//! a line-oriented serial sensor feed and a request/response Bluetooth
//! OBD-II diagnostic link, normalizing them into a common data model and
//! aggregating them into trip summaries.

pub mod config;
pub mod error;
pub mod sensor;
pub mod obd;
pub mod session;
pub mod poller;
pub mod trip;
