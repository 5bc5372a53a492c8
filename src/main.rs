//! # Car Telemetry
//!
//! Vehicle telemetry daemon: polls an OBD-II diagnostic adapter for fuel,
//! temperature, speed and RPM, and aggregates readings into trip summaries.
//!
//! This binary wires the library against a simulated ELM327-style adapter so
//! the full pipeline (connect, poll, record, finalize) runs without hardware.
//! A platform integration supplies a real `GattConnector` instead.

use anyhow::Result;
use async_trait::async_trait;
use std::io;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};
use tracing_subscriber;

use car_telemetry::config::Config;
use car_telemetry::poller::Poller;
use car_telemetry::session::diagnostic::DiagnosticSession;
use car_telemetry::session::gatt::{DeviceFilter, GattConnector, GattLink};
use car_telemetry::trip::TripRecorder;

/// Configuration file checked at startup; defaults apply when absent
const CONFIG_PATH: &str = "config/default.toml";

/// In-process stand-in for an ELM327 adapter
///
/// Answers the four polled commands with slowly drifting values: fuel drains,
/// speed follows a triangle wave, temperature jitters around 90 °C.
struct SimulatedLink {
    phase: u32,
    last_command: Vec<u8>,
    connected: bool,
}

impl SimulatedLink {
    fn new() -> Self {
        Self {
            phase: 0,
            last_command: Vec::new(),
            connected: true,
        }
    }

    /// Raw fuel byte: starts near full, drains one step every 30 reads
    fn fuel_raw(&self) -> u32 {
        230u32.saturating_sub(self.phase / 30)
    }

    /// Raw speed byte: triangle wave between ~50 and ~90 km/h
    fn speed_raw(&self) -> u32 {
        let t = self.phase % 80;
        if t < 40 {
            50 + t
        } else {
            130 - t
        }
    }
}

#[async_trait]
impl GattLink for SimulatedLink {
    async fn write_value(&mut self, data: &[u8]) -> io::Result<()> {
        self.last_command = data.to_vec();
        Ok(())
    }

    async fn read_value(&mut self) -> io::Result<Vec<u8>> {
        self.phase = self.phase.wrapping_add(1);
        let response = match self.last_command.as_slice() {
            b"012F\r" => format!("41 2F {:02X}\r>", self.fuel_raw()),
            b"0105\r" => format!("41 05 {:02X}\r>", 130 + self.phase % 3),
            b"010D\r" => format!("41 0D {:02X}\r>", self.speed_raw()),
            b"010C\r" => format!("41 0C {:04X}\r>", self.speed_raw() * 90 + 3200),
            _ => "?\r>".to_string(),
        };
        Ok(response.into_bytes())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    async fn close(&mut self) {
        self.connected = false;
    }
}

/// Connector that always "discovers" the simulated adapter
struct SimulatedConnector;

#[async_trait]
impl GattConnector for SimulatedConnector {
    async fn discover(&self, filter: &DeviceFilter) -> io::Result<Box<dyn GattLink>> {
        info!(
            "Simulated adapter answering discovery (prefixes: {})",
            filter.name_prefixes.join(", ")
        );
        Ok(Box::new(SimulatedLink::new()))
    }
}

/// Main entry point
///
/// Loads configuration, connects the diagnostic session, spawns the polling
/// engine and records one trip until Ctrl+C, then finalizes and logs the
/// trip summary.
///
/// # Errors
///
/// Returns error if no diagnostic adapter can be connected.
#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Car telemetry v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = match Config::load(CONFIG_PATH) {
        Ok(config) => config,
        Err(e) => {
            warn!("Could not load {} ({}), using defaults", CONFIG_PATH, e);
            Config::default()
        }
    };

    let mut session = DiagnosticSession::new(config.obd.clone(), Box::new(SimulatedConnector));
    if !session.connect().await {
        anyhow::bail!("no OBD-II adapter found");
    }

    let session = Arc::new(Mutex::new(session));
    let trip = Arc::new(Mutex::new(TripRecorder::new(config.trip.clone())));

    let (poller, mut readings) =
        Poller::spawn(session.clone(), trip.clone(), config.obd.poll_interval_ms);

    // Start recording once the first reading fixes the departure fuel level
    readings.changed().await?;
    if let Some(first) = *readings.borrow() {
        trip.lock().await.start(first.fuel_level_pct);
    }

    info!("Press Ctrl+C to exit");

    // Main loop: log each reading until shutdown or link loss
    loop {
        tokio::select! {
            changed = readings.changed() => {
                if changed.is_err() {
                    break;
                }
                match *readings.borrow() {
                    Some(reading) => {
                        info!(
                            "fuel {}% | {} km/h | {} rpm | {} C | range {} km",
                            reading.fuel_level_pct,
                            reading.speed_kph,
                            reading.rpm,
                            reading.engine_temp_c,
                            reading.range_km
                        );
                    }
                    None => {
                        warn!("Diagnostic link lost");
                        break;
                    }
                }
            }

            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
        }
    }

    poller.stop().await;
    if let Some(record) = trip.lock().await.stop() {
        info!(
            "Trip: {:.1} km in {} min, avg {:.0} km/h, max {} km/h, {:.1} L used ({:.1} L/100km)",
            record.distance_km,
            record.duration_min,
            record.avg_speed_kph,
            record.max_speed_kph,
            record.fuel_used_l,
            record.avg_consumption_l_per_100km
        );
    }
    session.lock().await.disconnect().await;

    info!("Shutdown complete");
    Ok(())
}
