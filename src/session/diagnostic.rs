//! # Diagnostic Request/Response Session
//!
//! Drives the Bluetooth OBD-II link: device discovery through the injected
//! connector, the half-duplex command/response exchange with its mandatory
//! settling delay, and the per-metric queries assembled into one composite
//! reading per polling tick.

use crate::config::ObdConfig;
use crate::error::{Result, TelemetryError};
use crate::obd::codec::{decode_response, encode_command};
use crate::obd::protocol::{self, DiagnosticReading, Pid};
use crate::session::gatt::{DeviceFilter, GattConnector, GattLink};
use crate::session::ConnectionState;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// OBD-II diagnostic session over an injected GATT transport
pub struct DiagnosticSession {
    config: ObdConfig,
    connector: Box<dyn GattConnector>,
    link: Option<Box<dyn GattLink>>,
    state: ConnectionState,
}

impl std::fmt::Debug for DiagnosticSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiagnosticSession")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl DiagnosticSession {
    pub fn new(config: ObdConfig, connector: Box<dyn GattConnector>) -> Self {
        Self {
            config,
            connector,
            link: None,
            state: ConnectionState::Disconnected,
        }
    }

    /// Connect to a diagnostic adapter
    ///
    /// Discovers a device by the configured name prefixes and resolves the
    /// service/characteristic pair; the session is `Connected` only once
    /// both resolve.
    ///
    /// # Returns
    ///
    /// * `bool` - `true` on success; `false` on any discovery or resolution
    ///   failure (logged, state forced to `Disconnected`)
    pub async fn connect(&mut self) -> bool {
        if self.is_connected() {
            return true;
        }
        self.state = ConnectionState::Connecting;

        let filter = DeviceFilter {
            name_prefixes: self.config.name_prefixes.clone(),
            service_uuid: self.config.service_uuid.clone(),
            characteristic_uuid: self.config.characteristic_uuid.clone(),
        };

        match self.connector.discover(&filter).await {
            Ok(link) => {
                info!("OBD-II adapter connected");
                self.link = Some(link);
                self.state = ConnectionState::Connected;
                true
            }
            Err(e) => {
                warn!("OBD-II connection failed: {}", e);
                self.state = ConnectionState::Disconnected;
                false
            }
        }
    }

    /// Disconnect and clear the cached link handle
    ///
    /// Safe to call when already disconnected.
    pub async fn disconnect(&mut self) {
        if let Some(mut link) = self.link.take() {
            link.close().await;
        }
        self.state = ConnectionState::Disconnected;
    }

    /// Live connection check
    ///
    /// Re-checks the underlying link on every call; the link can drop
    /// asynchronously outside the session's control.
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
            && self.link.as_ref().is_some_and(|link| link.is_connected())
    }

    /// Current lifecycle state
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// One half-duplex command/response exchange
    ///
    /// Writes the encoded command, waits the settling delay (the adapter
    /// needs time before its response value is readable), then reads the
    /// response.
    async fn exchange(&mut self, pid: Pid) -> Result<Vec<u8>> {
        let link = self
            .link
            .as_mut()
            .ok_or_else(|| TelemetryError::Transport("not connected to OBD-II adapter".to_string()))?;

        link.write_value(&encode_command(pid)).await?;
        sleep(Duration::from_millis(self.config.settle_delay_ms)).await;
        let raw = link.read_value().await?;
        debug!("PID {} response: {} bytes", pid.command(), raw.len());
        Ok(raw)
    }

    /// Query one PID and convert the decoded value to physical units
    ///
    /// A transport failure short-circuits to 0 without the conversion; a
    /// garbled response decodes to raw 0 and still passes through `convert`
    /// (so a missing marker reads as -40 °C, exactly like a genuine zero).
    async fn query(&mut self, pid: Pid, convert: fn(u32) -> i32) -> i32 {
        match self.exchange(pid).await {
            Ok(raw) => convert(decode_response(&raw, pid)),
            Err(e) => {
                warn!("PID {} query failed: {}", pid.command(), e);
                0
            }
        }
    }

    /// Fuel tank level in percent
    pub async fn fuel_level(&mut self) -> i32 {
        self.query(Pid::FuelLevel, protocol::fuel_level_pct).await
    }

    /// Engine coolant temperature in °C
    pub async fn engine_temp(&mut self) -> i32 {
        self.query(Pid::EngineTemp, protocol::engine_temp_c).await
    }

    /// Vehicle speed in km/h
    pub async fn speed(&mut self) -> i32 {
        self.query(Pid::Speed, protocol::speed_kph).await
    }

    /// Engine speed in revolutions per minute
    pub async fn rpm(&mut self) -> i32 {
        self.query(Pid::Rpm, protocol::rpm).await
    }

    /// Run one full round of diagnostic queries
    ///
    /// The four queries execute strictly in sequence (fuel, temperature,
    /// speed, RPM); the link handles a single outstanding request, so
    /// concurrent queries are not a valid state. A single failed query
    /// zeroes its field and never blocks the rest.
    pub async fn poll_once(&mut self) -> DiagnosticReading {
        let fuel_level_pct = self.fuel_level().await;
        let engine_temp_c = self.engine_temp().await;
        let speed_kph = self.speed().await;
        let rpm = self.rpm().await;

        DiagnosticReading {
            fuel_level_pct,
            engine_temp_c,
            speed_kph,
            rpm,
            range_km: protocol::range_km(fuel_level_pct, self.config.full_range_km),
        }
    }
}
