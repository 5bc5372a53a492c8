//! # Serial Stream Session
//!
//! Owns the serial sensor feed: opening the port, running the background
//! read loop that pumps bytes through the line framer into the sample
//! parser, and delivering parsed samples over a channel.
//!
//! Samples are delivered over an `mpsc` channel rather than a registered
//! callback, decoupling production timing from consumption timing; the
//! sequence restarts per connection. A read failure transitions the session
//! to `Disconnected` and ends the loop; a fresh `connect()` is required.

use crate::config::SerialConfig;
use crate::error::{Result, TelemetryError};
use crate::sensor::framer::LineFramer;
use crate::sensor::parser::{parse_line, SensorSample};
use crate::session::{ConnectionState, SharedState};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_serial::SerialPortBuilderExt;
use tracing::{debug, info, warn};

/// Device paths tried after the configured port
const FALLBACK_DEVICE_PATHS: &[&str] = &["/dev/ttyACM0", "/dev/ttyUSB0"];

/// Bound of the channel between the read loop and the subscriber
const SAMPLE_CHANNEL_CAPACITY: usize = 64;

/// Read buffer size for one transport chunk
const READ_CHUNK_SIZE: usize = 256;

/// Serial sensor feed session
pub struct SerialSession {
    config: SerialConfig,
    state: SharedState,
    samples_tx: mpsc::Sender<SensorSample>,
    reader: Option<JoinHandle<()>>,
    writer: Option<Box<dyn AsyncWrite + Send + Unpin>>,
}

impl std::fmt::Debug for SerialSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialSession")
            .field("port", &self.config.port)
            .field("state", &self.state.get())
            .finish_non_exhaustive()
    }
}

impl SerialSession {
    /// Create a session and the receiving end of its sample stream
    ///
    /// The receiver outlives individual connections: after a disconnect and
    /// a fresh `connect()`, new samples arrive on the same receiver.
    pub fn new(config: SerialConfig) -> (Self, mpsc::Receiver<SensorSample>) {
        let (samples_tx, samples_rx) = mpsc::channel(SAMPLE_CHANNEL_CAPACITY);
        (
            Self {
                config,
                state: SharedState::new(),
                samples_tx,
                reader: None,
                writer: None,
            },
            samples_rx,
        )
    }

    /// Connect to the sensor feed
    ///
    /// Tries the configured port first, then the common fallback paths, and
    /// starts the background read loop on success.
    ///
    /// # Returns
    ///
    /// * `bool` - `true` once the port is open and the read loop runs;
    ///   `false` on failure (logged, state forced to `Disconnected`) so the
    ///   caller can retry or inform the user without exception handling
    pub async fn connect(&mut self) -> bool {
        let configured = self.config.port.clone();
        let mut paths: Vec<&str> = vec![&configured];
        for path in FALLBACK_DEVICE_PATHS {
            if *path != configured {
                paths.push(path);
            }
        }
        self.connect_with_paths(&paths).await
    }

    /// Connect trying an explicit list of device paths
    pub async fn connect_with_paths(&mut self, paths: &[&str]) -> bool {
        if self.state.is_connected() {
            return true;
        }
        self.state.set(ConnectionState::Connecting);

        for path in paths {
            debug!("Trying to open serial port: {}", path);
            match self.open_port(path) {
                Ok(stream) => {
                    info!("Sensor feed connected at {}", path);
                    self.attach(stream);
                    return true;
                }
                Err(e) => {
                    warn!("Failed to open {}: {}", path, e);
                    continue;
                }
            }
        }

        warn!("No sensor device found at: {}", paths.join(", "));
        self.state.set(ConnectionState::Disconnected);
        false
    }

    /// Open a specific serial port with sensor feed settings (8N1)
    fn open_port(&self, path: &str) -> Result<tokio_serial::SerialStream> {
        let port = tokio_serial::new(path, self.config.baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(|e| TelemetryError::Transport(format!("Failed to open {}: {}", path, e)))?;

        Ok(port)
    }

    /// Attach an already-open byte stream and start the read loop
    ///
    /// This is the capability-injection point: anything readable and
    /// writable works as the transport, which is how tests drive the
    /// session without hardware.
    pub fn attach<S>(&mut self, stream: S)
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (read_half, write_half) = tokio::io::split(stream);
        self.writer = Some(Box::new(write_half));
        self.state.set(ConnectionState::Connected);
        self.reader = Some(tokio::spawn(read_loop(
            read_half,
            self.samples_tx.clone(),
            self.state.clone(),
        )));
    }

    /// Live connection check
    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    /// Current lifecycle state
    pub fn state(&self) -> ConnectionState {
        self.state.get()
    }

    /// Send a command line to the sensor device
    ///
    /// The command is terminated with a newline, matching the feed's
    /// line-oriented dialect.
    ///
    /// # Errors
    ///
    /// Returns a transport error when no port is attached or the write
    /// fails.
    pub async fn send_command(&mut self, command: &str) -> Result<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| TelemetryError::Transport("serial port not connected".to_string()))?;

        writer.write_all(command.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
        debug!("Sent sensor command ({} bytes)", command.len() + 1);
        Ok(())
    }

    /// Disconnect and release the port
    ///
    /// Stops the read loop and waits for it to finish before returning, so
    /// the same transport can be safely reopened. Safe to call when already
    /// disconnected.
    pub async fn disconnect(&mut self) {
        if let Some(handle) = self.reader.take() {
            handle.abort();
            let _ = handle.await;
        }
        self.writer = None;
        self.state.set(ConnectionState::Disconnected);
    }
}

/// Background read loop: transport bytes -> framer -> parser -> channel
///
/// Exits on end-of-stream or I/O failure, transitioning the session to
/// `Disconnected`. The framer's trailing fragment dies with the loop; a
/// partial record is never flushed as a fake final line.
async fn read_loop<R>(
    mut reader: R,
    samples_tx: mpsc::Sender<SensorSample>,
    state: SharedState,
) where
    R: AsyncRead + Send + Unpin,
{
    let mut framer = LineFramer::new();
    let mut buf = [0u8; READ_CHUNK_SIZE];

    loop {
        match reader.read(&mut buf).await {
            Ok(0) => {
                info!("Sensor stream ended");
                break;
            }
            Ok(n) => {
                for line in framer.feed(&buf[..n]) {
                    if let Some(sample) = parse_line(&line) {
                        // A closed receiver means no active subscriber;
                        // the sample is dropped, not an error
                        if samples_tx.send(sample).await.is_err() {
                            debug!("No sample subscriber, reading continues");
                        }
                    }
                }
            }
            Err(e) => {
                warn!("Sensor read failed: {}", e);
                break;
            }
        }
    }

    state.set(ConnectionState::Disconnected);
}
