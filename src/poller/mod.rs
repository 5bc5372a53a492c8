//! # Polling Engine
//!
//! Turns the request/response diagnostic session into a continuous reading
//! stream.
//!
//! This module handles:
//! - The fixed-interval polling loop (one composite reading per tick)
//! - Connection-loss detection (terminal for the run, no auto-reconnect)
//! - Publishing readings to the latest-value cache and the trip recorder
//!
//! Ticks never overlap: the next tick waits for the previous tick's four
//! queries to complete, so a slow link causes serialized back-pressure.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::obd::protocol::DiagnosticReading;
use crate::session::diagnostic::DiagnosticSession;
use crate::trip::TripRecorder;

/// Latest-value cache: `None` until the first reading, and again once the
/// link is lost
pub type ReadingCache = watch::Receiver<Option<DiagnosticReading>>;

/// Handle to a running polling task
pub struct PollerHandle {
    stop_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    /// Whether the polling task is still running
    ///
    /// Becomes `false` after `stop()` or once the task halted itself on
    /// link loss.
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stop polling and wait for the task to finish
    pub async fn stop(self) {
        let _ = self.stop_tx.send(()).await;
        let _ = self.task.await;
        info!("Polling stopped");
    }
}

/// Fixed-interval polling engine over a shared diagnostic session
pub struct Poller;

impl Poller {
    /// Spawn the polling task
    ///
    /// Each tick first re-checks the live link; on loss the task publishes
    /// `None` to the cache and halts itself; a fresh `connect()` and a new
    /// spawn are required. Otherwise it runs one full query round and hands
    /// the reading to the cache and to the trip recorder (a no-op while the
    /// recorder is idle).
    ///
    /// # Arguments
    ///
    /// * `session` - Connected diagnostic session, shared with the caller
    /// * `trip` - Trip recorder fed while recording
    /// * `poll_interval_ms` - Tick period
    ///
    /// # Returns
    ///
    /// * `(PollerHandle, ReadingCache)` - Stop handle and the latest-value
    ///   cache
    pub fn spawn(
        session: Arc<Mutex<DiagnosticSession>>,
        trip: Arc<Mutex<TripRecorder>>,
        poll_interval_ms: u64,
    ) -> (PollerHandle, ReadingCache) {
        let (reading_tx, reading_rx) = watch::channel(None);
        let (stop_tx, mut stop_rx) = mpsc::channel::<()>(1);

        let task = tokio::spawn(async move {
            let mut ticker = interval(Duration::from_millis(poll_interval_ms));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!("Polling started ({} ms tick)", poll_interval_ms);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let mut session = session.lock().await;
                        if !session.is_connected() {
                            warn!("Diagnostic link lost, polling halted");
                            let _ = reading_tx.send(None);
                            break;
                        }

                        let reading = session.poll_once().await;
                        drop(session);

                        debug!(
                            "Reading: fuel {}%, temp {} C, {} km/h, {} rpm",
                            reading.fuel_level_pct,
                            reading.engine_temp_c,
                            reading.speed_kph,
                            reading.rpm
                        );
                        let _ = reading_tx.send(Some(reading));
                        trip.lock().await.record(&reading);
                    }

                    _ = stop_rx.recv() => {
                        break;
                    }
                }
            }
        });

        (PollerHandle { stop_tx, task }, reading_rx)
    }
}
