//! # Trip Recording Module
//!
//! Reduces the composite-reading stream into trip summaries.
//!
//! This module handles:
//! - The Idle/Recording state machine
//! - The bounded live-sample ring used for charting
//! - Running distance and extrema accumulation per reading
//! - Trip finalization math and the bounded history list

use std::collections::VecDeque;
use std::time::Instant;

use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::TripConfig;
use crate::obd::protocol::DiagnosticReading;

/// Trip recording state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TripState {
    #[default]
    Idle,
    Recording,
}

/// One point of the live chart ring, owned by the active trip
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripSample {
    pub time_label: String,
    pub fuel_pct: i32,
    pub speed_kph: i32,
    pub temp_c: i32,
}

/// Finalized trip summary, immutable once produced
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripRecord {
    pub timestamp: DateTime<Utc>,
    pub distance_km: f64,
    pub avg_speed_kph: f64,
    pub max_speed_kph: i32,
    pub fuel_used_l: f64,
    pub avg_consumption_l_per_100km: f64,
    pub duration_min: i64,
}

/// Trip aggregation engine
///
/// Counters and the sample ring are meaningful only while `Recording`;
/// `start()` resets them and `stop()` folds them into a [`TripRecord`].
pub struct TripRecorder {
    config: TripConfig,
    state: TripState,
    ring: VecDeque<TripSample>,
    history: VecDeque<TripRecord>,
    started_at: Option<Instant>,
    start_fuel_pct: i32,
    current_fuel_pct: i32,
    max_speed_kph: i32,
    distance_km: f64,
}

/// Round to one decimal place
fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

impl TripRecorder {
    pub fn new(config: TripConfig) -> Self {
        Self {
            config,
            state: TripState::Idle,
            ring: VecDeque::new(),
            history: VecDeque::new(),
            started_at: None,
            start_fuel_pct: 0,
            current_fuel_pct: 0,
            max_speed_kph: 0,
            distance_km: 0.0,
        }
    }

    pub fn state(&self) -> TripState {
        self.state
    }

    /// Live sample ring, newest last
    pub fn ring(&self) -> &VecDeque<TripSample> {
        &self.ring
    }

    /// Finalized trips, newest first
    pub fn history(&self) -> &VecDeque<TripRecord> {
        &self.history
    }

    /// Start recording a trip
    ///
    /// Clears the sample ring, snapshots the start time and the current
    /// fuel level, and resets the running counters. Starting while already
    /// recording restarts the trip.
    ///
    /// # Arguments
    ///
    /// * `current_fuel_pct` - Fuel level at departure, from the latest
    ///   reading cache
    pub fn start(&mut self, current_fuel_pct: i32) {
        self.ring.clear();
        self.started_at = Some(Instant::now());
        self.start_fuel_pct = current_fuel_pct;
        self.current_fuel_pct = current_fuel_pct;
        self.max_speed_kph = 0;
        self.distance_km = 0.0;
        self.state = TripState::Recording;
        info!("Trip recording started at {}% fuel", current_fuel_pct);
    }

    /// Fold one composite reading into the active trip
    ///
    /// No-op while idle. Appends a chart sample (ring bounded to the
    /// configured length, oldest evicted first), tracks the maximum speed,
    /// and integrates distance: speed in km/h over one tick contributes
    /// `speed / distance_divisor` km.
    pub fn record(&mut self, reading: &DiagnosticReading) {
        if self.state != TripState::Recording {
            return;
        }

        self.ring.push_back(TripSample {
            time_label: Local::now().format("%H:%M:%S").to_string(),
            fuel_pct: reading.fuel_level_pct,
            speed_kph: reading.speed_kph,
            temp_c: reading.engine_temp_c,
        });
        while self.ring.len() > self.config.sample_ring_len {
            self.ring.pop_front();
        }

        self.max_speed_kph = self.max_speed_kph.max(reading.speed_kph);
        self.distance_km += reading.speed_kph as f64 / self.config.distance_divisor;
        self.current_fuel_pct = reading.fuel_level_pct;
        debug!(
            "Trip sample: {} km/h, {:.2} km so far",
            reading.speed_kph, self.distance_km
        );
    }

    /// Stop recording and finalize the trip
    ///
    /// # Returns
    ///
    /// * `Option<TripRecord>` - The finalized record, prepended to history
    ///   (bounded, oldest dropped); `None` when no trip was active, since a
    ///   stop while idle is a no-op, not an error
    pub fn stop(&mut self) -> Option<TripRecord> {
        if self.state != TripState::Recording {
            return None;
        }

        let elapsed_ms = self
            .started_at
            .map(|started| started.elapsed().as_millis() as f64)
            .unwrap_or(0.0);
        let duration_min = (elapsed_ms / 60_000.0).round() as i64;

        let fuel_used_l = (self.start_fuel_pct - self.current_fuel_pct) as f64 / 100.0
            * self.config.tank_capacity_l;

        let avg_speed_kph = if self.ring.is_empty() {
            0.0
        } else {
            self.ring.iter().map(|s| s.speed_kph as f64).sum::<f64>() / self.ring.len() as f64
        };

        let avg_consumption = if self.distance_km > 0.0 {
            fuel_used_l / self.distance_km * 100.0
        } else {
            0.0
        };

        let record = TripRecord {
            timestamp: Utc::now(),
            distance_km: round1(self.distance_km),
            avg_speed_kph,
            max_speed_kph: self.max_speed_kph,
            fuel_used_l,
            avg_consumption_l_per_100km: round1(avg_consumption),
            duration_min,
        };

        self.history.push_front(record.clone());
        self.history.truncate(self.config.history_cap);

        self.state = TripState::Idle;
        self.started_at = None;
        info!(
            "Trip finalized: {:.1} km, max {} km/h, {} min",
            record.distance_km, record.max_speed_kph, record.duration_min
        );
        Some(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder() -> TripRecorder {
        TripRecorder::new(TripConfig::default())
    }

    fn reading(speed: i32, fuel: i32) -> DiagnosticReading {
        DiagnosticReading {
            fuel_level_pct: fuel,
            engine_temp_c: 90,
            speed_kph: speed,
            rpm: 2000,
            range_km: 0,
        }
    }

    #[test]
    fn test_initial_state_is_idle() {
        let trip = recorder();
        assert_eq!(trip.state(), TripState::Idle);
        assert!(trip.ring().is_empty());
        assert!(trip.history().is_empty());
    }

    #[test]
    fn test_constant_speed_trip() {
        let mut trip = recorder();
        trip.start(60);

        // Ten 2-second ticks at 90 km/h
        for _ in 0..10 {
            trip.record(&reading(90, 60));
        }
        let record = trip.stop().unwrap();

        assert_eq!(record.distance_km, 0.5);
        assert_eq!(record.max_speed_kph, 90);
        assert_eq!(record.avg_speed_kph, 90.0);
        assert_eq!(record.duration_min, 0);
        assert_eq!(trip.state(), TripState::Idle);
    }

    #[test]
    fn test_max_speed_tracking() {
        let mut trip = recorder();
        trip.start(50);
        trip.record(&reading(40, 50));
        trip.record(&reading(120, 50));
        trip.record(&reading(80, 50));

        let record = trip.stop().unwrap();
        assert_eq!(record.max_speed_kph, 120);
        assert_eq!(record.avg_speed_kph, 80.0);
    }

    #[test]
    fn test_fuel_used_and_consumption() {
        let mut trip = recorder();
        trip.start(60);

        // 50 ticks at 108 km/h = 3.0 km; fuel drops 60% -> 55%
        for _ in 0..50 {
            trip.record(&reading(108, 55));
        }
        let record = trip.stop().unwrap();

        assert_eq!(record.distance_km, 3.0);
        // 5% of a 60 L tank
        assert!((record.fuel_used_l - 3.0).abs() < 1e-9);
        // 3 L over 3 km scaled to 100 km
        assert_eq!(record.avg_consumption_l_per_100km, 100.0);
    }

    #[test]
    fn test_zero_distance_has_zero_consumption() {
        let mut trip = recorder();
        trip.start(60);
        trip.record(&reading(0, 59));

        let record = trip.stop().unwrap();
        assert_eq!(record.distance_km, 0.0);
        assert_eq!(record.avg_consumption_l_per_100km, 0.0);
    }

    #[test]
    fn test_stop_without_start_is_noop() {
        let mut trip = recorder();
        assert_eq!(trip.stop(), None);
        assert!(trip.history().is_empty());
    }

    #[test]
    fn test_record_while_idle_is_noop() {
        let mut trip = recorder();
        trip.record(&reading(90, 60));
        assert!(trip.ring().is_empty());
    }

    #[test]
    fn test_ring_is_bounded_to_newest_thirty() {
        let mut trip = recorder();
        trip.start(60);
        for speed in 0..40 {
            trip.record(&reading(speed, 60));
        }

        assert_eq!(trip.ring().len(), 30);
        // Oldest evicted first: samples 10..40 remain in arrival order
        assert_eq!(trip.ring().front().unwrap().speed_kph, 10);
        assert_eq!(trip.ring().back().unwrap().speed_kph, 39);
    }

    #[test]
    fn test_avg_speed_covers_ring_only() {
        let mut trip = recorder();
        trip.start(60);
        // 10 early slow ticks scroll out of the 30-sample ring
        for _ in 0..10 {
            trip.record(&reading(0, 60));
        }
        for _ in 0..30 {
            trip.record(&reading(60, 60));
        }

        let record = trip.stop().unwrap();
        assert_eq!(record.avg_speed_kph, 60.0);
    }

    #[test]
    fn test_history_bounded_to_ten() {
        let mut trip = recorder();
        for i in 0..11 {
            trip.start(60);
            trip.record(&reading(10 * i, 60));
            assert!(trip.stop().is_some());
        }

        assert_eq!(trip.history().len(), 10);
        // Newest first; the very first trip (max 0 km/h) was evicted
        assert_eq!(trip.history().front().unwrap().max_speed_kph, 100);
        assert_eq!(trip.history().back().unwrap().max_speed_kph, 10);
    }

    #[test]
    fn test_restart_clears_previous_trip() {
        let mut trip = recorder();
        trip.start(60);
        trip.record(&reading(90, 60));

        trip.start(55);
        assert!(trip.ring().is_empty());
        let record = trip.stop().unwrap();
        assert_eq!(record.distance_km, 0.0);
        assert_eq!(record.max_speed_kph, 0);
    }

    #[test]
    fn test_empty_ring_yields_zero_avg_speed() {
        let mut trip = recorder();
        trip.start(60);
        let record = trip.stop().unwrap();
        assert_eq!(record.avg_speed_kph, 0.0);
        assert_eq!(record.fuel_used_l, 0.0);
    }

    #[test]
    fn test_distance_rounding() {
        let mut trip = recorder();
        trip.start(60);
        // 3 ticks at 100 km/h = 0.1666... km, rounds to 0.2
        for _ in 0..3 {
            trip.record(&reading(100, 60));
        }
        let record = trip.stop().unwrap();
        assert_eq!(record.distance_km, 0.2);
    }
}
