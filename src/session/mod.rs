//! # Transport Sessions
//!
//! Connection lifecycle for the two transport channels.
//!
//! This module handles:
//! - The shared connect/disconnect state machine
//! - The serial stream session (background read loop into the sensor
//!   pipeline)
//! - The injected Bluetooth GATT capability traits
//! - The request/response diagnostic session built on top of them

pub mod serial;
pub mod gatt;
pub mod diagnostic;

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// Connection lifecycle state shared by both session variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum ConnectionState {
    #[default]
    Disconnected = 0,
    Connecting = 1,
    Connected = 2,
}

impl ConnectionState {
    fn from_u8(value: u8) -> Self {
        match value {
            2 => ConnectionState::Connected,
            1 => ConnectionState::Connecting,
            _ => ConnectionState::Disconnected,
        }
    }
}

/// Lock-free connection state cell
///
/// The state is written by exactly one owner per transition (the session or
/// its read loop) and read concurrently by pollers, so an atomic is enough;
/// no write lock is required.
#[derive(Debug, Clone, Default)]
pub struct SharedState(Arc<AtomicU8>);

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, state: ConnectionState) {
        self.0.store(state as u8, Ordering::SeqCst);
    }

    pub fn get(&self) -> ConnectionState {
        ConnectionState::from_u8(self.0.load(Ordering::SeqCst))
    }

    pub fn is_connected(&self) -> bool {
        self.get() == ConnectionState::Connected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_is_disconnected() {
        let state = SharedState::new();
        assert_eq!(state.get(), ConnectionState::Disconnected);
        assert!(!state.is_connected());
    }

    #[test]
    fn test_transitions() {
        let state = SharedState::new();
        state.set(ConnectionState::Connecting);
        assert_eq!(state.get(), ConnectionState::Connecting);
        assert!(!state.is_connected());

        state.set(ConnectionState::Connected);
        assert!(state.is_connected());

        state.set(ConnectionState::Disconnected);
        assert!(!state.is_connected());
    }

    #[test]
    fn test_clones_share_the_cell() {
        let state = SharedState::new();
        let observer = state.clone();
        state.set(ConnectionState::Connected);
        assert!(observer.is_connected());
    }
}
