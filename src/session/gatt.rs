//! # GATT Capability Traits
//!
//! Injected capability set for the Bluetooth diagnostic link.
//!
//! The core never talks to a radio directly. The platform supplies a
//! [`GattConnector`] that discovers a device by name prefix and resolves the
//! service/characteristic pair; the resulting [`GattLink`] is the half-duplex
//! write/read primitive the diagnostic session drives. Absence of a real
//! implementation is a startup concern, not a runtime branch inside the core.

use async_trait::async_trait;
use std::io;

/// Device discovery filter: name prefixes plus the fixed GATT identifiers
#[derive(Debug, Clone)]
pub struct DeviceFilter {
    pub name_prefixes: Vec<String>,
    pub service_uuid: String,
    pub characteristic_uuid: String,
}

/// A resolved GATT characteristic link
///
/// The link is half-duplex at the application level: one value is written,
/// then after a settling delay one value is read back.
#[async_trait]
pub trait GattLink: Send {
    /// Write one command value to the characteristic
    async fn write_value(&mut self, data: &[u8]) -> io::Result<()>;

    /// Read the current characteristic value
    async fn read_value(&mut self) -> io::Result<Vec<u8>>;

    /// Live link check
    ///
    /// The link can drop asynchronously outside the session's control, so
    /// this must reflect the actual state, not a cached flag.
    fn is_connected(&self) -> bool;

    /// Close the link and release platform resources
    async fn close(&mut self);
}

/// Platform-supplied discovery and resolution
#[async_trait]
pub trait GattConnector: Send + Sync {
    /// Discover a device matching the filter and resolve its service and
    /// characteristic
    ///
    /// # Errors
    ///
    /// Returns an error when no device matches, the connection is refused,
    /// or GATT resolution fails. The session converts this into a `false`
    /// connect result.
    async fn discover(&self, filter: &DeviceFilter) -> io::Result<Box<dyn GattLink>>;
}

#[cfg(test)]
pub mod mocks {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    /// Scripted GATT link for testing
    #[derive(Clone, Default)]
    pub struct MockGattLink {
        pub written: Arc<Mutex<Vec<Vec<u8>>>>,
        pub responses: Arc<Mutex<VecDeque<Vec<u8>>>>,
        pub connected: Arc<AtomicBool>,
        pub read_error: Arc<Mutex<Option<io::ErrorKind>>>,
    }

    impl MockGattLink {
        pub fn new() -> Self {
            let link = Self::default();
            link.connected.store(true, Ordering::SeqCst);
            link
        }

        pub fn queue_response(&self, raw: &[u8]) {
            self.responses.lock().unwrap().push_back(raw.to_vec());
        }

        pub fn written_commands(&self) -> Vec<Vec<u8>> {
            self.written.lock().unwrap().clone()
        }

        pub fn drop_link(&self) {
            self.connected.store(false, Ordering::SeqCst);
        }

        pub fn set_read_error(&self, kind: io::ErrorKind) {
            *self.read_error.lock().unwrap() = Some(kind);
        }
    }

    #[async_trait]
    impl GattLink for MockGattLink {
        async fn write_value(&mut self, data: &[u8]) -> io::Result<()> {
            self.written.lock().unwrap().push(data.to_vec());
            Ok(())
        }

        async fn read_value(&mut self) -> io::Result<Vec<u8>> {
            if let Some(kind) = *self.read_error.lock().unwrap() {
                return Err(io::Error::new(kind, "mock read error"));
            }
            Ok(self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_default())
        }

        fn is_connected(&self) -> bool {
            self.connected.load(Ordering::SeqCst)
        }

        async fn close(&mut self) {
            self.connected.store(false, Ordering::SeqCst);
        }
    }

    /// Connector returning a pre-built mock link, or failing on demand
    pub struct MockGattConnector {
        pub link: Mutex<Option<MockGattLink>>,
        pub seen_filter: Arc<Mutex<Option<DeviceFilter>>>,
    }

    impl MockGattConnector {
        pub fn with_link(link: MockGattLink) -> Self {
            Self {
                link: Mutex::new(Some(link)),
                seen_filter: Arc::new(Mutex::new(None)),
            }
        }

        /// A connector that never finds a device
        pub fn failing() -> Self {
            Self {
                link: Mutex::new(None),
                seen_filter: Arc::new(Mutex::new(None)),
            }
        }
    }

    #[async_trait]
    impl GattConnector for MockGattConnector {
        async fn discover(&self, filter: &DeviceFilter) -> io::Result<Box<dyn GattLink>> {
            *self.seen_filter.lock().unwrap() = Some(filter.clone());
            match self.link.lock().unwrap().take() {
                Some(link) => Ok(Box::new(link)),
                None => Err(io::Error::new(
                    io::ErrorKind::NotFound,
                    "no matching device",
                )),
            }
        }
    }
}
