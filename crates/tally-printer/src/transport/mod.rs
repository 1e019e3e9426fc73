//! # Printer Transports
//!
//! The seam between the connection state machine and real hardware.
//!
//! ## Transport Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      PrinterTransport                                   │
//! │                                                                         │
//! │  initialize()      Bring the link up (radio on, driver present)        │
//! │  list_devices()    Printers reachable right now                        │
//! │  connect(id)       Bind to one of them                                 │
//! │  send_text(text)   Write a receipt to the bound printer                │
//! │  disconnect()      Release the binding                                 │
//! │                                                                         │
//! │  The manager guarantees at most ONE call is in flight at a time, so    │
//! │  implementations only need interior mutability, not their own          │
//! │  sequencing.                                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Implementations
//! - [`rfcomm::RfcommTransport`] - Bluetooth SPP printers bound as `/dev/rfcommN`
//! - [`spool::SpoolTransport`] - Append receipts to files (no hardware)
//! - [`mock::MockTransport`] - Scriptable fake for tests

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::{PrinterSettings, TransportKind};
use crate::error::TransportResult;

pub mod mock;
pub mod rfcomm;
pub mod spool;

// =============================================================================
// Device Identity
// =============================================================================

/// Opaque device identifier assigned by the transport.
///
/// For RFCOMM this is the printer's MAC address; for spool files it is the
/// file path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    pub fn new(id: impl Into<String>) -> Self {
        DeviceId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeviceId {
    fn from(id: &str) -> Self {
        DeviceId(id.to_string())
    }
}

impl From<String> for DeviceId {
    fn from(id: String) -> Self {
        DeviceId(id)
    }
}

/// A printer found by a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceDescriptor {
    pub device_id: DeviceId,
    pub display_name: String,
}

impl DeviceDescriptor {
    pub fn new(device_id: impl Into<DeviceId>, display_name: impl Into<String>) -> Self {
        DeviceDescriptor {
            device_id: device_id.into(),
            display_name: display_name.into(),
        }
    }
}

// =============================================================================
// Transport Trait
// =============================================================================

/// A wireless (or pretend-wireless) link to receipt printers.
#[async_trait]
pub trait PrinterTransport: Send + Sync {
    /// Brings the link up. Called before every scan.
    async fn initialize(&self) -> TransportResult<()>;

    /// Lists printers reachable right now. An empty list is a valid answer.
    async fn list_devices(&self) -> TransportResult<Vec<DeviceDescriptor>>;

    /// Binds to a device from the last listing.
    async fn connect(&self, device_id: &DeviceId) -> TransportResult<()>;

    /// Releases the current binding.
    async fn disconnect(&self) -> TransportResult<()>;

    /// Sends receipt text to the bound device.
    async fn send_text(&self, text: &str) -> TransportResult<()>;
}

/// Lets the app pick a transport at runtime (`Box<dyn PrinterTransport>`).
#[async_trait]
impl<T: PrinterTransport + ?Sized> PrinterTransport for Box<T> {
    async fn initialize(&self) -> TransportResult<()> {
        (**self).initialize().await
    }

    async fn list_devices(&self) -> TransportResult<Vec<DeviceDescriptor>> {
        (**self).list_devices().await
    }

    async fn connect(&self, device_id: &DeviceId) -> TransportResult<()> {
        (**self).connect(device_id).await
    }

    async fn disconnect(&self) -> TransportResult<()> {
        (**self).disconnect().await
    }

    async fn send_text(&self, text: &str) -> TransportResult<()> {
        (**self).send_text(text).await
    }
}

/// Builds the transport the settings select.
pub fn transport_for(settings: &PrinterSettings) -> Box<dyn PrinterTransport> {
    match settings.transport {
        TransportKind::Rfcomm => Box::new(rfcomm::RfcommTransport::new(&settings.rfcomm)),
        TransportKind::Spool => Box::new(spool::SpoolTransport::new(&settings.spool)),
    }
}
