//! # tally-printer: Printer Connection Manager for Tally
//!
//! Finds receipt printers, binds to one, and sends receipt text to it,
//! refusing to print unless a printer is actually connected and idle.
//!
//! ## Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   caller ──► PrinterManager ──► PermissionGate (before every scan)     │
//! │                   │                                                     │
//! │                   │ at most one call in flight                          │
//! │                   ▼                                                     │
//! │             PrinterTransport  ──►  RFCOMM tty / spool file / mock       │
//! │                   │                                                     │
//! │                   └──► PrinterEventEmitter (every transition + error)   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//! - [`manager`] - The connection state machine
//! - [`transport`] - Transport trait and implementations
//! - [`permission`] - Permission gate consulted before scanning
//! - [`config`] - `[printer]` settings
//! - [`error`] - Transport and state machine errors
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tally_printer::{PrinterManager, StaticGate};
//! use tally_printer::transport::mock::MockTransport;
//!
//! let manager = PrinterManager::new(
//!     MockTransport::with_device_ids(&["66:22:8A:1B:00:C4"]),
//!     StaticGate::granted(),
//! );
//!
//! let devices = manager.scan().await?;
//! manager.connect(&devices[0].device_id).await?;
//! manager.print("Beverage List\n").await?;
//! manager.disconnect().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod manager;
pub mod permission;
pub mod transport;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{PermissionPolicy, PrinterSettings, RfcommSettings, SpoolSettings, TransportKind};
pub use error::{PrinterError, PrinterResult, SettingsError, TransportError, TransportResult};
pub use manager::{
    ConnectionSnapshot, NoOpEmitter, PendingOperation, PrinterEventEmitter, PrinterManager,
    PrinterState,
};
pub use permission::{gate_for, PermissionGate, PermissionStatus, RfcommAccessGate, StaticGate};
pub use transport::{transport_for, DeviceDescriptor, DeviceId, PrinterTransport};
