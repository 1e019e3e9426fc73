//! # Printer Connection Manager
//!
//! The connection state machine that decides when printing is allowed.
//!
//! ## State Diagram
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │        scan()                        connect(id) ok                     │
//! │   ┌──────────────┐            ┌──────────────────────────────┐          │
//! │   │              ▼            │                              ▼          │
//! │ ┌─┴───────────────────┐  done │                   ┌─────────────────┐   │
//! │ │    Disconnected     │◄──────┴─── Scanning       │ Connected(id)   │   │
//! │ │                     │                           │                 │   │
//! │ │  (connect pending)  │◄──────────────────────────┤ (disconnect     │   │
//! │ └─────────────────────┘      disconnect()         │  pending)       │   │
//! │                                                   └───┬─────────▲───┘   │
//! │                                                print  │         │ done  │
//! │                                                       ▼         │       │
//! │                                                   ┌─────────────┴───┐   │
//! │                                                   │    Busy(id)     │   │
//! │                                                   └─────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency
//! Every transition runs under a short `tokio::sync::Mutex` that is never
//! held across a transport call. While a connect or disconnect is in flight
//! a *pending* marker is set; together with `Scanning`/`Busy` it makes
//! overlapping calls fail fast instead of interleaving:
//!
//! | Call while...        | print          | scan / connect / disconnect |
//! |----------------------|----------------|-----------------------------|
//! | Scanning             | `NotConnected` | `InvalidState`              |
//! | connect pending      | `NotConnected` | `InvalidState`              |
//! | disconnect pending   | `NotConnected` | `InvalidState`              |
//! | Busy                 | `NotConnected` | `InvalidState`              |
//!
//! Futures returned by the manager should be driven to completion. Dropping
//! one mid-call leaves the pending marker (or `Busy`) in place.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::error::{PrinterError, PrinterResult, TransportError};
use crate::permission::PermissionGate;
use crate::transport::{DeviceDescriptor, DeviceId, PrinterTransport};

// =============================================================================
// Printer State
// =============================================================================

/// Where the connection stands. The device id lives inside the bound
/// variants, so it is present exactly when a printer is bound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "deviceId", rename_all = "snake_case")]
pub enum PrinterState {
    Disconnected,
    Scanning,
    Connected(DeviceId),
    Busy(DeviceId),
}

impl PrinterState {
    /// The bound printer, if any.
    pub fn device_id(&self) -> Option<&DeviceId> {
        match self {
            PrinterState::Connected(id) | PrinterState::Busy(id) => Some(id),
            PrinterState::Disconnected | PrinterState::Scanning => None,
        }
    }
}

impl fmt::Display for PrinterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrinterState::Disconnected => write!(f, "disconnected"),
            PrinterState::Scanning => write!(f, "scanning"),
            PrinterState::Connected(id) => write!(f, "connected to {}", id),
            PrinterState::Busy(id) => write!(f, "busy printing on {}", id),
        }
    }
}

/// A connect or disconnect whose transport call has not returned yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "operation", content = "deviceId", rename_all = "snake_case")]
pub enum PendingOperation {
    Connecting(DeviceId),
    Disconnecting(DeviceId),
}

impl fmt::Display for PendingOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PendingOperation::Connecting(id) => write!(f, "connecting to {}", id),
            PendingOperation::Disconnecting(id) => write!(f, "disconnecting from {}", id),
        }
    }
}

// =============================================================================
// Snapshot
// =============================================================================

/// Everything a UI needs to render the printer panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionSnapshot {
    pub state: PrinterState,
    pub pending: Option<PendingOperation>,
    pub known_devices: Vec<DeviceDescriptor>,
    pub last_error: Option<String>,
}

impl ConnectionSnapshot {
    /// Whether `print` would be accepted right now.
    pub fn can_print(&self) -> bool {
        self.pending.is_none() && matches!(self.state, PrinterState::Connected(_))
    }
}

// =============================================================================
// Event Emitter Trait
// =============================================================================

/// Receives every transition and every error (implemented by the UI).
pub trait PrinterEventEmitter: Send + Sync {
    /// Emits the state after a transition.
    fn emit_state(&self, snapshot: &ConnectionSnapshot);

    /// Emits an error, including ones `disconnect` swallows.
    fn emit_error(&self, error: &PrinterError);
}

/// No-op event emitter.
pub struct NoOpEmitter;

impl PrinterEventEmitter for NoOpEmitter {
    fn emit_state(&self, _snapshot: &ConnectionSnapshot) {}
    fn emit_error(&self, _error: &PrinterError) {}
}

// =============================================================================
// Machine
// =============================================================================

struct Machine {
    state: PrinterState,
    pending: Option<PendingOperation>,
    known_devices: Vec<DeviceDescriptor>,
    last_error: Option<String>,
}

impl Machine {
    fn snapshot(&self) -> ConnectionSnapshot {
        ConnectionSnapshot {
            state: self.state.clone(),
            pending: self.pending.clone(),
            known_devices: self.known_devices.clone(),
            last_error: self.last_error.clone(),
        }
    }

    /// Human description used in `InvalidState`.
    fn describe(&self) -> String {
        match &self.pending {
            Some(pending) => pending.to_string(),
            None => self.state.to_string(),
        }
    }
}

// =============================================================================
// Printer Manager
// =============================================================================

/// Owns the connection state and the transport. One per session; share it
/// through an `Arc`.
pub struct PrinterManager<T, G> {
    transport: T,
    gate: G,
    machine: Mutex<Machine>,
    emitter: Arc<dyn PrinterEventEmitter>,
}

impl<T: PrinterTransport, G: PermissionGate> PrinterManager<T, G> {
    /// Creates a manager in `Disconnected` with no known devices.
    pub fn new(transport: T, gate: G) -> Self {
        Self::with_emitter(transport, gate, Arc::new(NoOpEmitter))
    }

    /// Creates a manager with a custom event emitter.
    pub fn with_emitter(transport: T, gate: G, emitter: Arc<dyn PrinterEventEmitter>) -> Self {
        PrinterManager {
            transport,
            gate,
            machine: Mutex::new(Machine {
                state: PrinterState::Disconnected,
                pending: None,
                known_devices: Vec::new(),
                last_error: None,
            }),
            emitter,
        }
    }

    /// The transport this manager drives.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub async fn snapshot(&self) -> ConnectionSnapshot {
        self.machine.lock().await.snapshot()
    }

    pub async fn state(&self) -> PrinterState {
        self.machine.lock().await.state.clone()
    }

    /// Devices found by the last successful scan.
    pub async fn known_devices(&self) -> Vec<DeviceDescriptor> {
        self.machine.lock().await.known_devices.clone()
    }

    pub async fn bound_device(&self) -> Option<DeviceId> {
        self.machine.lock().await.state.device_id().cloned()
    }

    pub async fn can_print(&self) -> bool {
        self.machine.lock().await.snapshot().can_print()
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Looks for printers.
    ///
    /// Allowed only from `Disconnected`. On success the known device list is
    /// replaced (an empty result is a success). On failure the previous list
    /// is kept.
    pub async fn scan(&self) -> PrinterResult<Vec<DeviceDescriptor>> {
        {
            let mut m = self.machine.lock().await;
            if m.pending.is_some() || m.state != PrinterState::Disconnected {
                return Err(self.invalid(&mut m, "scan"));
            }
            m.state = PrinterState::Scanning;
            self.emitter.emit_state(&m.snapshot());
        }
        debug!("Printer scan started");

        if !self.gate.check().await.is_granted() {
            let mut m = self.machine.lock().await;
            m.state = PrinterState::Disconnected;
            warn!("Printer scan refused: permission denied");
            return Err(self.fail(&mut m, PrinterError::PermissionDenied));
        }

        let result = match self.transport.initialize().await {
            Ok(()) => self.transport.list_devices().await,
            Err(e) => Err(e),
        };

        let mut m = self.machine.lock().await;
        m.state = PrinterState::Disconnected;
        match result {
            Ok(devices) => {
                info!(count = devices.len(), "Printer scan complete");
                m.known_devices = devices.clone();
                m.last_error = None;
                self.emitter.emit_state(&m.snapshot());
                Ok(devices)
            }
            Err(e) => {
                warn!(error = %e, "Printer scan failed");
                Err(self.fail(&mut m, PrinterError::ScanFailed(e)))
            }
        }
    }

    /// Binds to a device from the last scan.
    ///
    /// While the transport call is in flight the state stays `Disconnected`
    /// with a pending marker, so `print` is refused with `NotConnected`.
    pub async fn connect(&self, device_id: &DeviceId) -> PrinterResult<()> {
        {
            let mut m = self.machine.lock().await;
            if m.pending.is_some() || m.state != PrinterState::Disconnected {
                return Err(self.invalid(&mut m, "connect"));
            }
            if !m.known_devices.iter().any(|d| &d.device_id == device_id) {
                let error = PrinterError::ConnectFailed {
                    device_id: device_id.clone(),
                    source: TransportError::DeviceUnavailable(
                        "not found by the last scan".to_string(),
                    ),
                };
                return Err(self.fail(&mut m, error));
            }
            m.pending = Some(PendingOperation::Connecting(device_id.clone()));
            self.emitter.emit_state(&m.snapshot());
        }
        info!(device_id = %device_id, "Connecting to printer");

        let result = self.transport.connect(device_id).await;

        let mut m = self.machine.lock().await;
        m.pending = None;
        match result {
            Ok(()) => {
                info!(device_id = %device_id, "Printer connected");
                m.state = PrinterState::Connected(device_id.clone());
                m.last_error = None;
                self.emitter.emit_state(&m.snapshot());
                Ok(())
            }
            Err(source) => {
                warn!(device_id = %device_id, error = %source, "Printer connect failed");
                let error = PrinterError::ConnectFailed {
                    device_id: device_id.clone(),
                    source,
                };
                Err(self.fail(&mut m, error))
            }
        }
    }

    /// Releases the bound printer.
    ///
    /// Always ends in `Disconnected`. A transport failure is logged and sent
    /// to the emitter as `DisconnectFailed`, but the call still succeeds.
    /// Calling it while already disconnected is a no-op.
    pub async fn disconnect(&self) -> PrinterResult<()> {
        let device_id = {
            let mut m = self.machine.lock().await;
            if m.pending.is_some() {
                return Err(self.invalid(&mut m, "disconnect"));
            }
            match m.state.clone() {
                PrinterState::Disconnected => {
                    debug!("Disconnect requested while already disconnected");
                    return Ok(());
                }
                PrinterState::Connected(id) => {
                    m.pending = Some(PendingOperation::Disconnecting(id.clone()));
                    self.emitter.emit_state(&m.snapshot());
                    id
                }
                PrinterState::Scanning | PrinterState::Busy(_) => {
                    return Err(self.invalid(&mut m, "disconnect"));
                }
            }
        };

        let result = self.transport.disconnect().await;

        let mut m = self.machine.lock().await;
        m.pending = None;
        m.state = PrinterState::Disconnected;
        match result {
            Ok(()) => {
                info!(device_id = %device_id, "Printer disconnected");
                m.last_error = None;
            }
            Err(source) => {
                warn!(device_id = %device_id, error = %source, "Printer disconnect reported an error");
                let error = PrinterError::DisconnectFailed { device_id, source };
                m.last_error = Some(error.to_string());
                self.emitter.emit_error(&error);
            }
        }
        self.emitter.emit_state(&m.snapshot());
        Ok(())
    }

    /// Sends receipt text to the bound printer.
    ///
    /// Allowed only from `Connected` with nothing pending. The state is
    /// `Busy` for the duration of the send and returns to `Connected`
    /// whether or not the send succeeds.
    pub async fn print(&self, text: &str) -> PrinterResult<()> {
        let device_id = {
            let mut m = self.machine.lock().await;
            let id = match (&m.pending, &m.state) {
                (None, PrinterState::Connected(id)) => id.clone(),
                _ => {
                    debug!(state = %m.describe(), "Print refused");
                    return Err(self.fail(&mut m, PrinterError::NotConnected));
                }
            };
            m.state = PrinterState::Busy(id.clone());
            self.emitter.emit_state(&m.snapshot());
            id
        };
        debug!(device_id = %device_id, bytes = text.len(), "Printing");

        let result = self.transport.send_text(text).await;

        let mut m = self.machine.lock().await;
        m.state = PrinterState::Connected(device_id.clone());
        match result {
            Ok(()) => {
                info!(device_id = %device_id, bytes = text.len(), "Receipt printed");
                m.last_error = None;
                self.emitter.emit_state(&m.snapshot());
                Ok(())
            }
            Err(e) => {
                warn!(device_id = %device_id, error = %e, "Print failed");
                Err(self.fail(&mut m, PrinterError::PrintFailed(e)))
            }
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn invalid(&self, m: &mut MutexGuard<'_, Machine>, operation: &'static str) -> PrinterError {
        let error = PrinterError::InvalidState {
            operation,
            state: m.describe(),
        };
        debug!(%error, "Rejected printer operation");
        self.emitter.emit_error(&error);
        error
    }

    /// Records the error, emits it along with the current state, and hands
    /// it back for returning.
    fn fail(&self, m: &mut MutexGuard<'_, Machine>, error: PrinterError) -> PrinterError {
        m.last_error = Some(error.to_string());
        self.emitter.emit_error(&error);
        self.emitter.emit_state(&m.snapshot());
        error
    }
}

// =============================================================================
// Tests
// =============================================================================
