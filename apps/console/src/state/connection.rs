//! # Connection State
//!
//! Owns the printer manager for the session and collects the events it
//! emits.
//!
//! ## Event Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  PrinterManager ──emit_state──► ConsoleEmitter ──► latest snapshot      │
//! │        │                              │            (status command)     │
//! │        └────────emit_error───────────►│                                 │
//! │                                       └──► notices ──► printed after    │
//! │                                            (errors the   the command    │
//! │                                             caller never sees)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A swallowed disconnect failure is the one error `disconnect` never
//! returns, so the emitter turns it into a notice for the operator.

use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tally_printer::{
    gate_for, transport_for, ConnectionSnapshot, PermissionGate, PrinterError,
    PrinterEventEmitter, PrinterManager, PrinterSettings, PrinterTransport,
};
use tracing::{debug, warn};

use crate::error::ApiError;

/// The manager type the console runs, with transport and gate chosen at
/// runtime from config.
pub type ConsoleManager = PrinterManager<Box<dyn PrinterTransport>, Box<dyn PermissionGate>>;

// =============================================================================
// Console Emitter
// =============================================================================

/// Event emitter that keeps the latest snapshot and queues notices.
#[derive(Default)]
pub struct ConsoleEmitter {
    latest: RwLock<Option<ConnectionSnapshot>>,
    notices: Mutex<Vec<String>>,
}

impl ConsoleEmitter {
    /// The snapshot from the most recent transition, if any.
    pub fn latest(&self) -> Option<ConnectionSnapshot> {
        self.latest
            .read()
            .map(|s| s.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    /// Drains the queued notices.
    pub fn take_notices(&self) -> Vec<String> {
        let mut notices = self.notices.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *notices)
    }
}

impl PrinterEventEmitter for ConsoleEmitter {
    fn emit_state(&self, snapshot: &ConnectionSnapshot) {
        debug!(state = %snapshot.state, devices = snapshot.known_devices.len(), "Printer state changed");
        if let Ok(mut latest) = self.latest.write() {
            *latest = Some(snapshot.clone());
        }
    }

    fn emit_error(&self, error: &PrinterError) {
        warn!(%error, retryable = error.is_retryable(), "Printer error");
        if matches!(error, PrinterError::DisconnectFailed { .. }) {
            let notice = ApiError::from(error.clone()).message;
            self.notices
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(notice);
        }
    }
}

// =============================================================================
// Connection State
// =============================================================================

/// Shared handle to the session's printer connection.
#[derive(Clone)]
pub struct ConnectionState {
    manager: Arc<ConsoleManager>,
    events: Arc<ConsoleEmitter>,
}

impl ConnectionState {
    /// Builds the transport and permission gate the settings ask for.
    pub fn from_settings(settings: &PrinterSettings) -> Self {
        Self::new(transport_for(settings), gate_for(settings.permission, &settings.rfcomm))
    }

    pub fn new(transport: Box<dyn PrinterTransport>, gate: Box<dyn PermissionGate>) -> Self {
        let events = Arc::new(ConsoleEmitter::default());
        let manager = PrinterManager::with_emitter(transport, gate, events.clone());
        ConnectionState {
            manager: Arc::new(manager),
            events,
        }
    }

    pub fn manager(&self) -> &ConsoleManager {
        &self.manager
    }

    pub fn events(&self) -> &ConsoleEmitter {
        &self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_printer::transport::mock::{MockOp, MockTransport};
    use tally_printer::{DeviceId, PrinterState, StaticGate, TransportError};

    #[tokio::test]
    async fn test_emitter_tracks_latest_snapshot() {
        let state = ConnectionState::new(
            Box::new(MockTransport::with_device_ids(&["66:22:8A:1B:00:C4"])),
            Box::new(StaticGate::granted()),
        );
        assert!(state.events().latest().is_none());

        state.manager().scan().await.unwrap();
        let latest = state.events().latest().unwrap();
        assert_eq!(latest.state, PrinterState::Disconnected);
        assert_eq!(latest.known_devices.len(), 1);
    }

    #[tokio::test]
    async fn test_swallowed_disconnect_error_becomes_notice() {
        let transport = MockTransport::with_device_ids(&["66:22:8A:1B:00:C4"]);
        let state = ConnectionState::new(Box::new(transport.clone()), Box::new(StaticGate::granted()));

        state.manager().scan().await.unwrap();
        state
            .manager()
            .connect(&DeviceId::from("66:22:8A:1B:00:C4"))
            .await
            .unwrap();
        transport.fail(MockOp::Disconnect, TransportError::Io("link lost".into()));
        state.manager().disconnect().await.unwrap();

        let notices = state.events().take_notices();
        assert_eq!(notices.len(), 1);
        assert!(notices[0].contains("link lost"));
        assert!(state.events().take_notices().is_empty());
    }
}
