//! # Printer Error Types
//!
//! Error types for printer transports and the connection state machine.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Printer Error Categories                           │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────────┐  ┌─────────────────────┐ │
//! │  │   Transport     │  │   State Machine     │  │   Settings          │ │
//! │  │ (what the link  │  │ (what the caller    │  │ (config values)     │ │
//! │  │  reported)      │  │  gets back)         │  │                     │ │
//! │  │                 │  │                     │  │                     │ │
//! │  │  NotReady       │  │  PermissionDenied   │  │  UnknownTransport   │ │
//! │  │  DeviceUnavail. │  │  ScanFailed         │  │  UnknownPermission  │ │
//! │  │  Io             │──►  ConnectFailed      │  │  Invalid            │ │
//! │  │  Rejected       │  │  DisconnectFailed   │  │                     │ │
//! │  │                 │  │  NotConnected       │  │                     │ │
//! │  │                 │  │  InvalidState       │  │                     │ │
//! │  │                 │  │  PrintFailed        │  │                     │ │
//! │  └─────────────────┘  └─────────────────────┘  └─────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every error is recoverable: the state machine is back in a stable state
//! by the time an error is returned.

use thiserror::Error;

use crate::transport::DeviceId;

/// Result type alias for state machine operations.
pub type PrinterResult<T> = Result<T, PrinterError>;

/// Result type alias for transport calls.
pub type TransportResult<T> = Result<T, TransportError>;

// =============================================================================
// Transport Errors
// =============================================================================

/// Failure reported by a transport collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The radio or driver is not available (Bluetooth off, module not loaded).
    #[error("printer link not ready: {0}")]
    NotReady(String),

    /// The device is out of range, unbound, or no longer exists.
    #[error("device unavailable: {0}")]
    DeviceUnavailable(String),

    /// Read or write failed mid-operation.
    #[error("I/O error: {0}")]
    Io(String),

    /// The OS or the device refused the operation.
    #[error("rejected: {0}")]
    Rejected(String),
}

impl TransportError {
    /// Returns true if trying again later could succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, TransportError::Rejected(_))
    }
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        use std::io::ErrorKind;
        match err.kind() {
            ErrorKind::NotFound => TransportError::DeviceUnavailable(err.to_string()),
            ErrorKind::PermissionDenied => TransportError::Rejected(err.to_string()),
            _ => TransportError::Io(err.to_string()),
        }
    }
}

// =============================================================================
// State Machine Errors
// =============================================================================

/// Outcome of a rejected or failed printer operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrinterError {
    /// The permission gate said no. The transport was not touched.
    #[error("permission to use Bluetooth was denied")]
    PermissionDenied,

    /// Initializing the link or listing devices failed.
    #[error("scan failed: {0}")]
    ScanFailed(#[source] TransportError),

    /// Binding to the device failed, or the id was not in the last scan.
    #[error("could not connect to {device_id}: {source}")]
    ConnectFailed {
        device_id: DeviceId,
        #[source]
        source: TransportError,
    },

    /// Unbinding failed. Reported to the event emitter only; `disconnect`
    /// itself still succeeds.
    #[error("disconnect from {device_id} reported an error: {source}")]
    DisconnectFailed {
        device_id: DeviceId,
        #[source]
        source: TransportError,
    },

    /// Print requested without an idle, bound printer.
    #[error("no printer is connected")]
    NotConnected,

    /// The operation is not allowed in the current state.
    #[error("cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: String,
    },

    /// The transport failed while sending. The connection is kept.
    #[error("print failed: {0}")]
    PrintFailed(#[source] TransportError),
}

impl PrinterError {
    /// Returns true if the same call could succeed if simply repeated.
    ///
    /// ## Retryable Errors
    /// - Scan, connect and print failures caused by a flaky link
    ///
    /// ## Non-Retryable Errors
    /// - Permission denied (the operator must grant access first)
    /// - Not connected / invalid state (a different call is needed first)
    pub fn is_retryable(&self) -> bool {
        match self {
            PrinterError::ScanFailed(source)
            | PrinterError::ConnectFailed { source, .. }
            | PrinterError::PrintFailed(source) => source.is_retryable(),
            PrinterError::DisconnectFailed { .. } => true,
            PrinterError::PermissionDenied
            | PrinterError::NotConnected
            | PrinterError::InvalidState { .. } => false,
        }
    }
}

// =============================================================================
// Settings Errors
// =============================================================================

/// Invalid `[printer]` configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("unknown transport '{0}'. Valid options: rfcomm, spool")]
    UnknownTransport(String),

    #[error("unknown permission policy '{0}'. Valid options: auto, granted, denied")]
    UnknownPermission(String),

    #[error("invalid printer settings: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(PrinterError::ScanFailed(TransportError::NotReady("off".into())).is_retryable());
        assert!(PrinterError::PrintFailed(TransportError::Io("broken pipe".into())).is_retryable());

        assert!(!PrinterError::PermissionDenied.is_retryable());
        assert!(!PrinterError::NotConnected.is_retryable());
        assert!(!PrinterError::ConnectFailed {
            device_id: DeviceId::from("AA:BB:CC:DD:EE:FF"),
            source: TransportError::Rejected("pairing refused".into()),
        }
        .is_retryable());
    }

    #[test]
    fn test_error_display() {
        let err = PrinterError::InvalidState {
            operation: "scan",
            state: "busy printing on AA:BB:CC:DD:EE:FF".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "cannot scan while busy printing on AA:BB:CC:DD:EE:FF"
        );

        let err = PrinterError::ConnectFailed {
            device_id: DeviceId::from("AA:BB:CC:DD:EE:FF"),
            source: TransportError::DeviceUnavailable("out of range".into()),
        };
        assert!(err.to_string().contains("AA:BB:CC:DD:EE:FF"));
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn test_io_error_mapping() {
        use std::io::{Error, ErrorKind};

        assert!(matches!(
            TransportError::from(Error::new(ErrorKind::NotFound, "gone")),
            TransportError::DeviceUnavailable(_)
        ));
        assert!(matches!(
            TransportError::from(Error::new(ErrorKind::PermissionDenied, "no")),
            TransportError::Rejected(_)
        ));
        assert!(matches!(
            TransportError::from(Error::new(ErrorKind::BrokenPipe, "pipe")),
            TransportError::Io(_)
        ));
    }
}
