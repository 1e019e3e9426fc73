//! # API Error Type
//!
//! Unified error type for console commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Tally                                  │
//! │                                                                         │
//! │  Operator types          Command Function                               │
//! │  ──────────────          ────────────────                               │
//! │                                                                         │
//! │  connect 2                                                              │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Result<String, ApiError>                                        │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Bad row number? ─── ValidationError::NoSuchRow ──┐             │  │
//! │  │         │                                         │             │  │
//! │  │         ▼                                         ▼             │  │
//! │  │  Printer said no? ─── PrinterError::ConnectFailed ── ApiError ──►│  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Success ──────────────────────────────────────────────────────►│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  Shell prints:  error [CONNECT_FAILED]: Could not connect to ...        │
//! │                 Try: ...                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every printer error maps to its own code and a message written for the
//! person at the counter, including the troubleshooting hints they need.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use tally_core::ValidationError;
use tally_printer::{PrinterError, SettingsError};
use thiserror::Error;

// =============================================================================
// Config Errors
// =============================================================================

/// Failure while loading or checking `tally.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to render config: {0}")]
    Render(#[from] toml::ser::Error),

    #[error("invalid printer settings: {0}")]
    Printer(#[from] SettingsError),

    #[error("invalid receipt layout: {0}")]
    Receipt(#[from] ValidationError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Result type alias for config operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// API Error
// =============================================================================

/// Error returned from a console command.
///
/// ## Serialization
/// With `json` output this is what a script driving the console receives:
/// ```json
/// {
///   "code": "NOT_CONNECTED",
///   "message": "No printer is connected. Run `scan`, then `connect <row>`."
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,
}

/// Error codes for command responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Unknown command or wrong arguments
    UsageError,

    /// Typed value did not parse
    ValidationError,

    /// Ledger rule refused the change
    LedgerError,

    /// Nothing worth printing yet
    NothingToPrint,

    /// Bluetooth access denied
    PermissionDenied,

    /// Scan failed
    ScanFailed,

    /// Connect failed
    ConnectFailed,

    /// Disconnect reported an error
    DisconnectFailed,

    /// No idle printer bound
    NotConnected,

    /// Operation not allowed right now
    InvalidState,

    /// Sending the receipt failed
    PrintFailed,

    /// Bad configuration
    ConfigError,

    /// Internal error
    Internal,
}

impl ErrorCode {
    /// The SCREAMING_SNAKE_CASE name, as serialized.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::UsageError => "USAGE_ERROR",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::LedgerError => "LEDGER_ERROR",
            ErrorCode::NothingToPrint => "NOTHING_TO_PRINT",
            ErrorCode::PermissionDenied => "PERMISSION_DENIED",
            ErrorCode::ScanFailed => "SCAN_FAILED",
            ErrorCode::ConnectFailed => "CONNECT_FAILED",
            ErrorCode::DisconnectFailed => "DISCONNECT_FAILED",
            ErrorCode::NotConnected => "NOT_CONNECTED",
            ErrorCode::InvalidState => "INVALID_STATE",
            ErrorCode::PrintFailed => "PRINT_FAILED",
            ErrorCode::ConfigError => "CONFIG_ERROR",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a usage error.
    pub fn usage(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::UsageError, message)
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates a ledger error.
    pub fn ledger(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::LedgerError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error [{}]: {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for ApiError {}

// =============================================================================
// Conversions
// =============================================================================

const SCAN_HINTS: &str = "Make sure Bluetooth is on and the rfcomm module is loaded.";

const CONNECT_HINTS: &str = "Try:\n  1. Turning the printer off and on\n  2. Re-pairing and re-binding it (bluetoothctl, rfcomm bind)\n  3. Moving closer to the printer";

/// Converts printer errors to API errors.
impl From<PrinterError> for ApiError {
    fn from(err: PrinterError) -> Self {
        match err {
            PrinterError::PermissionDenied => ApiError::new(
                ErrorCode::PermissionDenied,
                "Bluetooth access was denied. This app needs to read the RFCOMM table and \
                 open the printer device to scan for printers.",
            ),
            PrinterError::ScanFailed(source) => ApiError::new(
                ErrorCode::ScanFailed,
                format!("Scan failed: {}\n{}", source, SCAN_HINTS),
            ),
            PrinterError::ConnectFailed { device_id, source } => ApiError::new(
                ErrorCode::ConnectFailed,
                format!(
                    "Could not connect to {}: {}\n{}",
                    device_id, source, CONNECT_HINTS
                ),
            ),
            PrinterError::DisconnectFailed { device_id, source } => ApiError::new(
                ErrorCode::DisconnectFailed,
                format!("Disconnected from {}, but the printer reported: {}", device_id, source),
            ),
            PrinterError::NotConnected => ApiError::new(
                ErrorCode::NotConnected,
                "No printer is connected. Run `scan`, then `connect <row>`.",
            ),
            PrinterError::InvalidState { operation, state } => ApiError::new(
                ErrorCode::InvalidState,
                format!("Cannot {} right now: the printer is {}.", operation, state),
            ),
            PrinterError::PrintFailed(source) => {
                tracing::error!(error = %source, "Print failed");
                ApiError::new(
                    ErrorCode::PrintFailed,
                    format!(
                        "Printing failed: {}. The printer is still connected; check the paper and try again.",
                        source
                    ),
                )
            }
        }
    }
}

/// Converts input validation errors to API errors.
impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

/// Converts config errors to API errors.
impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        ApiError::new(ErrorCode::ConfigError, err.to_string())
    }
}
