//! # Error Types
//!
//! Domain-specific error types for tally-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tally-core errors (this file)                                         │
//! │  └── ValidationError  - Text input that cannot be turned into a value  │
//! │                                                                         │
//! │  tally-printer errors (separate crate)                                 │
//! │  ├── TransportError   - What the hardware link reported                │
//! │  └── PrinterError     - Connection state machine outcomes              │
//! │                                                                         │
//! │  Console errors (in app)                                               │
//! │  └── ApiError         - What the operator sees                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The ledger, calculation engine and receipt formatter never fail: numeric
//! inputs are clamped and names are truncated. Only *parsing* text can fail,
//! and that is all this module covers.

use thiserror::Error;

/// Input validation errors.
///
/// Produced when operator-typed text does not parse into a price, a
/// quantity or a row number.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Invalid format (e.g. letters where digits are expected).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// The number does not fit the value range.
    #[error("{field} is too large")]
    OutOfRange { field: String },

    /// A 1-based row number outside the current ledger.
    #[error("row {row} does not exist (ledger has {len} rows)")]
    NoSuchRow { row: usize, len: usize },
}

impl ValidationError {
    /// Returns a copy of this error reported against a different field name.
    pub(crate) fn for_field(self, name: &str) -> Self {
        match self {
            ValidationError::Required { .. } => ValidationError::Required {
                field: name.to_string(),
            },
            ValidationError::InvalidFormat { reason, .. } => ValidationError::InvalidFormat {
                field: name.to_string(),
                reason,
            },
            ValidationError::OutOfRange { .. } => ValidationError::OutOfRange {
                field: name.to_string(),
            },
            other => other,
        }
    }
}

/// Convenience type alias for validation results.
pub type ValidationResult<T> = Result<T, ValidationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "price".to_string(),
        };
        assert_eq!(err.to_string(), "price is required");

        let err = ValidationError::NoSuchRow { row: 7, len: 3 };
        assert_eq!(err.to_string(), "row 7 does not exist (ledger has 3 rows)");
    }

    #[test]
    fn test_for_field_renames() {
        let err = ValidationError::InvalidFormat {
            field: "amount".to_string(),
            reason: "bad".to_string(),
        }
        .for_field("price");
        assert_eq!(err.to_string(), "price has invalid format: bad");

        let row = ValidationError::NoSuchRow { row: 1, len: 0 }.for_field("price");
        assert_eq!(row, ValidationError::NoSuchRow { row: 1, len: 0 });
    }
}
