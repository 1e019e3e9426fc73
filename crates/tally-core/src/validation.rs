//! # Validation Module
//!
//! Turns operator-typed text into ledger values.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Console (apps/console)                                       │
//! │  └── Splits the command line, calls THIS MODULE                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Rejects text that is not a number at all                          │
//! │  └── Strips control characters from display names                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Ledger                                                       │
//! │  └── Clamps negative prices / quantities to zero (never fails)         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A negative number is *valid input* here; it is the ledger's job to clamp
//! it. Only text that is not a number is rejected.

use crate::error::{ValidationError, ValidationResult};
use crate::money::Money;

/// Parses a unit price.
///
/// ```rust
/// use tally_core::validation::parse_price;
///
/// assert_eq!(parse_price("45").unwrap().cents(), 4500);
/// assert!(parse_price("forty").is_err());
/// ```
pub fn parse_price(input: &str) -> ValidationResult<Money> {
    Money::parse(input).map_err(|e| e.for_field("price"))
}

/// Parses a case quantity as a whole number.
///
/// A decimal fraction is dropped (`3.5` is 3 cases), as a cash register
/// keypad would. Anything else that is not digits is rejected.
///
/// ```rust
/// use tally_core::validation::parse_quantity;
///
/// assert_eq!(parse_quantity(" 3 ").unwrap(), 3);
/// assert_eq!(parse_quantity("-2").unwrap(), -2); // clamped later by the ledger
/// assert_eq!(parse_quantity("2.5").unwrap(), 2);
/// assert!(parse_quantity("2.5.1").is_err());
/// ```
pub fn parse_quantity(input: &str) -> ValidationResult<i64> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Required {
            field: "quantity".to_string(),
        });
    }

    let (whole, fraction) = trimmed.split_once('.').unwrap_or((trimmed, ""));
    let unsigned = whole
        .strip_prefix('-')
        .or_else(|| whole.strip_prefix('+'))
        .unwrap_or(whole);
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if unsigned.is_empty() || !all_digits(unsigned) || !all_digits(fraction) {
        return Err(ValidationError::InvalidFormat {
            field: "quantity".to_string(),
            reason: format!("'{}' is not a number of cases", trimmed),
        });
    }

    whole.parse().map_err(|_| ValidationError::OutOfRange {
        field: "quantity".to_string(),
    })
}

/// Parses a 1-based row number as shown on screen and returns its 0-based index.
///
/// ```rust
/// use tally_core::validation::parse_row;
///
/// assert_eq!(parse_row("1", 3).unwrap(), 0);
/// assert!(parse_row("4", 3).is_err());
/// assert!(parse_row("0", 3).is_err());
/// ```
pub fn parse_row(input: &str, len: usize) -> ValidationResult<usize> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Required {
            field: "row".to_string(),
        });
    }

    let row: usize = trimmed.parse().map_err(|_| ValidationError::InvalidFormat {
        field: "row".to_string(),
        reason: format!("'{}' is not a row number", trimmed),
    })?;

    if row == 0 || row > len {
        return Err(ValidationError::NoSuchRow { row, len });
    }

    Ok(row - 1)
}

/// Cleans a display name before it enters the ledger.
///
/// Control characters (tabs, newlines, escape sequences) would break the
/// fixed-width receipt, so they become spaces. Surrounding whitespace is
/// trimmed. An empty result is allowed.
///
/// ```rust
/// use tally_core::validation::sanitize_display_name;
///
/// assert_eq!(sanitize_display_name("  Coke\t1.5L\n"), "Coke 1.5L");
/// ```
pub fn sanitize_display_name(input: &str) -> String {
    input
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect::<String>()
        .trim()
        .to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_price_reports_price_field() {
        let err = parse_price("abc").unwrap_err();
        assert!(err.to_string().starts_with("price has invalid format"));

        let err = parse_price("   ").unwrap_err();
        assert_eq!(err.to_string(), "price is required");
    }

    #[test]
    fn test_parse_price_keeps_negative_for_ledger_to_clamp() {
        assert_eq!(parse_price("-10").unwrap().cents(), -1000);
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("3").unwrap(), 3);
        assert_eq!(parse_quantity("+4").unwrap(), 4);
        assert_eq!(parse_quantity("-1").unwrap(), -1);
        assert_eq!(parse_quantity("3.5").unwrap(), 3);
        assert_eq!(parse_quantity("7.").unwrap(), 7);
        assert_eq!(parse_quantity("-2.9").unwrap(), -2);
        assert!(matches!(
            parse_quantity(".5"),
            Err(ValidationError::InvalidFormat { .. })
        ));
        assert!(matches!(
            parse_quantity("3.x"),
            Err(ValidationError::InvalidFormat { .. })
        ));
        assert!(matches!(
            parse_quantity("x"),
            Err(ValidationError::InvalidFormat { .. })
        ));
        assert!(matches!(
            parse_quantity("-"),
            Err(ValidationError::InvalidFormat { .. })
        ));
        assert!(matches!(
            parse_quantity(""),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            parse_quantity("99999999999999999999"),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_parse_row_bounds() {
        assert_eq!(parse_row("3", 3).unwrap(), 2);
        assert_eq!(
            parse_row("5", 3),
            Err(ValidationError::NoSuchRow { row: 5, len: 3 })
        );
        assert!(matches!(
            parse_row("two", 3),
            Err(ValidationError::InvalidFormat { .. })
        ));
        assert!(parse_row("1", 0).is_err());
    }

    #[test]
    fn test_sanitize_display_name() {
        assert_eq!(sanitize_display_name("Sprite"), "Sprite");
        assert_eq!(sanitize_display_name("a\u{1b}[31mb"), "a [31mb");
        assert_eq!(sanitize_display_name("\n\t"), "");
        assert_eq!(sanitize_display_name("Ñandú"), "Ñandú");
    }
}
