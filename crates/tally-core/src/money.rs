//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In binary floating point:                                              │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  A ledger that keeps re-adding float line totals slowly drifts away    │
//! │  from the sum of what is printed on the receipt.                       │
//! │                                                                         │
//! │  OUR SOLUTION: Integer centavos                                         │
//! │    45.00 × 3 = 4500 × 3 = 13500 centavos = 135.00, exactly             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tally_core::money::Money;
//!
//! let price = Money::parse("45.00").unwrap();
//! let line_total = price.multiply_quantity(3);
//! assert_eq!(line_total.cents(), 13500);
//! assert_eq!(line_total.to_string(), "135.00");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul};

use crate::error::{ValidationError, ValidationResult};

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (centavos for PHP).
///
/// ## Design Decisions
/// - **i64 (signed)**: the type itself allows negatives; the ledger clamps
///   prices to zero before they are stored
/// - **Saturating arithmetic**: absurd inputs pin to the i64 range instead
///   of panicking in the middle of a keystroke
///
/// ## Where Money is Used
/// ```text
/// user text "45" ──► Money::parse ──► LineItem.unit_price
///                                          │  × quantity
///                                          ▼
///                                     LineItem.line_total ──► Σ ──► grand total
///                                          │
///                                          └──► Receipt "45.00" / "135.00"
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// let price = Money::from_cents(4550); // 45.50
    /// assert_eq!(price.cents(), 4550);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the value with negatives replaced by zero.
    ///
    /// The ledger never stores a negative price; this is the clamp it uses.
    ///
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(-550).clamp_non_negative(), Money::zero());
    /// assert_eq!(Money::from_cents(550).clamp_non_negative().cents(), 550);
    /// ```
    #[inline]
    pub const fn clamp_non_negative(self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            self
        }
    }

    /// Multiplies money by a quantity (cases).
    ///
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(4000); // 40.00
    /// assert_eq!(unit_price.multiply_quantity(2).cents(), 8000);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    /// Parses a decimal amount typed by a user.
    ///
    /// ## Accepted Input
    /// - Optional sign, digits, optional `.` and fraction: `45`, `45.5`, `-3.25`, `.75`
    /// - Comma thousands separators are ignored: `1,234.50`
    /// - Surrounding whitespace is ignored
    ///
    /// More than two fractional digits are rounded half-up at the third
    /// digit, so `0.125` becomes `0.13`.
    ///
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// assert_eq!(Money::parse("45").unwrap().cents(), 4500);
    /// assert_eq!(Money::parse("1,234.5").unwrap().cents(), 123450);
    /// assert!(Money::parse("abc").is_err());
    /// ```
    pub fn parse(input: &str) -> ValidationResult<Money> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Required {
                field: "amount".to_string(),
            });
        }

        let (negative, body) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };

        let (whole, fraction) = body.split_once('.').unwrap_or((body, ""));
        let whole: String = whole.chars().filter(|c| *c != ',').collect();

        let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if (whole.is_empty() && fraction.is_empty()) || !all_digits(&whole) || !all_digits(fraction)
        {
            return Err(ValidationError::InvalidFormat {
                field: "amount".to_string(),
                reason: format!("'{}' is not a decimal number", trimmed),
            });
        }

        let out_of_range = || ValidationError::OutOfRange {
            field: "amount".to_string(),
        };

        let major: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| out_of_range())?
        };

        let mut digits = fraction.bytes().map(|b| i64::from(b - b'0'));
        let tenths = digits.next().unwrap_or(0);
        let hundredths = digits.next().unwrap_or(0);
        let round_up = digits.next().is_some_and(|d| d >= 5);

        let mut cents = major
            .checked_mul(100)
            .and_then(|v| v.checked_add(tenths * 10 + hundredths))
            .ok_or_else(out_of_range)?;
        if round_up {
            cents = cents.checked_add(1).ok_or_else(out_of_range)?;
        }

        Ok(Money(if negative { -cents } else { cents }))
    }

    /// Formats the amount with exactly two decimals and thousands grouping.
    ///
    /// ```rust
    /// use tally_core::money::{CurrencyFormat, Money};
    ///
    /// let format = CurrencyFormat::default();
    /// assert_eq!(Money::from_cents(123456789).format_amount(&format), "1,234,567.89");
    /// assert_eq!(Money::from_cents(-550).format_amount(&format), "-5.50");
    /// ```
    pub fn format_amount(&self, format: &CurrencyFormat) -> String {
        let magnitude = self.0.unsigned_abs();
        let major = (magnitude / 100).to_string();
        let minor = magnitude % 100;

        let mut out = String::with_capacity(major.len() + major.len() / 3 + 4);
        if self.0 < 0 {
            out.push('-');
        }
        for (i, digit) in major.chars().enumerate() {
            if i > 0 && (major.len() - i) % 3 == 0 {
                out.push(format.group_separator);
            }
            out.push(digit);
        }
        out.push(format.decimal_separator);
        out.push_str(&format!("{:02}", minor));
        out
    }

    /// Formats the amount prefixed with the currency symbol (`PHP 215.00`).
    pub fn format_with_symbol(&self, format: &CurrencyFormat) -> String {
        let amount = self.format_amount(format);
        if format.symbol.is_empty() {
            amount
        } else {
            format!("{} {}", format.symbol, amount)
        }
    }
}

// =============================================================================
// Currency Format
// =============================================================================

/// How amounts are rendered on receipts.
///
/// This is the only locale knob the formatter has: nothing is read from the
/// process environment, so two terminals with the same config print the
/// same receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyFormat {
    /// Currency code or symbol shown on the grand-total line.
    #[serde(default = "default_symbol")]
    pub symbol: String,

    /// Thousands separator.
    #[serde(default = "default_group_separator")]
    pub group_separator: char,

    /// Decimal separator.
    #[serde(default = "default_decimal_separator")]
    pub decimal_separator: char,
}

fn default_symbol() -> String {
    "PHP".to_string()
}

fn default_group_separator() -> char {
    ','
}

fn default_decimal_separator() -> char {
    '.'
}

impl Default for CurrencyFormat {
    fn default() -> Self {
        CurrencyFormat {
            symbol: default_symbol(),
            group_separator: default_group_separator(),
            decimal_separator: default_decimal_separator(),
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Plain `135.00` rendering, no grouping or symbol. Receipts go through
/// [`Money::format_amount`] instead.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let magnitude = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, magnitude / 100, magnitude % 100)
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        self.multiply_quantity(qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
