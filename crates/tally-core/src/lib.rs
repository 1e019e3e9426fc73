//! # tally-core: Pure Business Logic for Tally
//!
//! The ledger, the calculation engine and the receipt formatter. Zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Tally Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Console (apps/console)                       │   │
//! │  │    list / add / price / qty ──► preview ──► print              │   │
//! │  └──────────────┬──────────────────────────────────┬───────────────┘   │
//! │                 │                                  │ receipt text      │
//! │  ┌──────────────▼──────────────────────────┐  ┌────▼──────────────┐    │
//! │  │       ★ tally-core (THIS CRATE) ★       │  │  tally-printer    │    │
//! │  │                                         │  │  state machine    │    │
//! │  │  ┌────────┐ ┌────────┐ ┌─────────────┐  │  │  transports       │    │
//! │  │  │ money  │ │ ledger │ │  receipt    │  │  └───────────────────┘    │
//! │  │  │ Money  │ │ Ledger │ │  Formatter  │  │                           │
//! │  │  └────────┘ └────────┘ └─────────────┘  │                           │
//! │  │                                         │                           │
//! │  │  NO I/O • NO CLOCK • PURE FUNCTIONS     │                           │
//! │  └─────────────────────────────────────────┘                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`ledger`] - Line item store and grand total
//! - [`receipt`] - Fixed-width receipt text
//! - [`validation`] - Parsing operator-typed text
//! - [`error`] - Input error types
//!
//! ## Example Usage
//!
//! ```rust
//! use tally_core::{ItemUpdate, Ledger, Money};
//!
//! let mut ledger = Ledger::with_names(["Coke", "Sprite"]);
//! let coke = ledger.items()[0].id();
//! let sprite = ledger.items()[1].id();
//!
//! ledger.update_item(&coke, ItemUpdate::UnitPrice(Money::from_cents(4500)));
//! ledger.update_item(&coke, ItemUpdate::Quantity(3));
//! ledger.update_item(&sprite, ItemUpdate::UnitPrice(Money::from_cents(4000)));
//! ledger.update_item(&sprite, ItemUpdate::Quantity(2));
//!
//! assert_eq!(ledger.grand_total().to_string(), "215.00");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod ledger;
pub mod money;
pub mod receipt;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{ValidationError, ValidationResult};
pub use ledger::{ItemId, ItemUpdate, Ledger, LedgerSnapshot, LedgerTotals, LineItem};
pub use money::{CurrencyFormat, Money};
pub use receipt::{format_receipt, ReceiptFormatter, ReceiptLayout};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Rows a fresh session starts with.
pub const DEFAULT_SEED_ITEMS: [&str; 3] = ["Coke", "Sprite", "Pepsi"];
