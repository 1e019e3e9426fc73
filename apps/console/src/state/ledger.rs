//! # Ledger State
//!
//! The order being rung up in this session.
//!
//! ## Thread Safety
//! The ledger is wrapped in `Arc<Mutex<T>>` so a command can mutate it and
//! read back a snapshot while the printer side holds its own clone of the
//! state handle. Writes are last-write-wins.
//!
//! ## Ledger Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Ledger State Operations                              │
//! │                                                                         │
//! │  Operator Types           Command                 Ledger Change         │
//! │  ──────────────           ───────                 ─────────────         │
//! │                                                                         │
//! │  add Royal ──────────────► add() ───────────────► add_named_item()     │
//! │                                                                         │
//! │  price 1 45 ─────────────► set_price() ─────────► update_item(Price)   │
//! │                                                                         │
//! │  qty 1 3 ────────────────► set_quantity() ──────► update_item(Qty)     │
//! │                                                                         │
//! │  remove 2 ───────────────► remove() ────────────► remove_item()        │
//! │                                                                         │
//! │  clear ──────────────────► clear() ─────────────► clear_all()          │
//! │                                                                         │
//! │  NOTE: every mutating command re-renders the table from a fresh read.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::{Arc, Mutex, PoisonError};

use tally_core::{ItemId, Ledger};

use crate::error::ApiError;

/// Shared handle to the session ledger.
#[derive(Debug, Clone, Default)]
pub struct LedgerState {
    ledger: Arc<Mutex<Ledger>>,
}

impl LedgerState {
    pub fn new(ledger: Ledger) -> Self {
        LedgerState {
            ledger: Arc::new(Mutex::new(ledger)),
        }
    }

    /// Seeds a ledger with one blank row per name.
    pub fn seeded<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Ledger::with_names(names))
    }

    /// Executes a function with read access to the ledger.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let total = ledger_state.with_ledger(|ledger| ledger.grand_total());
    /// ```
    pub fn with_ledger<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Ledger) -> R,
    {
        // Poisoning is ignored; every ledger mutation leaves its row consistent.
        let ledger = self.ledger.lock().unwrap_or_else(PoisonError::into_inner);
        f(&ledger)
    }

    /// Executes a function with write access to the ledger.
    pub fn with_ledger_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Ledger) -> R,
    {
        let mut ledger = self.ledger.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut ledger)
    }

    /// Resolves a 1-based row number (as shown on screen) to an item id.
    pub fn id_at_row(&self, row: &str) -> Result<ItemId, ApiError> {
        self.with_ledger(|ledger| {
            let index = tally_core::validation::parse_row(row, ledger.len())?;
            Ok(ledger.items()[index].id())
        })
    }
}
