//! # State Module
//!
//! Session state for the console.
//!
//! Instead of one big struct with every field public, each concern gets its
//! own handle and a command only touches the handles it needs:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                      AppState                                   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                              │                                          │
//! │          ┌──────────────────┼──────────────────┐                       │
//! │          ▼                  ▼                  ▼                        │
//! │  ┌──────────────┐  ┌──────────────────┐  ┌──────────────────┐          │
//! │  │ LedgerState  │  │ ConnectionState  │  │ ReceiptFormatter │          │
//! │  │              │  │                  │  │ + AppConfig      │          │
//! │  │  Arc<Mutex<  │  │  Arc<Printer     │  │                  │          │
//! │  │    Ledger    │  │    Manager>      │  │  read-only       │          │
//! │  │  >>          │  │                  │  │                  │          │
//! │  └──────────────┘  └──────────────────┘  └──────────────────┘          │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • LedgerState: std Mutex, never held across an await                  │
//! │  • ConnectionState: the manager serializes its own transitions         │
//! │  • Formatter/config: read-only after startup                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod connection;
mod ledger;

pub use connection::{ConnectionState, ConsoleEmitter, ConsoleManager};
pub use ledger::LedgerState;

use tally_core::validation::sanitize_display_name;
use tally_core::ReceiptFormatter;

use crate::config::AppConfig;

/// Everything a command can reach.
pub struct AppState {
    pub config: AppConfig,
    pub ledger: LedgerState,
    pub printer: ConnectionState,
    pub formatter: ReceiptFormatter,
}

impl AppState {
    /// Builds the session from config: seeded ledger, configured transport.
    pub fn from_config(config: AppConfig) -> Self {
        let printer = ConnectionState::from_settings(&config.printer);
        Self::with_printer(config, printer)
    }

    /// Builds the session around an existing printer connection.
    pub fn with_printer(config: AppConfig, printer: ConnectionState) -> Self {
        AppState {
            ledger: LedgerState::seeded(
                config
                    .ledger
                    .seed_items
                    .iter()
                    .map(|name| sanitize_display_name(name)),
            ),
            formatter: ReceiptFormatter::new(config.receipt_layout()),
            printer,
            config,
        }
    }
}
