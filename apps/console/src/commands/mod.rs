//! # Commands Module
//!
//! One command per input line, parsed into [`Command`] and run against
//! [`AppState`].
//!
//! ## Command Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Console Commands                                 │
//! │                                                                         │
//! │  Ledger (ledger.rs)              Printer (printer.rs)                   │
//! │  ──────────────────              ────────────────────                   │
//! │  list                            scan                                   │
//! │  add [name]                      devices                                │
//! │  remove <row>                    connect <row|device-id>                │
//! │  name <row> <text>               disconnect                             │
//! │  price <row> <amount>            status                                 │
//! │  qty <row> <cases>               print                                  │
//! │  clear                                                                  │
//! │  total                           Shell                                  │
//! │  preview                         ─────                                  │
//! │  json                            help, quit                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each command only reaches into the state it needs:
//! ```rust,ignore
//! // Only needs the ledger
//! ledger::set_price(&state.ledger, currency, row, amount)
//!
//! // Only needs the printer
//! printer::scan(&state.printer).await
//!
//! // Needs both
//! printer::print(&state.ledger, &state.printer, &state.formatter, now).await
//! ```

pub mod ledger;
pub mod printer;

use chrono::{Local, NaiveDateTime};
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;

pub const HELP: &str = "\
Ledger:
  list                     Show the order
  add [name]               Add a row (default name: Item N)
  remove <row>             Remove a row (the last row cannot be removed)
  name <row> <text>        Rename a row
  price <row> <amount>     Set the price per case
  qty <row> <cases>        Set the number of cases
  clear                    Zero every price and quantity, keep the names
  total                    Show the grand total
  preview                  Show the receipt without printing
  json                     Dump the order as JSON

Printer:
  scan                     Look for printers
  devices                  List printers from the last scan
  connect <row|device-id>  Connect to a printer
  disconnect               Disconnect the printer
  status                   Show the printer connection
  print                    Print the receipt

  help                     Show this help
  quit                     Leave";

// =============================================================================
// Command
// =============================================================================

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    Add(Option<String>),
    Remove(String),
    Name { row: String, text: String },
    Price { row: String, amount: String },
    Quantity { row: String, cases: String },
    Clear,
    Total,
    Preview,
    Json,
    Print,
    Scan,
    Devices,
    Connect(String),
    Disconnect,
    Status,
    Help,
    Quit,
}

impl Command {
    /// Parses one input line. A blank line parses to `None`.
    pub fn parse(line: &str) -> Result<Option<Command>, ApiError> {
        let (verb, rest) = split_word(line);
        if verb.is_empty() {
            return Ok(None);
        }

        let command = match verb.to_lowercase().as_str() {
            "list" | "ls" => Command::List,
            "add" => Command::Add(Some(rest.to_string()).filter(|s| !s.is_empty())),
            "remove" | "rm" => Command::Remove(required(rest, "remove <row>")?.to_string()),
            "name" | "rename" => {
                let (row, text) = row_and_value(rest, "name <row> <text>")?;
                Command::Name { row, text }
            }
            "price" => {
                let (row, amount) = row_and_value(rest, "price <row> <amount>")?;
                Command::Price { row, amount }
            }
            "qty" | "quantity" | "cases" => {
                let (row, cases) = row_and_value(rest, "qty <row> <cases>")?;
                Command::Quantity { row, cases }
            }
            "clear" => Command::Clear,
            "total" => Command::Total,
            "preview" => Command::Preview,
            "json" | "snapshot" => Command::Json,
            "print" => Command::Print,
            "scan" => Command::Scan,
            "devices" => Command::Devices,
            "connect" => Command::Connect(required(rest, "connect <row|device-id>")?.to_string()),
            "disconnect" => Command::Disconnect,
            "status" => Command::Status,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            other => {
                return Err(ApiError::usage(format!(
                    "unknown command '{}'. Type `help` for the list.",
                    other
                )))
            }
        };
        Ok(Some(command))
    }
}

fn split_word(s: &str) -> (&str, &str) {
    let s = s.trim();
    match s.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (s, ""),
    }
}

fn required<'a>(value: &'a str, usage: &str) -> Result<&'a str, ApiError> {
    if value.is_empty() {
        Err(ApiError::usage(format!("usage: {}", usage)))
    } else {
        Ok(value)
    }
}

fn row_and_value(rest: &str, usage: &str) -> Result<(String, String), ApiError> {
    let (row, value) = split_word(rest);
    required(row, usage)?;
    required(value, usage)?;
    Ok((row.to_string(), value.to_string()))
}

// =============================================================================
// Execution
// =============================================================================

/// What the shell should do after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Print the text and read the next line.
    Continue(String),
    /// Leave the shell.
    Quit,
}

/// Runs a command, stamping receipts with the local time.
pub async fn execute(state: &AppState, command: Command) -> Result<Outcome, ApiError> {
    execute_at(state, command, Local::now().naive_local()).await
}

/// Runs a command with an explicit receipt timestamp.
pub async fn execute_at(
    state: &AppState,
    command: Command,
    now: NaiveDateTime,
) -> Result<Outcome, ApiError> {
    debug!(?command, "Executing command");
    let currency = &state.formatter.layout().currency;

    let text = match command {
        Command::List => ledger::list(&state.ledger, currency),
        Command::Add(name) => ledger::add(&state.ledger, currency, name.as_deref()),
        Command::Remove(row) => ledger::remove(&state.ledger, currency, &row)?,
        Command::Name { row, text } => ledger::rename(&state.ledger, currency, &row, &text)?,
        Command::Price { row, amount } => ledger::set_price(&state.ledger, currency, &row, &amount)?,
        Command::Quantity { row, cases } => {
            ledger::set_quantity(&state.ledger, currency, &row, &cases)?
        }
        Command::Clear => ledger::clear(&state.ledger, currency),
        Command::Total => ledger::total(&state.ledger, currency),
        Command::Preview => ledger::preview(&state.ledger, &state.formatter, now),
        Command::Json => ledger::snapshot_json(&state.ledger)?,
        Command::Print => printer::print(&state.ledger, &state.printer, &state.formatter, now).await?,
        Command::Scan => printer::scan(&state.printer).await?,
        Command::Devices => printer::devices(&state.printer).await,
        Command::Connect(target) => printer::connect(&state.printer, &target).await?,
        Command::Disconnect => printer::disconnect(&state.printer).await?,
        Command::Status => printer::status(&state.printer).await,
        Command::Help => HELP.to_string(),
        Command::Quit => return Ok(Outcome::Quit),
    };

    let notices = state.printer.events().take_notices();
    if notices.is_empty() {
        Ok(Outcome::Continue(text))
    } else {
        Ok(Outcome::Continue(format!("{}\n{}", text, notices.join("\n"))))
    }
}
