//! # Tally Console Library
//!
//! The interactive shell around the ledger and the printer.
//!
//! ## Module Organization
//! ```text
//! tally_console_lib/
//! ├── lib.rs          ◄─── You are here (logging, shell loop)
//! ├── config.rs       ◄─── tally.toml + TALLY_* overrides
//! ├── state/
//! │   ├── mod.rs      ◄─── AppState
//! │   ├── ledger.rs   ◄─── Ledger state (Arc<Mutex>)
//! │   └── connection.rs ◄─ Printer manager + event emitter
//! ├── commands/
//! │   ├── mod.rs      ◄─── Command parsing and dispatch
//! │   ├── ledger.rs   ◄─── list/add/remove/name/price/qty/...
//! │   └── printer.rs  ◄─── scan/connect/print/...
//! └── error.rs        ◄─── ApiError and ConfigError
//! ```
//!
//! Logs go to stderr so they never interleave with the tables and receipts
//! written to stdout.

pub mod commands;
pub mod config;
pub mod error;
pub mod state;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use commands::{Command, Outcome};
use state::AppState;

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=tally_printer=trace` - Trace the printer crate only
/// - Default: `info`, with `debug` for the tally crates
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("info,tally_core=debug,tally_printer=debug,tally_console_lib=debug")
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Runs the shell until `quit` or end of input.
///
/// ## Loop
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                                                                         │
/// │  prompt ──► read line ──► Command::parse ──► execute ──► write output  │
/// │    ▲                           │                │                       │
/// │    │                           └── ApiError ────┴──► write error        │
/// │    └────────────────────────────────────────────────────────┘           │
/// │                                                                         │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub async fn run<R, W>(state: &AppState, input: R, mut output: W) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    info!(
        rows = state.config.ledger.seed_items.len(),
        transport = %state.config.printer.transport,
        "Tally console ready"
    );

    let banner = format!(
        "{}\nType `help` for commands.\n\n{}\n",
        state.config.store.name,
        commands::ledger::list(&state.ledger, &state.formatter.layout().currency)
    );
    output.write_all(banner.as_bytes()).await?;

    let mut lines = input.lines();
    loop {
        output.write_all(b"tally> ").await?;
        output.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        let result = match Command::parse(&line) {
            Ok(Some(command)) => commands::execute(state, command).await,
            Ok(None) => continue,
            Err(e) => Err(e),
        };

        let text = match result {
            Ok(Outcome::Continue(text)) => text,
            Ok(Outcome::Quit) => break,
            Err(e) => {
                warn!(code = e.code.as_str(), "Command failed");
                e.to_string()
            }
        };
        output.write_all(text.as_bytes()).await?;
        output.write_all(b"\n").await?;
    }

    output.write_all(b"bye\n").await?;
    output.flush().await?;
    info!("Tally console closed");
    Ok(())
}
