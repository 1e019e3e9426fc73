//! # Tally Console Entry Point
//!
//! ## Startup Sequence
//! 1. Initialize tracing (logging to stderr)
//! 2. Load `tally.toml` and `TALLY_*` overrides
//! 3. Apply command-line overrides
//! 4. Create state (seeded ledger, printer manager)
//! 5. Run the shell on stdin/stdout

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tally_console_lib::config::AppConfig;
use tally_console_lib::state::AppState;
use tally_printer::TransportKind;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about = "Order ledger and receipt printing for the counter")]
struct Cli {
    /// Path to tally.toml (defaults to the platform config directory)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Override the printer transport (rfcomm or spool)
    #[arg(long, value_name = "KIND")]
    transport: Option<TransportKind>,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    tally_console_lib::init_tracing();
    let cli = Cli::parse();

    let mut config = match AppConfig::load_from_flag(cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Failed to load configuration");
            eprintln!("tally: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Some(transport) = cli.transport {
        info!(%transport, "Overriding transport from command line");
        config.printer.transport = transport;
        if let Err(e) = config.validate() {
            eprintln!("tally: {}", e);
            return ExitCode::FAILURE;
        }
    }

    if cli.print_config {
        return match config.to_toml() {
            Ok(rendered) => {
                print!("{}", rendered);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("tally: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    let state = AppState::from_config(config);
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());

    match tally_console_lib::run(&state, stdin, tokio::io::stdout()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Console I/O failed");
            ExitCode::FAILURE
        }
    }
}
