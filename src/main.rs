//! Bank Simulation CLI
//!
//! Command-line interface for the bank simulation and its credit-card
//! billing engine. Each invocation runs one operation against the JSON data
//! files of the data directory.
//!
//! # Usage
//!
//! ```bash
//! bank-sim open ana
//! bank-sim deposit ana 500
//! bank-sim card purchase ana 1000 --installments 10 --description laptop
//! bank-sim card statement ana
//! bank-sim card pay ana 108
//! bank-sim loan take ana 1000 --installments 12
//! bank-sim invest new ana cdb 250
//! bank-sim stats
//! bank-sim --data-dir /var/bank export-accounts > accounts.csv
//! RUST_LOG=debug bank-sim --log-format json card payoff ana
//! ```
//!
//! Logs go to stderr (filter with `RUST_LOG`, default `info`), so stdout
//! carries only command output and CSV.
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (invalid input, business rule violation, unreadable data, etc.)

use rust_bank_billing::cli;
use rust_bank_billing::{Bank, LogFormat, SystemClock};
use std::process;
use tracing_subscriber::EnvFilter;

fn init_logging(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn main() {
    let args = cli::parse_args();
    let config = args.to_config();
    init_logging(config.log_format);

    let mut bank = Bank::open(&config, SystemClock);

    let mut output = std::io::stdout();
    if let Err(e) = cli::execute(&mut bank, args.command, &mut output) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
