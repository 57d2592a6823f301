//! # tally-checkout
//!
//! Submits one checkout for the serials given on the command line and prints
//! the result as JSON.
//!
//! ## Usage
//! ```bash
//! # Two MacBooks and a Raspberry Pi
//! cargo run -p tally-checkout -- 43N23P 43N23P 234234
//!
//! # Against another database
//! TALLY_DB_PATH=./data/tally.db cargo run -p tally-checkout -- 120P90
//! ```
//!
//! ## Exit Codes
//! - `0` checkout committed, receipt on stdout
//! - `1` checkout rejected, error body on stdout
//! - `2` startup failed (configuration or database)

use std::env;
use std::process::ExitCode;

use tally_checkout::telemetry::init_tracing;
use tally_checkout::{CheckoutConfig, CheckoutReceipt, CheckoutService};
use tally_core::ScannedItems;
use tally_db::Database;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let serials: Vec<String> = env::args().skip(1).collect();
    if serials.iter().any(|arg| arg == "--help" || arg == "-h") {
        print_help();
        return ExitCode::SUCCESS;
    }

    init_tracing();

    let config = match CheckoutConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return ExitCode::from(2);
        }
    };

    let db = match Database::new(config.db_config()).await {
        Ok(db) => db,
        Err(e) => {
            error!(path = %config.db_path.display(), "Failed to open database: {}", e);
            return ExitCode::from(2);
        }
    };

    info!(path = %config.db_path.display(), "Tally checkout ready");

    let service = CheckoutService::new(db);
    let result = service.submit(&ScannedItems::from_scans(serials)).await;
    service.store().close().await;

    let (body, code) = match result {
        Ok(checkout) => (
            serde_json::to_string_pretty(&CheckoutReceipt::from(&checkout)),
            ExitCode::SUCCESS,
        ),
        Err(err) => (
            serde_json::to_string_pretty(&err.to_response()),
            ExitCode::from(1),
        ),
    };

    match body {
        Ok(json) => {
            println!("{}", json);
            code
        }
        Err(e) => {
            error!("Failed to encode result: {}", e);
            ExitCode::from(2)
        }
    }
}

fn print_help() {
    println!("Tally POS checkout");
    println!();
    println!("Usage: tally-checkout <SERIAL>...");
    println!();
    println!("Each argument is one scan; repeat a serial to buy several.");
    println!();
    println!("Environment:");
    println!("  TALLY_DB_PATH               SQLite database (default: ./tally.db)");
    println!("  TALLY_DB_MAX_CONNECTIONS    Pool size (default: 5)");
    println!("  TALLY_LOCK_WAIT_TIMEOUT_MS  Stock lock wait (default: 5000)");
    println!("  TALLY_RUN_MIGRATIONS        Apply migrations at startup (default: true)");
    println!("  RUST_LOG                    Log filter (default: {})", tally_checkout::telemetry::DEFAULT_FILTER);
}
