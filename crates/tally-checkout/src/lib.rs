//! # tally-checkout: Checkout Orchestration for Tally POS
//!
//! Ties the pure checkout math of `tally-core` to the catalog and stock
//! ledger, and classifies every failure.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  transport / CLI                                                       │
//! │       │  ScannedItems                                                  │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 tally-checkout (THIS CRATE)                     │   │
//! │  │   CheckoutService::submit ──► aggregator ──► StockLedger        │   │
//! │  │   catalog traits · CheckoutError · config · tracing             │   │
//! │  └──────────────┬──────────────────────────────────┬───────────────┘   │
//! │                 ▼                                  ▼                    │
//! │        tally-core (pure)                  tally-db (SQLite)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,ignore
//! use tally_checkout::{CheckoutReceipt, CheckoutService};
//! use tally_core::ScannedItems;
//! use tally_db::{Database, DbConfig};
//!
//! let service = CheckoutService::new(Database::new(DbConfig::new("./tally.db")).await?);
//! let checkout = service.submit(&ScannedItems::from_scans(["43N23P"])).await?;
//! println!("{}", serde_json::to_string(&CheckoutReceipt::from(&checkout))?);
//! ```

pub mod aggregator;
pub mod catalog;
pub mod config;
pub mod error;
pub mod receipt;
pub mod service;
pub mod telemetry;

pub use catalog::{ProductCatalog, PromotionCatalog, StockLedger};
pub use config::{CheckoutConfig, ConfigError};
pub use error::{CheckoutError, CheckoutResult, ErrorKind, ErrorResponse};
pub use receipt::{CheckoutReceipt, ReceiptLine};
pub use service::CheckoutService;
