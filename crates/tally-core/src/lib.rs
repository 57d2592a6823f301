//! # tally-core: Pure Checkout Logic for Tally POS
//!
//! This crate is the **heart** of the checkout. It contains the promotion
//! rules engine and the checkout aggregation as pure functions with zero I/O
//! dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tally Checkout Architecture                      │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                tally-checkout (Submit orchestration)             │   │
//! │  │   validate ──► lookup products ──► lookup promotions ──► commit  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tally-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │ promotion │  │ checkout  │  │ validation│  │   │
//! │  │   │  Product  │  │  Resolver │  │  Draft    │  │  scans    │  │   │
//! │  │   │ Promotion │  │  Rules    │  │  Lines    │  │  serials  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    tally-db (Database Layer)                    │   │
//! │  │        SQLite lookups, migrations, inventory reservation         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, StockLevel, Promotion, Checkout)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`promotion`] - Promotion rules and the per-line resolver
//! - [`checkout`] - Checkout aggregation and free-unit reconciliation
//! - [`error`] - Domain error types
//! - [`validation`] - Scan input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use tally_core::money::Money;
//!
//! let price = Money::from_cents(10950); // $109.50
//! let line = price * 3;
//! let discount = line.percentage_of(10);
//!
//! assert_eq!(discount.cents(), 3285);
//! assert_eq!((line - discount).cents(), 29565);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod error;
pub mod money;
pub mod promotion;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use checkout::CheckoutDraft;
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use promotion::{resolve_line, FreeUnitGrant, LineResolution, PromotionRule};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum number of distinct serials in a single checkout.
///
/// ## Business Reason
/// Prevents runaway requests and bounds the size of the batched stock lock.
pub const MAX_CHECKOUT_LINES: usize = 100;

/// Maximum scan count of a single serial in one checkout.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., a stuck scanner).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Maximum length of a product serial.
pub const MAX_SERIAL_LEN: usize = 50;
