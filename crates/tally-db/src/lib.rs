//! # tally-db: Database Layer for Tally POS
//!
//! SQLite storage for the checkout: catalog lookups and the stock
//! reservation transaction.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tally Checkout Data Flow                         │
//! │                                                                         │
//! │  CheckoutService::submit (tally-checkout)                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     tally-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐ │   │
//! │  │   │   Database    │    │  Repositories  │    │  Migrations  │ │   │
//! │  │   │   (pool.rs)   │    │                │    │  (embedded)  │ │   │
//! │  │   │               │◄───│ ProductRepo    │    │ 001_initial  │ │   │
//! │  │   │ SqlitePool    │    │ PromotionRepo  │    │              │ │   │
//! │  │   │ busy_timeout  │    │ InventoryRepo  │    │              │ │   │
//! │  │   └───────────────┘    └────────────────┘    └──────────────┘ │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (TALLY_DB_PATH)                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Product, promotion and inventory repositories
//! - [`fixtures`] - Demo catalog used by the seed binary and tests
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tally_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./tally.db")).await?;
//!
//! let products = db.products().by_serials(&["43N23P".into()]).await?;
//! let committed = db.inventory().commit_checkout(checkout).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod fixtures;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::inventory::InventoryRepository;
pub use repository::product::ProductRepository;
pub use repository::promotion::{NewPromotion, PromotionRepository};
