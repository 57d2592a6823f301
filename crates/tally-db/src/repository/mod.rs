//! # Repository Module
//!
//! Database repository implementations for Tally POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  tally-checkout catalog traits                                         │
//! │       │                                                                 │
//! │       │  db.products().by_serials(&serials)                            │
//! │       ▼                                                                 │
//! │  ProductRepository      by_serials, by_ids, get_by_serial, insert      │
//! │  PromotionRepository    for_products, insert, soft_delete              │
//! │  InventoryRepository    commit_checkout, stock_for, set_stock          │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each repository is a thin handle over a cloned pool; get one from
//! [`Database`](crate::Database).

pub mod inventory;
pub mod product;
pub mod promotion;
