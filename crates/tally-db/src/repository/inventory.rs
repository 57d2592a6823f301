//! # Inventory Repository
//!
//! Stock levels and the checkout reservation, the only code that decrements
//! stock.
//!
//! ## Reservation Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  commit_checkout(checkout)                                              │
//! │                                                                         │
//! │  spawn task ─────────────────────────────────────────────────┐         │
//! │  │ BEGIN                                          (Started)  │         │
//! │  │ UPDATE stock_levels SET quantity = quantity               │         │
//! │  │   WHERE product_id IN (ids ascending)                     │         │
//! │  │   RETURNING id, product_id, quantity, updated_at (Locked) │         │
//! │  │      │                                                    │         │
//! │  │      ├── any line short? ── ROLLBACK ── InsufficientStock  │         │
//! │  │      │                                                    │         │
//! │  │      ▼                                      (Validated)   │         │
//! │  │ UPDATE stock_levels SET quantity = remaining (per row)     │         │
//! │  │ COMMIT                                      (Committed)   │         │
//! │  └───────────────────────────────────────────────────────────┘         │
//! │  panic in task ── transaction dropped (rolled back) ── error            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The first statement of the transaction is a write, so SQLite takes the
//! database write lock before any stock is read. A competing reservation
//! waits up to `busy_timeout` for it and then fails with
//! [`DbError::LockTimeout`].

use std::collections::BTreeMap;
use std::future::Future;

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, error, info, warn};

use crate::error::{DbError, DbResult};
use tally_core::{Checkout, CoreError, StockLevel};

/// Repository for stock levels.
#[derive(Debug, Clone)]
pub struct InventoryRepository {
    pool: SqlitePool,
}

impl InventoryRepository {
    /// Creates a new InventoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InventoryRepository { pool }
    }

    /// Atomically checks and decrements stock for every line of `checkout`.
    ///
    /// On success the same checkout is returned and every stock row has been
    /// reduced by its line quantity. On any failure no stock row changes.
    ///
    /// ## Returns
    /// * `Err(DbError::Rejected(CoreError::InsufficientStock))` - a line asks
    ///   for more than is in stock (a product without a stock row has 0)
    /// * `Err(DbError::LockTimeout)` - another reservation held the lock too long
    /// * `Err(DbError::TransactionFailed)` - the reservation task panicked
    pub async fn commit_checkout(&self, checkout: Checkout) -> DbResult<Checkout> {
        let pool = self.pool.clone();
        contain_reservation(async move { reserve(&pool, &checkout).await.map(|()| checkout) })
            .await
    }

    /// Current stock row of a product.
    pub async fn stock_for(&self, product_id: i64) -> DbResult<Option<StockLevel>> {
        let stock = sqlx::query_as::<_, StockLevel>(
            "SELECT id, product_id, quantity, updated_at FROM stock_levels WHERE product_id = ?1",
        )
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(stock)
    }

    /// Sets a product's stock, creating the row if needed.
    pub async fn set_stock(&self, product_id: i64, quantity: i64) -> DbResult<StockLevel> {
        debug!(product_id, quantity, "Setting stock level");

        let stock = sqlx::query_as::<_, StockLevel>(
            r#"
            INSERT INTO stock_levels (product_id, quantity, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT (product_id) DO UPDATE SET
                quantity = excluded.quantity,
                updated_at = excluded.updated_at
            RETURNING id, product_id, quantity, updated_at
            "#,
        )
        .bind(product_id)
        .bind(quantity)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(stock)
    }
}

/// Runs a reservation on its own task.
///
/// A panic drops the task's open transaction, which rolls it back, and is
/// reported as [`DbError::TransactionFailed`].
async fn contain_reservation<T, F>(reservation: F) -> DbResult<T>
where
    T: Send + 'static,
    F: Future<Output = DbResult<T>> + Send + 'static,
{
    match tokio::spawn(reservation).await {
        Ok(result) => result,
        Err(join_err) if join_err.is_panic() => {
            error!("Stock reservation task panicked, transaction rolled back");
            Err(DbError::TransactionFailed(
                "stock reservation aborted".to_string(),
            ))
        }
        Err(join_err) => Err(DbError::TransactionFailed(join_err.to_string())),
    }
}

/// Runs one reservation transaction, rolling back on every failure path.
async fn reserve(pool: &SqlitePool, checkout: &Checkout) -> DbResult<()> {
    let requested = requested_quantities(checkout);
    if requested.is_empty() {
        return Ok(());
    }

    let mut tx = pool.begin().await?;

    match lock_validate_and_apply(&mut *tx, checkout, &requested).await {
        Ok(()) => {
            tx.commit().await?;
            info!(
                products = requested.len(),
                items = checkout.total_items,
                "Stock reserved"
            );
            Ok(())
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                warn!(error = %rollback_err, "Rollback failed, connection will discard the transaction");
            }
            Err(err)
        }
    }
}

async fn lock_validate_and_apply(
    conn: &mut SqliteConnection,
    checkout: &Checkout,
    requested: &BTreeMap<i64, i64>,
) -> DbResult<()> {
    let locked = lock_stock_rows(conn, requested.keys().copied()).await?;

    // Validated before anything is written.
    let mut remaining = Vec::with_capacity(locked.len());
    for (&product_id, &wanted) in requested {
        let stock = locked.get(&product_id);
        let available = stock.map(|s| s.quantity).unwrap_or(0);

        if available < wanted {
            let product = checkout
                .line_for(product_id)
                .map(|line| &line.product);
            debug!(product_id, available, requested = wanted, "Insufficient stock");
            return Err(CoreError::InsufficientStock {
                product_id,
                serial: product.map(|p| p.serial.clone()).unwrap_or_default(),
                name: product.map(|p| p.name.clone()).unwrap_or_default(),
                available,
                requested: wanted,
            }
            .into());
        }

        if let Some(stock) = stock {
            remaining.push((stock.id, available - wanted));
        }
    }

    let now = Utc::now();
    for (stock_id, quantity) in remaining {
        sqlx::query("UPDATE stock_levels SET quantity = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(quantity)
            .bind(now)
            .bind(stock_id)
            .execute(&mut *conn)
            .await?;
    }

    Ok(())
}

/// Takes the write lock and reads the stock rows of `product_ids` in one
/// statement. IDs are bound in ascending order.
async fn lock_stock_rows(
    conn: &mut SqliteConnection,
    product_ids: impl Iterator<Item = i64>,
) -> DbResult<BTreeMap<i64, StockLevel>> {
    let mut query = QueryBuilder::<Sqlite>::new(
        "UPDATE stock_levels SET quantity = quantity WHERE product_id IN (",
    );
    let mut list = query.separated(", ");
    for id in product_ids {
        list.push_bind(id);
    }
    list.push_unseparated(") RETURNING id, product_id, quantity, updated_at");

    let rows = query
        .build_query_as::<StockLevel>()
        .fetch_all(&mut *conn)
        .await?;

    Ok(rows.into_iter().map(|row| (row.product_id, row)).collect())
}

/// Requested quantity per product, ascending by product ID. Zero-quantity
/// lines take no stock and are left out.
fn requested_quantities(checkout: &Checkout) -> BTreeMap<i64, i64> {
    let mut requested = BTreeMap::new();
    for line in checkout.lines.iter().filter(|line| line.quantity > 0) {
        *requested.entry(line.product.id).or_insert(0) += line.quantity;
    }
    requested
}

// =============================================================================
// Unit Tests
// =============================================================================
