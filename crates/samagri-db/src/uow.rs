//! # Unit of Work
//!
//! Groups the reads and writes of one business operation into a single
//! atomic commit, and carries the row-level exclusive holds on inventory.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  with_transaction(gateway, work)                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  gateway.begin()  ──►  Box<dyn UnitOfWork>   (one pooled connection)    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  work(&mut uow)                                                         │
//! │    find_inventory_for_update(p)  ← row held until commit/rollback       │
//! │    update_inventory / insert_transaction / insert_transaction_item      │
//! │       │                                                                 │
//! │       ├── Ok  ──► commit()    (connection returned to pool)             │
//! │       └── Err ──► rollback()  (every staged write discarded)            │
//! │                                                                         │
//! │  Nested operations take `&mut dyn UnitOfWork` and join the outer one.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Dropping a unit of work without committing rolls it back.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::future::BoxFuture;
use sqlx::{PgPool, Postgres};
use tracing::{debug, warn};

use samagri_core::{
    Customer, Inventory, InventoryStatus, Money, Product, StockAdjustment, Transaction,
    TransactionItem,
};

use crate::error::{DbError, DbResult};
use crate::gateway::Gateway;
use crate::repository::customer::{CustomerRow, CUSTOMER_COLUMNS};
use crate::repository::inventory::{InventoryRow, INVENTORY_COLUMNS};
use crate::repository::product::{ProductRow, PRODUCT_COLUMNS};
use crate::repository::transaction::{ItemRow, TransactionRow, ITEM_COLUMNS, TRANSACTION_COLUMNS};

// =============================================================================
// Write Models
// =============================================================================

/// New state of an inventory row, computed by the caller under the row hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryUpdate {
    pub product_id: i64,
    pub quantity: i64,
    pub status: InventoryStatus,
    pub last_stock_update: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    pub customer_id: i64,
    pub user_id: i64,
    pub total_amount: Money,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransactionItem {
    pub transaction_id: i64,
    /// 1-based position in the original request.
    pub line_no: i32,
    pub product_id: i64,
    pub quantity: i64,
    pub price: Money,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStockAdjustment {
    pub product_id: i64,
    pub delta: i64,
    pub quantity_after: i64,
    pub reason: String,
    pub user_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit of Work
// =============================================================================

#[async_trait]
pub trait UnitOfWork: Send {
    /// Live customer by id.
    async fn find_customer(&mut self, id: i64) -> DbResult<Option<Customer>>;

    /// Live product by id.
    async fn find_product(&mut self, id: i64) -> DbResult<Option<Product>>;

    /// Inventory row for a product, held exclusively until this unit of
    /// work ends. Waiting longer than the statement timeout fails with
    /// [`DbError::Deadlock`].
    async fn find_inventory_for_update(&mut self, product_id: i64) -> DbResult<Option<Inventory>>;

    /// Writes a row previously obtained with `find_inventory_for_update`.
    async fn update_inventory(&mut self, update: &InventoryUpdate) -> DbResult<()>;

    /// Inserts the transaction header; the returned value has no items.
    async fn insert_transaction(&mut self, tx: &NewTransaction) -> DbResult<Transaction>;

    async fn insert_transaction_item(&mut self, item: &NewTransactionItem)
        -> DbResult<TransactionItem>;

    async fn insert_stock_adjustment(
        &mut self,
        adjustment: &NewStockAdjustment,
    ) -> DbResult<StockAdjustment>;

    async fn commit(self: Box<Self>) -> DbResult<()>;

    async fn rollback(self: Box<Self>) -> DbResult<()>;
}

/// Runs `work` inside a fresh unit of work.
///
/// Commits when `work` returns `Ok`, rolls back when it returns `Err`.
/// A failed rollback is logged; the error from `work` is what the caller
/// sees.
///
/// ```rust,ignore
/// let sale = with_transaction(gateway, move |uow| {
///     Box::pin(async move { record_sale(uow, &plan).await })
/// })
/// .await?;
/// ```
pub async fn with_transaction<T, E, F>(gateway: &dyn Gateway, work: F) -> Result<T, E>
where
    T: Send,
    E: From<DbError> + Send,
    F: for<'u> FnOnce(&'u mut dyn UnitOfWork) -> BoxFuture<'u, Result<T, E>> + Send,
{
    let mut uow = gateway.begin().await?;
    let outcome = work(uow.as_mut()).await;

    match outcome {
        Ok(value) => {
            uow.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = uow.rollback().await {
                warn!(error = %rollback_err, "Rollback failed");
            }
            Err(err)
        }
    }
}

// =============================================================================
// PostgreSQL
// =============================================================================

/// A unit of work over one PostgreSQL transaction (READ COMMITTED, row
/// locks via `SELECT ... FOR UPDATE`).
pub struct PgUnitOfWork {
    tx: sqlx::Transaction<'static, Postgres>,
}

impl PgUnitOfWork {
    pub async fn begin(pool: &PgPool) -> DbResult<Self> {
        let tx = pool.begin().await?;
        Ok(PgUnitOfWork { tx })
    }
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn find_customer(&mut self, id: i64) -> DbResult<Option<Customer>> {
        let row: Option<CustomerRow> = sqlx::query_as(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1 AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn find_product(&mut self, id: i64) -> DbResult<Option<Product>> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn find_inventory_for_update(&mut self, product_id: i64) -> DbResult<Option<Inventory>> {
        debug!(product_id, "Locking inventory row");

        let row: Option<InventoryRow> = sqlx::query_as(&format!(
            "SELECT {INVENTORY_COLUMNS} FROM inventories \
             WHERE product_id = $1 AND deleted_at IS NULL \
             FOR UPDATE"
        ))
        .bind(product_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(Inventory::try_from).transpose()
    }

    async fn update_inventory(&mut self, update: &InventoryUpdate) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE inventories \
             SET quantity = $2, status = $3, last_stock_update = $4, updated_at = $4 \
             WHERE product_id = $1 AND deleted_at IS NULL",
        )
        .bind(update.product_id)
        .bind(update.quantity)
        .bind(update.status.as_str())
        .bind(update.last_stock_update)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Inventory", update.product_id));
        }
        Ok(())
    }

    async fn insert_transaction(&mut self, tx: &NewTransaction) -> DbResult<Transaction> {
        let row: TransactionRow = sqlx::query_as(&format!(
            "INSERT INTO transactions (customer_id, user_id, total_amount_cents, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $4) \
             RETURNING {TRANSACTION_COLUMNS}"
        ))
        .bind(tx.customer_id)
        .bind(tx.user_id)
        .bind(tx.total_amount.cents())
        .bind(tx.created_at)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(row.into_transaction(Vec::new()))
    }

    async fn insert_transaction_item(
        &mut self,
        item: &NewTransactionItem,
    ) -> DbResult<TransactionItem> {
        let row: ItemRow = sqlx::query_as(&format!(
            "INSERT INTO transaction_items \
             (transaction_id, line_no, product_id, quantity, price_cents, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $6) \
             RETURNING {ITEM_COLUMNS}"
        ))
        .bind(item.transaction_id)
        .bind(item.line_no)
        .bind(item.product_id)
        .bind(item.quantity)
        .bind(item.price.cents())
        .bind(item.created_at)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(row.into())
    }

    async fn insert_stock_adjustment(
        &mut self,
        adjustment: &NewStockAdjustment,
    ) -> DbResult<StockAdjustment> {
        let (id, created_at): (i64, DateTime<Utc>) = sqlx::query_as(
            "INSERT INTO stock_adjustments \
             (product_id, delta, quantity_after, reason, user_id, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id, created_at",
        )
        .bind(adjustment.product_id)
        .bind(adjustment.delta)
        .bind(adjustment.quantity_after)
        .bind(&adjustment.reason)
        .bind(adjustment.user_id)
        .bind(adjustment.created_at)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(StockAdjustment {
            id,
            product_id: adjustment.product_id,
            delta: adjustment.delta,
            quantity_after: adjustment.quantity_after,
            reason: adjustment.reason.clone(),
            user_id: adjustment.user_id,
            created_at,
        })
    }

    async fn commit(self: Box<Self>) -> DbResult<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> DbResult<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
