//! # Inventory Repository
//!
//! Read-only access to inventory rows. Stock changes go through a
//! unit of work so they hold the row lock.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use samagri_core::api::{InventoryFilter, Page, Paging};
use samagri_core::Inventory;

use super::InventoryRepository;
use crate::error::{DbError, DbResult};

pub(crate) const INVENTORY_COLUMNS: &str = "id, product_id, quantity, status, location, \
     last_stock_update, created_at, updated_at, deleted_at";

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct InventoryRow {
    id: i64,
    product_id: i64,
    quantity: i64,
    status: String,
    location: String,
    last_stock_update: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl TryFrom<InventoryRow> for Inventory {
    type Error = DbError;

    fn try_from(row: InventoryRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse()
            .map_err(|e| DbError::Internal(format!("inventories.status: {e}")))?;

        Ok(Inventory {
            id: row.id,
            product_id: row.product_id,
            quantity: row.quantity,
            status,
            location: row.location,
            last_stock_update: row.last_stock_update,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct PgInventoryRepository {
    pool: PgPool,
}

impl PgInventoryRepository {
    pub fn new(pool: PgPool) -> Self {
        PgInventoryRepository { pool }
    }
}

#[async_trait]
impl InventoryRepository for PgInventoryRepository {
    async fn find_by_id(&self, id: i64) -> DbResult<Option<Inventory>> {
        let row: Option<InventoryRow> = sqlx::query_as(&format!(
            "SELECT {INVENTORY_COLUMNS} FROM inventories WHERE id = $1 AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Inventory::try_from).transpose()
    }

    async fn find_by_product(&self, product_id: i64) -> DbResult<Option<Inventory>> {
        let row: Option<InventoryRow> = sqlx::query_as(&format!(
            "SELECT {INVENTORY_COLUMNS} FROM inventories \
             WHERE product_id = $1 AND deleted_at IS NULL"
        ))
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Inventory::try_from).transpose()
    }

    async fn list(&self, filter: &InventoryFilter, paging: Paging) -> DbResult<Page<Inventory>> {
        let status = filter.status.map(|s| s.as_str());

        let rows: Vec<InventoryRow> = sqlx::query_as(&format!(
            "SELECT {INVENTORY_COLUMNS} FROM inventories \
             WHERE deleted_at IS NULL AND ($1::TEXT IS NULL OR status = $1) \
             ORDER BY product_id \
             LIMIT $2 OFFSET $3"
        ))
        .bind(status)
        .bind(paging.limit())
        .bind(paging.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM inventories \
             WHERE deleted_at IS NULL AND ($1::TEXT IS NULL OR status = $1)",
        )
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        let items = rows
            .into_iter()
            .map(Inventory::try_from)
            .collect::<DbResult<Vec<_>>>()?;

        Ok(Page::new(items, paging, total))
    }
}
