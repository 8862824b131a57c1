//! # Product Repository
//!
//! PostgreSQL operations for products.
//!
//! ## Registration
//! ```text
//! create(NewProduct)
//!      │
//!      ▼
//! BEGIN
//!   INSERT INTO products ...            → id
//!   INSERT INTO inventories (id, 0, 'out_of_stock', location)
//! COMMIT
//! ```
//! A product never exists without its inventory row.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;

use samagri_core::api::{Page, Paging, ProductFilter};
use samagri_core::{InventoryStatus, Money, NewProduct, Product};

use super::ProductRepository;
use crate::error::{DbError, DbResult};

pub(crate) const PRODUCT_COLUMNS: &str = "id, name, description, price_cents, sku, category, \
     image_url, created_at, updated_at, deleted_at";

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ProductRow {
    id: i64,
    name: String,
    description: Option<String>,
    price_cents: i64,
    sku: String,
    category: Option<String>,
    image_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            name: row.name,
            description: row.description,
            price: Money::from_cents(row.price_cents),
            sku: row.sku,
            category: row.category,
            image_url: row.image_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        }
    }
}

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct PgProductRepository {
    pool: PgPool,
}

impl PgProductRepository {
    pub fn new(pool: PgPool) -> Self {
        PgProductRepository { pool }
    }
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn create(&self, product: &NewProduct) -> DbResult<Product> {
        debug!(sku = %product.sku, "Registering product");

        let mut tx = self.pool.begin().await?;

        let row: ProductRow = sqlx::query_as(&format!(
            "INSERT INTO products (name, description, price_cents, sku, category, image_url) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(product.name.trim())
        .bind(&product.description)
        .bind(product.price.cents())
        .bind(product.sku.trim())
        .bind(&product.category)
        .bind(&product.image_url)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO inventories (product_id, quantity, status, location) \
             VALUES ($1, 0, $2, $3)",
        )
        .bind(row.id)
        .bind(InventoryStatus::OutOfStock.as_str())
        .bind(product.location.as_deref().unwrap_or(""))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(product_id = row.id, "Product registered with empty inventory");
        Ok(row.into())
    }

    async fn find_by_id(&self, id: i64) -> DbResult<Option<Product>> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn list(&self, filter: &ProductFilter, paging: Paging) -> DbResult<Page<Product>> {
        let rows: Vec<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE deleted_at IS NULL AND ($1::TEXT IS NULL OR category = $1) \
             ORDER BY id \
             LIMIT $2 OFFSET $3"
        ))
        .bind(&filter.category)
        .bind(paging.limit())
        .bind(paging.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM products \
             WHERE deleted_at IS NULL AND ($1::TEXT IS NULL OR category = $1)",
        )
        .bind(&filter.category)
        .fetch_one(&self.pool)
        .await?;

        Ok(Page::new(
            rows.into_iter().map(Into::into).collect(),
            paging,
            total,
        ))
    }

    async fn soft_delete(&self, id: i64) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE products SET deleted_at = now(), updated_at = now() \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        debug!(product_id = id, "Product soft-deleted");
        Ok(())
    }
}
