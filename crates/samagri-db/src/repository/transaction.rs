//! # Transaction Repository
//!
//! Read side of the sales ledger. Items come back in request order
//! (`line_no`), which is the order the receipt was entered.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use samagri_core::api::{Page, Paging, TransactionFilter};
use samagri_core::{Money, Transaction, TransactionItem};

use super::TransactionRepository;
use crate::error::DbResult;

pub(crate) const TRANSACTION_COLUMNS: &str =
    "id, customer_id, user_id, total_amount_cents, created_at, updated_at";

pub(crate) const ITEM_COLUMNS: &str =
    "id, transaction_id, product_id, quantity, price_cents, created_at";

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct TransactionRow {
    id: i64,
    customer_id: i64,
    user_id: i64,
    total_amount_cents: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TransactionRow {
    pub(crate) fn into_transaction(self, items: Vec<TransactionItem>) -> Transaction {
        Transaction {
            id: self.id,
            customer_id: self.customer_id,
            user_id: self.user_id,
            total_amount: Money::from_cents(self.total_amount_cents),
            items,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ItemRow {
    id: i64,
    transaction_id: i64,
    product_id: i64,
    quantity: i64,
    price_cents: i64,
    created_at: DateTime<Utc>,
}

impl From<ItemRow> for TransactionItem {
    fn from(row: ItemRow) -> Self {
        TransactionItem {
            id: row.id,
            transaction_id: row.transaction_id,
            product_id: row.product_id,
            quantity: row.quantity,
            price: Money::from_cents(row.price_cents),
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PgTransactionRepository {
    pool: PgPool,
}

impl PgTransactionRepository {
    pub fn new(pool: PgPool) -> Self {
        PgTransactionRepository { pool }
    }

    async fn items_for(&self, ids: &[i64]) -> DbResult<HashMap<i64, Vec<TransactionItem>>> {
        let rows: Vec<ItemRow> = sqlx::query_as(&format!(
            "SELECT {ITEM_COLUMNS} FROM transaction_items \
             WHERE transaction_id = ANY($1) \
             ORDER BY transaction_id, line_no"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: HashMap<i64, Vec<TransactionItem>> = HashMap::new();
        for row in rows {
            grouped
                .entry(row.transaction_id)
                .or_default()
                .push(row.into());
        }
        Ok(grouped)
    }
}

#[async_trait]
impl TransactionRepository for PgTransactionRepository {
    async fn find_by_id(&self, id: i64) -> DbResult<Option<Transaction>> {
        let row: Option<TransactionRow> = sqlx::query_as(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions \
             WHERE id = $1 AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut items = self.items_for(&[row.id]).await?;
        let items = items.remove(&row.id).unwrap_or_default();
        Ok(Some(row.into_transaction(items)))
    }

    async fn list(
        &self,
        filter: &TransactionFilter,
        paging: Paging,
    ) -> DbResult<Page<Transaction>> {
        let rows: Vec<TransactionRow> = sqlx::query_as(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions \
             WHERE deleted_at IS NULL AND ($1::BIGINT IS NULL OR customer_id = $1) \
             ORDER BY id DESC \
             LIMIT $2 OFFSET $3"
        ))
        .bind(filter.customer_id)
        .bind(paging.limit())
        .bind(paging.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM transactions \
             WHERE deleted_at IS NULL AND ($1::BIGINT IS NULL OR customer_id = $1)",
        )
        .bind(filter.customer_id)
        .fetch_one(&self.pool)
        .await?;

        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let mut items = self.items_for(&ids).await?;

        let transactions = rows
            .into_iter()
            .map(|row| {
                let row_items = items.remove(&row.id).unwrap_or_default();
                row.into_transaction(row_items)
            })
            .collect();

        Ok(Page::new(transactions, paging, total))
    }
}
