//! # Customer Repository

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use tracing::debug;

use samagri_core::api::{CustomerFilter, Page, Paging};
use samagri_core::{Customer, NewCustomer};

use super::CustomerRepository;
use crate::error::{DbError, DbResult};

pub(crate) const CUSTOMER_COLUMNS: &str = "id, first_name, last_name, email, phone, address, \
     birth_date, created_at, updated_at, deleted_at";

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct CustomerRow {
    id: i64,
    first_name: String,
    last_name: String,
    email: String,
    phone: Option<String>,
    address: Option<String>,
    birth_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Customer {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            phone: row.phone,
            address: row.address,
            birth_date: row.birth_date,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PgCustomerRepository {
    pool: PgPool,
}

impl PgCustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        PgCustomerRepository { pool }
    }
}

#[async_trait]
impl CustomerRepository for PgCustomerRepository {
    async fn create(&self, customer: &NewCustomer) -> DbResult<Customer> {
        let row: CustomerRow = sqlx::query_as(&format!(
            "INSERT INTO customers (first_name, last_name, email, phone, address, birth_date) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {CUSTOMER_COLUMNS}"
        ))
        .bind(customer.first_name.trim())
        .bind(customer.last_name.trim())
        .bind(customer.email.trim())
        .bind(&customer.phone)
        .bind(&customer.address)
        .bind(customer.birth_date)
        .fetch_one(&self.pool)
        .await?;

        debug!(customer_id = row.id, "Customer created");
        Ok(row.into())
    }

    async fn find_by_id(&self, id: i64) -> DbResult<Option<Customer>> {
        let row: Option<CustomerRow> = sqlx::query_as(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1 AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn list(&self, filter: &CustomerFilter, paging: Paging) -> DbResult<Page<Customer>> {
        let rows: Vec<CustomerRow> = sqlx::query_as(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers \
             WHERE deleted_at IS NULL AND ($1::TEXT IS NULL OR email = $1) \
             ORDER BY id \
             LIMIT $2 OFFSET $3"
        ))
        .bind(&filter.email)
        .bind(paging.limit())
        .bind(paging.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM customers \
             WHERE deleted_at IS NULL AND ($1::TEXT IS NULL OR email = $1)",
        )
        .bind(&filter.email)
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
            "UPDATE customers SET deleted_at = now(), updated_at = now() \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }
        Ok(())
    }
}
