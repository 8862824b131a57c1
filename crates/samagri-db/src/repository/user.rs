//! # User Repository
//!
//! Stores staff accounts. Only password hashes are ever written.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;

use samagri_core::api::{Page, Paging, UserFilter};
use samagri_core::{NewUser, User};

use super::UserRepository;
use crate::error::{DbError, DbResult};

const USER_COLUMNS: &str = "id, email, password_hash, first_name, last_name, role, is_active, \
     created_at, updated_at, deleted_at";

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    email: String,
    password_hash: String,
    first_name: String,
    last_name: String,
    role: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl TryFrom<UserRow> for User {
    type Error = DbError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = row
            .role
            .parse()
            .map_err(|e| DbError::Internal(format!("users.role: {e}")))?;

        Ok(User {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            first_name: row.first_name,
            last_name: row.last_name,
            role,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        PgUserRepository { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: &NewUser) -> DbResult<User> {
        let row: UserRow = sqlx::query_as(&format!(
            "INSERT INTO users (email, password_hash, first_name, last_name, role) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(user.email.trim())
        .bind(&user.password_hash)
        .bind(user.first_name.trim())
        .bind(user.last_name.trim())
        .bind(user.role.as_str())
        .fetch_one(&self.pool)
        .await?;

        debug!(user_id = row.id, role = %row.role, "User created");
        row.try_into()
    }

    async fn find_by_id(&self, id: i64) -> DbResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn find_by_email(&self, email: &str) -> DbResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1 AND deleted_at IS NULL"
        ))
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn list(&self, filter: &UserFilter, paging: Paging) -> DbResult<Page<User>> {
        let role = filter.role.map(|r| r.as_str());

        let rows: Vec<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE deleted_at IS NULL AND ($1::TEXT IS NULL OR role = $1) \
             ORDER BY id \
             LIMIT $2 OFFSET $3"
        ))
        .bind(role)
        .bind(paging.limit())
        .bind(paging.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users \
             WHERE deleted_at IS NULL AND ($1::TEXT IS NULL OR role = $1)",
        )
        .bind(role)
        .fetch_one(&self.pool)
        .await?;

        let users = rows
            .into_iter()
            .map(User::try_from)
            .collect::<DbResult<Vec<_>>>()?;

        Ok(Page::new(users, paging, total))
    }

    async fn soft_delete(&self, id: i64) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE users SET deleted_at = now(), updated_at = now(), is_active = FALSE \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        debug!(user_id = id, "User soft-deleted");
        Ok(())
    }
}
