//! Account repository for credential and profile persistence
//!
//! Provides CRUD operations for user accounts. All lookups exclude
//! soft-deleted rows, and reads join the roles table so callers get the role
//! name without a second query.

use crate::auth::models::{Account, NewAccount};
use crate::domain::{RoleId, UserId};
use crate::errors::{Error, Result};
use crate::storage::DbPool;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use tracing::instrument;

// Database row structures

#[derive(Debug, Clone, FromRow)]
struct AccountRow {
    pub id: String,
    pub email: String,
    pub hashed_password: String,
    pub name: String,
    pub phone: Option<String>,
    pub role_id: String,
    pub role_name: String,
    pub is_active: bool,
    pub is_validated: bool,
    pub must_change_password: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const ACCOUNT_SELECT: &str = r#"
    SELECT u.id, u.email, u.hashed_password, u.name, u.phone, u.role_id,
           r.name AS role_name, u.is_active, u.is_validated,
           u.must_change_password, u.created_at, u.updated_at
    FROM users u
    JOIN roles r ON r.id = u.role_id
"#;

// Repository traits

#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Create a new account
    async fn create_account(&self, account: NewAccount) -> Result<Account>;

    /// Get an account by ID
    async fn get_account(&self, id: &UserId) -> Result<Option<Account>>;

    /// Get an account by normalized email
    async fn get_account_by_email(&self, email: &str) -> Result<Option<Account>>;

    /// Update an account's password hash
    async fn update_password(&self, id: &UserId, password_hash: String) -> Result<()>;

    /// Mark an account active or inactive
    async fn set_active(&self, id: &UserId, is_active: bool) -> Result<()>;

    /// Mark an account validated
    async fn set_validated(&self, id: &UserId, is_validated: bool) -> Result<()>;

    /// Count accounts holding the given role
    async fn count_by_role(&self, role_id: &RoleId) -> Result<i64>;

    /// Soft-delete an account
    async fn delete_account(&self, id: &UserId) -> Result<()>;
}

// SQLite implementation

#[derive(Debug, Clone)]
pub struct SqlxAccountRepository {
    pool: DbPool,
}

impl SqlxAccountRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn row_to_account(&self, row: AccountRow) -> Account {
        Account {
            id: UserId::from_string(row.id),
            email: row.email,
            name: row.name,
            phone: row.phone,
            password_hash: row.hashed_password,
            role_id: RoleId::from_string(row.role_id),
            role_name: row.role_name,
            is_active: row.is_active,
            is_validated: row.is_validated,
            must_change_password: row.must_change_password,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl AccountRepository for SqlxAccountRepository {
    #[instrument(skip(self, account), fields(account_email = %account.email), name = "db_create_account")]
    async fn create_account(&self, account: NewAccount) -> Result<Account> {
        let id = UserId::new();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO users (id, email, hashed_password, name, phone, role_id,
                               is_active, is_validated, must_change_password,
                               created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(id.as_str())
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(&account.name)
        .bind(&account.phone)
        .bind(account.role_id.as_str())
        .bind(account.is_active)
        .bind(account.is_validated)
        .bind(false)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|err| Error::Database {
            source: err,
            context: "Failed to create account".to_string(),
        })?;

        self.get_account(&id)
            .await?
            .ok_or_else(|| Error::internal("Account not found after creation"))
    }

    #[instrument(skip(self), fields(account_id = %id), name = "db_get_account")]
    async fn get_account(&self, id: &UserId) -> Result<Option<Account>> {
        let query = format!("{} WHERE u.id = $1 AND u.deleted_at IS NULL", ACCOUNT_SELECT);
        let row = sqlx::query_as::<_, AccountRow>(&query)
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| Error::Database {
                source: err,
                context: "Failed to fetch account".to_string(),
            })?;

        Ok(row.map(|r| self.row_to_account(r)))
    }

    #[instrument(skip(self), fields(account_email = %email), name = "db_get_account_by_email")]
    async fn get_account_by_email(&self, email: &str) -> Result<Option<Account>> {
        let query = format!("{} WHERE u.email = $1 AND u.deleted_at IS NULL", ACCOUNT_SELECT);
        let row = sqlx::query_as::<_, AccountRow>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| Error::Database {
                source: err,
                context: "Failed to fetch account by email".to_string(),
            })?;

        Ok(row.map(|r| self.row_to_account(r)))
    }

    #[instrument(skip(self, password_hash), fields(account_id = %id), name = "db_update_password")]
    async fn update_password(&self, id: &UserId, password_hash: String) -> Result<()> {
        sqlx::query(
            "UPDATE users SET hashed_password = $1, updated_at = $2 WHERE id = $3 AND deleted_at IS NULL",
        )
        .bind(&password_hash)
        .bind(Utc::now())
        .bind(id.as_str())
        .execute(&self.pool)
        .await
        .map_err(|err| Error::Database {
            source: err,
            context: "Failed to update password".to_string(),
        })?;

        Ok(())
    }

    #[instrument(skip(self), fields(account_id = %id, is_active = is_active), name = "db_set_active")]
    async fn set_active(&self, id: &UserId, is_active: bool) -> Result<()> {
        sqlx::query(
            "UPDATE users SET is_active = $1, updated_at = $2 WHERE id = $3 AND deleted_at IS NULL",
        )
        .bind(is_active)
        .bind(Utc::now())
        .bind(id.as_str())
        .execute(&self.pool)
        .await
        .map_err(|err| Error::Database {
            source: err,
            context: "Failed to update account active flag".to_string(),
        })?;

        Ok(())
    }

    #[instrument(skip(self), fields(account_id = %id), name = "db_set_validated")]
    async fn set_validated(&self, id: &UserId, is_validated: bool) -> Result<()> {
        sqlx::query(
            "UPDATE users SET is_validated = $1, updated_at = $2 WHERE id = $3 AND deleted_at IS NULL",
        )
        .bind(is_validated)
        .bind(Utc::now())
        .bind(id.as_str())
        .execute(&self.pool)
        .await
        .map_err(|err| Error::Database {
            source: err,
            context: "Failed to update account validated flag".to_string(),
        })?;

        Ok(())
    }

    #[instrument(skip(self), fields(role_id = %role_id), name = "db_count_by_role")]
    async fn count_by_role(&self, role_id: &RoleId) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM users WHERE role_id = $1 AND deleted_at IS NULL",
        )
        .bind(role_id.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|err| Error::Database {
            source: err,
            context: "Failed to count accounts by role".to_string(),
        })?;

        Ok(count)
    }

    #[instrument(skip(self), fields(account_id = %id), name = "db_delete_account")]
    async fn delete_account(&self, id: &UserId) -> Result<()> {
        sqlx::query(
            "UPDATE users SET deleted_at = $1, is_active = 0, updated_at = $1 WHERE id = $2 AND deleted_at IS NULL",
        )
        .bind(Utc::now())
        .bind(id.as_str())
        .execute(&self.pool)
        .await
        .map_err(|err| Error::Database {
            source: err,
            context: "Failed to delete account".to_string(),
        })?;

        Ok(())
    }
}
