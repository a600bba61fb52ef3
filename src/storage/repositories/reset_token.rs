//! Password reset token repository.
//!
//! Consumption is the sensitive path: under concurrent submissions of the
//! same token, exactly one caller may win. The transaction opens with a
//! compare-and-set UPDATE so the write lock is taken before any state is
//! read; the loser observes zero affected rows and is turned away.

use crate::auth::models::ResetTokenRecord;
use crate::domain::{ResetTokenId, UserId};
use crate::errors::{AuthErrorType, Error, Result};
use crate::storage::DbPool;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use tracing::instrument;

#[derive(Debug, Clone, FromRow)]
struct ResetTokenRow {
    pub id: String,
    pub user_id: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait ResetTokenRepository: Send + Sync {
    /// Persist a freshly issued reset token
    async fn insert_token(&self, record: ResetTokenRecord) -> Result<()>;

    /// Look up a token by its value
    async fn get_token(&self, token: &str) -> Result<Option<ResetTokenRecord>>;

    /// Atomically consume a token and set the owner's password hash.
    ///
    /// Exactly one concurrent caller can succeed for a given token; every
    /// other caller gets a `UsedResetToken` failure. Expired or unknown
    /// tokens fail without consuming anything.
    async fn consume_and_update_password(&self, token: &str, password_hash: &str) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct SqlxResetTokenRepository {
    pool: DbPool,
}

impl SqlxResetTokenRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn row_to_record(&self, row: ResetTokenRow) -> ResetTokenRecord {
        ResetTokenRecord {
            id: ResetTokenId::from_string(row.id),
            user_id: UserId::from_string(row.user_id),
            token: row.token,
            expires_at: row.expires_at,
            used: row.used,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl ResetTokenRepository for SqlxResetTokenRepository {
    #[instrument(skip(self, record), fields(user_id = %record.user_id), name = "db_insert_reset_token")]
    async fn insert_token(&self, record: ResetTokenRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO password_reset_tokens (id, user_id, token, expires_at, used, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(record.id.as_str())
        .bind(record.user_id.as_str())
        .bind(&record.token)
        .bind(record.expires_at)
        .bind(record.used)
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(|err| Error::Database {
            source: err,
            context: "Failed to insert reset token".to_string(),
        })?;

        Ok(())
    }

    #[instrument(skip(self, token), name = "db_get_reset_token")]
    async fn get_token(&self, token: &str) -> Result<Option<ResetTokenRecord>> {
        let row = sqlx::query_as::<_, ResetTokenRow>(
            "SELECT id, user_id, token, expires_at, used, created_at FROM password_reset_tokens WHERE token = $1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| Error::Database {
            source: err,
            context: "Failed to fetch reset token".to_string(),
        })?;

        Ok(row.map(|r| self.row_to_record(r)))
    }

    #[instrument(skip(self, token, password_hash), name = "db_consume_reset_token")]
    async fn consume_and_update_password(&self, token: &str, password_hash: &str) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(|err| Error::Database {
            source: err,
            context: "Failed to start reset transaction".to_string(),
        })?;

        // Compare-and-set first so the write lock is held before the state
        // checks below; concurrent consumers serialize here and the loser
        // sees zero affected rows.
        let claimed = sqlx::query(
            "UPDATE password_reset_tokens SET used = 1 WHERE token = $1 AND used = 0",
        )
        .bind(token)
        .execute(&mut *tx)
        .await
        .map_err(|err| Error::Database {
            source: err,
            context: "Failed to claim reset token".to_string(),
        })?
        .rows_affected();

        let row = sqlx::query_as::<_, ResetTokenRow>(
            "SELECT id, user_id, token, expires_at, used, created_at FROM password_reset_tokens WHERE token = $1",
        )
        .bind(token)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|err| Error::Database {
            source: err,
            context: "Failed to fetch reset token".to_string(),
        })?;

        let Some(row) = row else {
            return Err(Error::auth("Invalid reset token", AuthErrorType::InvalidResetToken));
        };

        if claimed == 0 {
            // Already consumed before this transaction started.
            return Err(Error::auth(
                "Reset token has already been used",
                AuthErrorType::UsedResetToken,
            ));
        }

        if row.expires_at <= Utc::now() {
            // Rolling back leaves the token unconsumed; it is dead either
            // way once expired.
            return Err(Error::auth("Reset token has expired", AuthErrorType::ExpiredResetToken));
        }

        let updated = sqlx::query(
            "UPDATE users SET hashed_password = $1, updated_at = $2 WHERE id = $3 AND deleted_at IS NULL",
        )
        .bind(password_hash)
        .bind(Utc::now())
        .bind(&row.user_id)
        .execute(&mut *tx)
        .await
        .map_err(|err| Error::Database {
            source: err,
            context: "Failed to update password from reset token".to_string(),
        })?
        .rows_affected();

        if updated == 0 {
            return Err(Error::auth(
                "Account for reset token no longer exists",
                AuthErrorType::ResetAccountNotFound,
            ));
        }

        tx.commit().await.map_err(|err| Error::Database {
            source: err,
            context: "Failed to commit reset transaction".to_string(),
        })?;

        Ok(())
    }
}
