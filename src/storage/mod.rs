//! # Storage and Persistence
//!
//! Database connectivity and the persistence layer for accounts, roles, and
//! password reset tokens.

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use crate::config::DatabaseConfig;

pub use migrations::{get_migration_version, validate_migrations};
pub use pool::{create_pool, get_pool_stats, DbPool, PoolStats};
pub use repositories::{
    AccountRepository, ResetTokenRepository, RoleRepository, SqlxAccountRepository,
    SqlxResetTokenRepository, SqlxRoleRepository,
};

use crate::errors::{Error, Result};

/// Run database migrations
pub async fn run_migrations(pool: &DbPool) -> Result<()> {
    migrations::run_migrations(pool).await
}

/// Check database connectivity
pub async fn check_connection(pool: &DbPool) -> Result<()> {
    sqlx::query("SELECT 1").fetch_one(pool).await.map_err(|e| Error::Database {
        source: e,
        context: "Database connectivity check failed".to_string(),
    })?;

    Ok(())
}
