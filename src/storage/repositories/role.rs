//! Role reference-data repository.
//!
//! Roles are seeded by migration and read-only at runtime; only lookups are
//! exposed.

use crate::auth::models::Role;
use crate::domain::RoleId;
use crate::errors::{Error, Result};
use crate::storage::DbPool;
use async_trait::async_trait;
use sqlx::FromRow;
use tracing::instrument;

#[derive(Debug, Clone, FromRow)]
struct RoleRow {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
}

#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Find a role by its unique name
    async fn get_role_by_name(&self, name: &str) -> Result<Option<Role>>;
}

#[derive(Debug, Clone)]
pub struct SqlxRoleRepository {
    pool: DbPool,
}

impl SqlxRoleRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn row_to_role(&self, row: RoleRow) -> Role {
        Role { id: RoleId::from_string(row.id), name: row.name, description: row.description }
    }
}

#[async_trait]
impl RoleRepository for SqlxRoleRepository {
    #[instrument(skip(self), fields(role_name = %name), name = "db_get_role_by_name")]
    async fn get_role_by_name(&self, name: &str) -> Result<Option<Role>> {
        let row = sqlx::query_as::<_, RoleRow>(
            "SELECT id, name, description FROM roles WHERE name = $1 AND deleted_at IS NULL",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| Error::Database {
            source: err,
            context: "Failed to fetch role by name".to_string(),
        })?;

        Ok(row.map(|r| self.row_to_role(r)))
    }
}
