//! Tenant repository

use super::map_unique_violation;
use crate::domain::{StringUuid, Tenant};
use crate::error::Result;
use async_trait::async_trait;
use sqlx::MySqlPool;

const TENANT_COLUMNS: &str = "id, name, display_name, is_active, configuration_id, client_id, \
     return_urls, cors_origins, url_aliases, notify_endpoint, notify_api_key, \
     created_at, updated_at";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TenantRepository: Send + Sync {
    async fn create(&self, tenant: &Tenant) -> Result<Tenant>;
    async fn find_by_id(&self, id: StringUuid) -> Result<Option<Tenant>>;
    async fn find_by_name(&self, name: &str) -> Result<Option<Tenant>>;
    /// All tenants whose stored association references the given client.
    async fn find_by_client_id(&self, client_id: StringUuid) -> Result<Vec<Tenant>>;
    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<Tenant>>;
    async fn count(&self) -> Result<i64>;
    async fn update(&self, tenant: &Tenant) -> Result<Tenant>;
    async fn delete(&self, id: StringUuid) -> Result<()>;
}

pub struct TenantRepositoryImpl {
    pool: MySqlPool,
}

impl TenantRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TenantRepository for TenantRepositoryImpl {
    async fn create(&self, tenant: &Tenant) -> Result<Tenant> {
        sqlx::query(
            r#"
            INSERT INTO tenants (id, name, display_name, is_active, configuration_id, client_id,
                                 return_urls, cors_origins, url_aliases, notify_endpoint,
                                 notify_api_key, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(tenant.id)
        .bind(&tenant.name)
        .bind(&tenant.display_name)
        .bind(tenant.is_active)
        .bind(tenant.configuration_id)
        .bind(tenant.client_id)
        .bind(serde_json::to_string(&tenant.return_urls).unwrap_or_default())
        .bind(serde_json::to_string(&tenant.cors_origins).unwrap_or_default())
        .bind(serde_json::to_string(&tenant.url_aliases).unwrap_or_default())
        .bind(&tenant.notify_endpoint)
        .bind(&tenant.notify_api_key)
        .bind(tenant.created_at)
        .bind(tenant.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            map_unique_violation(e, format!("Tenant with name '{}' already exists", tenant.name))
        })?;

        Ok(tenant.clone())
    }

    async fn find_by_id(&self, id: StringUuid) -> Result<Option<Tenant>> {
        let tenant = sqlx::query_as::<_, Tenant>(&format!(
            "SELECT {} FROM tenants WHERE id = ?",
            TENANT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(tenant)
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Tenant>> {
        let tenant = sqlx::query_as::<_, Tenant>(&format!(
            "SELECT {} FROM tenants WHERE name = ?",
            TENANT_COLUMNS
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(tenant)
    }

    async fn find_by_client_id(&self, client_id: StringUuid) -> Result<Vec<Tenant>> {
        let tenants = sqlx::query_as::<_, Tenant>(&format!(
            "SELECT {} FROM tenants WHERE client_id = ? ORDER BY created_at",
            TENANT_COLUMNS
        ))
        .bind(client_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tenants)
    }

    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<Tenant>> {
        let tenants = sqlx::query_as::<_, Tenant>(&format!(
            "SELECT {} FROM tenants ORDER BY created_at LIMIT ? OFFSET ?",
            TENANT_COLUMNS
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(tenants)
    }

    async fn count(&self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tenants")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0)
    }

    async fn update(&self, tenant: &Tenant) -> Result<Tenant> {
        sqlx::query(
            r#"
            UPDATE tenants
            SET display_name = ?, is_active = ?, configuration_id = ?, client_id = ?,
                return_urls = ?, cors_origins = ?, url_aliases = ?,
                notify_endpoint = ?, notify_api_key = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&tenant.display_name)
        .bind(tenant.is_active)
        .bind(tenant.configuration_id)
        .bind(tenant.client_id)
        .bind(serde_json::to_string(&tenant.return_urls).unwrap_or_default())
        .bind(serde_json::to_string(&tenant.cors_origins).unwrap_or_default())
        .bind(serde_json::to_string(&tenant.url_aliases).unwrap_or_default())
        .bind(&tenant.notify_endpoint)
        .bind(&tenant.notify_api_key)
        .bind(tenant.updated_at)
        .bind(tenant.id)
        .execute(&self.pool)
        .await?;

        Ok(tenant.clone())
    }

    async fn delete(&self, id: StringUuid) -> Result<()> {
        sqlx::query("DELETE FROM tenants WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
