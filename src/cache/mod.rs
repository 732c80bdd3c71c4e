//! Redis read-through cache for raw Tenant/Client rows
//!
//! Only the raw records are cached, never the synthesized client descriptor:
//! resolution must always recompute the aggregation from current tenant
//! state. Every write path invalidates the affected keys.

use crate::config::RedisConfig;
use crate::domain::{Client, StringUuid, Tenant};
use crate::error::{AppError, Result};
use redis::{aio::ConnectionManager, AsyncCommands};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;

/// Cache key prefixes
mod keys {
    pub const TENANT: &str = "tessera:tenant";
    pub const TENANT_NAME: &str = "tessera:tenant_name";
    pub const CLIENT: &str = "tessera:client";
    pub const CLIENT_NAME: &str = "tessera:client_name";
}

/// Default TTLs
mod ttl {
    pub const TENANT_SECS: u64 = 300; // 5 minutes
    pub const CLIENT_SECS: u64 = 300; // 5 minutes
}

/// Cache manager for Redis operations
#[derive(Clone)]
pub struct CacheManager {
    conn: ConnectionManager,
}

impl CacheManager {
    /// Create a new cache manager
    pub async fn new(config: &RedisConfig) -> Result<Self> {
        let client = redis::Client::open(config.url.as_str()).map_err(|e| {
            AppError::Internal(anyhow::anyhow!("Failed to create Redis client: {}", e))
        })?;

        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to connect to Redis: {}", e)))?;

        Ok(Self { conn })
    }

    async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;

        match value {
            Some(v) => {
                let parsed = serde_json::from_str(&v).map_err(|e| {
                    AppError::Internal(anyhow::anyhow!("Cache deserialize error: {}", e))
                })?;
                Ok(Some(parsed))
            }
            None => Ok(None),
        }
    }

    async fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) -> Result<()> {
        let mut conn = self.conn.clone();
        let serialized = serde_json::to_string(value)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Cache serialize error: {}", e)))?;

        let _: () = conn.set_ex(key, serialized, ttl.as_secs()).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(key).await?;
        Ok(())
    }

    pub async fn get_tenant(&self, id: StringUuid) -> Result<Option<Tenant>> {
        self.get(&format!("{}:{}", keys::TENANT, id)).await
    }

    pub async fn get_tenant_by_name(&self, name: &str) -> Result<Option<Tenant>> {
        self.get(&format!("{}:{}", keys::TENANT_NAME, name)).await
    }

    pub async fn set_tenant(&self, tenant: &Tenant) -> Result<()> {
        let ttl = Duration::from_secs(ttl::TENANT_SECS);
        self.set(&format!("{}:{}", keys::TENANT, tenant.id), tenant, ttl)
            .await?;
        self.set(
            &format!("{}:{}", keys::TENANT_NAME, tenant.name),
            tenant,
            ttl,
        )
        .await
    }

    pub async fn invalidate_tenant(&self, tenant: &Tenant) -> Result<()> {
        self.delete(&format!("{}:{}", keys::TENANT, tenant.id)).await?;
        self.delete(&format!("{}:{}", keys::TENANT_NAME, tenant.name))
            .await
    }

    pub async fn get_client(&self, id: StringUuid) -> Result<Option<Client>> {
        self.get(&format!("{}:{}", keys::CLIENT, id)).await
    }

    pub async fn get_client_by_name(&self, name: &str) -> Result<Option<Client>> {
        self.get(&format!("{}:{}", keys::CLIENT_NAME, name)).await
    }

    pub async fn set_client(&self, client: &Client) -> Result<()> {
        let ttl = Duration::from_secs(ttl::CLIENT_SECS);
        self.set(&format!("{}:{}", keys::CLIENT, client.id), client, ttl)
            .await?;
        self.set(
            &format!("{}:{}", keys::CLIENT_NAME, client.name),
            client,
            ttl,
        )
        .await
    }

    pub async fn invalidate_client(&self, client: &Client) -> Result<()> {
        self.delete(&format!("{}:{}", keys::CLIENT, client.id)).await?;
        self.delete(&format!("{}:{}", keys::CLIENT_NAME, client.name))
            .await
    }
}
