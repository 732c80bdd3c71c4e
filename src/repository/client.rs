//! Client repository

use super::map_unique_violation;
use crate::domain::{Client, StringUuid};
use crate::error::Result;
use async_trait::async_trait;
use sqlx::MySqlPool;

const CLIENT_COLUMNS: &str = "id, name, allowed_scopes, require_client_secret, require_consent, \
     require_mfa, is_active, secret_hash, created_at, updated_at";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClientRepository: Send + Sync {
    async fn create(&self, client: &Client) -> Result<Client>;
    async fn find_by_id(&self, id: StringUuid) -> Result<Option<Client>>;
    async fn find_by_name(&self, name: &str) -> Result<Option<Client>>;
    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<Client>>;
    async fn count(&self) -> Result<i64>;
    async fn update(&self, client: &Client) -> Result<Client>;
    async fn update_secret(&self, id: StringUuid, secret_hash: &str) -> Result<()>;
    async fn delete(&self, id: StringUuid) -> Result<()>;
}

pub struct ClientRepositoryImpl {
    pool: MySqlPool,
}

impl ClientRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ClientRepository for ClientRepositoryImpl {
    async fn create(&self, client: &Client) -> Result<Client> {
        sqlx::query(
            r#"
            INSERT INTO clients (id, name, allowed_scopes, require_client_secret, require_consent,
                                 require_mfa, is_active, secret_hash, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(client.id)
        .bind(&client.name)
        .bind(serde_json::to_string(&client.allowed_scopes).unwrap_or_default())
        .bind(client.require_client_secret)
        .bind(client.require_consent)
        .bind(client.require_mfa)
        .bind(client.is_active)
        .bind(&client.secret_hash)
        .bind(client.created_at)
        .bind(client.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            map_unique_violation(e, format!("Client with name '{}' already exists", client.name))
        })?;

        Ok(client.clone())
    }

    async fn find_by_id(&self, id: StringUuid) -> Result<Option<Client>> {
        let client = sqlx::query_as::<_, Client>(&format!(
            "SELECT {} FROM clients WHERE id = ?",
            CLIENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(client)
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Client>> {
        let client = sqlx::query_as::<_, Client>(&format!(
            "SELECT {} FROM clients WHERE name = ?",
            CLIENT_COLUMNS
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(client)
    }

    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<Client>> {
        let clients = sqlx::query_as::<_, Client>(&format!(
            "SELECT {} FROM clients ORDER BY created_at LIMIT ? OFFSET ?",
            CLIENT_COLUMNS
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(clients)
    }

    async fn count(&self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM clients")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0)
    }

    async fn update(&self, client: &Client) -> Result<Client> {
        sqlx::query(
            r#"
            UPDATE clients
            SET allowed_scopes = ?, require_client_secret = ?, require_consent = ?,
                require_mfa = ?, is_active = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(serde_json::to_string(&client.allowed_scopes).unwrap_or_default())
        .bind(client.require_client_secret)
        .bind(client.require_consent)
        .bind(client.require_mfa)
        .bind(client.is_active)
        .bind(client.updated_at)
        .bind(client.id)
        .execute(&self.pool)
        .await?;

        Ok(client.clone())
    }

    async fn update_secret(&self, id: StringUuid, secret_hash: &str) -> Result<()> {
        sqlx::query("UPDATE clients SET secret_hash = ?, updated_at = NOW() WHERE id = ?")
            .bind(secret_hash)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete(&self, id: StringUuid) -> Result<()> {
        sqlx::query("DELETE FROM clients WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
