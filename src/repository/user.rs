//! User repository
//!
//! The users table carries a composite unique index on (email, tenant_id).
//! That index is the contract that lets the same address register
//! independently under two different tenants.

use super::map_unique_violation;
use crate::domain::{StringUuid, User};
use crate::error::Result;
use async_trait::async_trait;
use sqlx::MySqlPool;

const USER_COLUMNS: &str = "id, tenant_id, email, first_name, last_name, email_confirmed, \
     mfa_enabled, status, password_hash, role, scopes, activated_at, created_at, updated_at";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: &User) -> Result<User>;
    async fn find_by_id(&self, id: StringUuid) -> Result<Option<User>>;
    /// Composite-key lookup; the only way to resolve a user within a tenant.
    async fn find_by_email_in_tenant(
        &self,
        email: &str,
        tenant_id: StringUuid,
    ) -> Result<Option<User>>;
    /// Wildcard-selector lookup; earliest-created match wins.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn list_by_tenant(
        &self,
        tenant_id: StringUuid,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<User>>;
    async fn count_by_tenant(&self, tenant_id: StringUuid) -> Result<i64>;
    async fn update(&self, user: &User) -> Result<User>;
    async fn set_password_hash(&self, id: StringUuid, hash: &str) -> Result<()>;
}

pub struct UserRepositoryImpl {
    pool: MySqlPool,
}

impl UserRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for UserRepositoryImpl {
    async fn create(&self, user: &User) -> Result<User> {
        sqlx::query(
            r#"
            INSERT INTO users (id, tenant_id, email, first_name, last_name, email_confirmed,
                               mfa_enabled, status, password_hash, role, scopes, activated_at,
                               created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user.id)
        .bind(user.tenant_id)
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.email_confirmed)
        .bind(user.mfa_enabled)
        .bind(user.status)
        .bind(&user.password_hash)
        .bind(&user.role)
        .bind(serde_json::to_string(&user.scopes).unwrap_or_default())
        .bind(user.activated_at)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            map_unique_violation(
                e,
                format!(
                    "User with email '{}' already exists in tenant {}",
                    user.email, user.tenant_id
                ),
            )
        })?;

        Ok(user.clone())
    }

    async fn find_by_id(&self, id: StringUuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = ?",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_email_in_tenant(
        &self,
        email: &str,
        tenant_id: StringUuid,
    ) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE email = ? AND tenant_id = ?",
            USER_COLUMNS
        ))
        .bind(email)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE email = ? ORDER BY created_at LIMIT 1",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn list_by_tenant(
        &self,
        tenant_id: StringUuid,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE tenant_id = ? ORDER BY created_at LIMIT ? OFFSET ?",
            USER_COLUMNS
        ))
        .bind(tenant_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn count_by_tenant(&self, tenant_id: StringUuid) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE tenant_id = ?")
            .bind(tenant_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0)
    }

    async fn update(&self, user: &User) -> Result<User> {
        sqlx::query(
            r#"
            UPDATE users
            SET first_name = ?, last_name = ?, email_confirmed = ?, mfa_enabled = ?,
                status = ?, password_hash = ?, role = ?, scopes = ?, activated_at = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.email_confirmed)
        .bind(user.mfa_enabled)
        .bind(user.status)
        .bind(&user.password_hash)
        .bind(&user.role)
        .bind(serde_json::to_string(&user.scopes).unwrap_or_default())
        .bind(user.activated_at)
        .bind(user.updated_at)
        .bind(user.id)
        .execute(&self.pool)
        .await?;

        Ok(user.clone())
    }

    async fn set_password_hash(&self, id: StringUuid, hash: &str) -> Result<()> {
        sqlx::query("UPDATE users SET password_hash = ?, updated_at = NOW() WHERE id = ?")
            .bind(hash)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
