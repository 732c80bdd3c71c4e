//! User business logic
//!
//! Orchestrates lifecycle transitions: load the aggregate, run the domain
//! mutation, persist, then drain the recorded events into the bus. Events
//! are published only after the write has succeeded.

use crate::domain::{ActivationPolicy, RegisterUserInput, StringUuid, User};
use crate::error::{AppError, Result};
use crate::events::EventBus;
use crate::repository::{TenantRepository, UserRepository};
use std::sync::Arc;
use validator::Validate;

pub struct UserService<U: UserRepository, T: TenantRepository> {
    repo: Arc<U>,
    tenant_repo: Arc<T>,
    events: EventBus,
}

impl<U: UserRepository, T: TenantRepository> UserService<U, T> {
    pub fn new(repo: Arc<U>, tenant_repo: Arc<T>, events: EventBus) -> Self {
        Self {
            repo,
            tenant_repo,
            events,
        }
    }

    /// Register a new user under a tenant.
    ///
    /// Email uniqueness is scoped to the tenant: the pre-check and the
    /// composite unique index both map duplicates to `Conflict`, while the
    /// same email under another tenant registers independently.
    pub async fn register(
        &self,
        tenant_id: StringUuid,
        input: RegisterUserInput,
        policy: ActivationPolicy,
    ) -> Result<User> {
        input.validate()?;

        let tenant = self
            .tenant_repo
            .find_by_id(tenant_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Tenant {} not found", tenant_id)))?;
        if !tenant.is_active {
            return Err(AppError::Forbidden(format!(
                "Tenant '{}' is not active",
                tenant.name
            )));
        }

        let email = input.email.trim().to_lowercase();
        if self
            .repo
            .find_by_email_in_tenant(&email, tenant_id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(format!(
                "User with email '{}' already exists in tenant '{}'",
                email, tenant.name
            )));
        }

        let mut user = User::register(
            tenant_id,
            &email,
            &input.first_name,
            &input.last_name,
            &input.role,
            policy,
        )?;

        self.repo.create(&user).await?;
        self.events.publish_all(user.take_events()).await?;
        Ok(user)
    }

    pub async fn get(&self, id: StringUuid) -> Result<User> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
    }

    pub async fn get_by_email_in_tenant(
        &self,
        email: &str,
        tenant_id: StringUuid,
    ) -> Result<User> {
        let email = email.trim().to_lowercase();
        self.repo
            .find_by_email_in_tenant(&email, tenant_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User '{}' not found", email)))
    }

    pub async fn list_by_tenant(
        &self,
        tenant_id: StringUuid,
        page: i64,
        per_page: i64,
    ) -> Result<(Vec<User>, i64)> {
        let offset = (page - 1) * per_page;
        let users = self.repo.list_by_tenant(tenant_id, offset, per_page).await?;
        let total = self.repo.count_by_tenant(tenant_id).await?;
        Ok((users, total))
    }

    /// Store the hash produced by the external credential store.
    pub async fn set_password_hash(&self, id: StringUuid, hash: &str) -> Result<()> {
        let _ = self.get(id).await?;
        self.repo.set_password_hash(id, hash).await
    }

    pub async fn confirm_email(&self, id: StringUuid) -> Result<User> {
        self.transition(id, |user| user.confirm_email()).await
    }

    pub async fn activate(&self, id: StringUuid) -> Result<User> {
        self.transition(id, |user| user.activate()).await
    }

    pub async fn suspend(&self, id: StringUuid, reason: &str) -> Result<User> {
        self.transition(id, |user| user.suspend(reason)).await
    }

    pub async fn deactivate(&self, id: StringUuid) -> Result<User> {
        self.transition(id, |user| user.deactivate()).await
    }

    /// Load, mutate, persist, then publish the drained events.
    async fn transition<F>(&self, id: StringUuid, mutate: F) -> Result<User>
    where
        F: FnOnce(&mut User) -> Result<()>,
    {
        let mut user = self.get(id).await?;
        mutate(&mut user)?;
        self.repo.update(&user).await?;
        self.events.publish_all(user.take_events()).await?;
        Ok(user)
    }
}
