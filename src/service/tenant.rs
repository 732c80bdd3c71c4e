//! Tenant business logic
//!
//! Every write invalidates the cached raw rows; reads go through the cache
//! when one is configured.

use crate::cache::CacheManager;
use crate::domain::{CreateTenantInput, StringUuid, Tenant, UpdateTenantInput};
use crate::error::{AppError, Result};
use crate::repository::{ClientRepository, TenantRepository};
use std::sync::Arc;
use validator::Validate;

pub struct TenantService<T: TenantRepository, C: ClientRepository> {
    repo: Arc<T>,
    client_repo: Arc<C>,
    cache_manager: Option<CacheManager>,
}

impl<T: TenantRepository, C: ClientRepository> TenantService<T, C> {
    pub fn new(repo: Arc<T>, client_repo: Arc<C>, cache_manager: Option<CacheManager>) -> Self {
        Self {
            repo,
            client_repo,
            cache_manager,
        }
    }

    pub async fn create(&self, input: CreateTenantInput) -> Result<Tenant> {
        input.validate()?;

        if self.repo.find_by_name(&input.name).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "Tenant with name '{}' already exists",
                input.name
            )));
        }

        let tenant = Tenant::new(
            &input.name,
            &input.display_name,
            StringUuid::from(input.configuration_id),
        )?;
        self.repo.create(&tenant).await
    }

    pub async fn get(&self, id: StringUuid) -> Result<Tenant> {
        if let Some(cache) = &self.cache_manager {
            if let Ok(Some(tenant)) = cache.get_tenant(id).await {
                return Ok(tenant);
            }
        }
        let tenant = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Tenant {} not found", id)))?;
        if let Some(cache) = &self.cache_manager {
            let _ = cache.set_tenant(&tenant).await;
        }
        Ok(tenant)
    }

    pub async fn get_by_name(&self, name: &str) -> Result<Tenant> {
        if let Some(cache) = &self.cache_manager {
            if let Ok(Some(tenant)) = cache.get_tenant_by_name(name).await {
                return Ok(tenant);
            }
        }
        let tenant = self
            .repo
            .find_by_name(name)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Tenant '{}' not found", name)))?;
        if let Some(cache) = &self.cache_manager {
            let _ = cache.set_tenant(&tenant).await;
        }
        Ok(tenant)
    }

    pub async fn list(&self, page: i64, per_page: i64) -> Result<(Vec<Tenant>, i64)> {
        let offset = (page - 1) * per_page;
        let tenants = self.repo.list(offset, per_page).await?;
        let total = self.repo.count().await?;
        Ok((tenants, total))
    }

    pub async fn update(&self, id: StringUuid, input: UpdateTenantInput) -> Result<Tenant> {
        input.validate()?;
        self.mutate(id, |tenant| {
            if let Some(display_name) = &input.display_name {
                tenant.display_name = display_name.clone();
            }
            if let Some(endpoint) = &input.notify_endpoint {
                tenant.notify_endpoint = Some(endpoint.clone());
            }
            if let Some(api_key) = &input.notify_api_key {
                tenant.notify_api_key = Some(api_key.clone());
            }
            Ok(())
        })
        .await
    }

    pub async fn add_return_url(&self, id: StringUuid, url: &str) -> Result<Tenant> {
        self.mutate(id, |tenant| tenant.add_return_url(url)).await
    }

    pub async fn remove_return_url(&self, id: StringUuid, url: &str) -> Result<Tenant> {
        self.mutate(id, |tenant| {
            tenant.remove_return_url(url);
            Ok(())
        })
        .await
    }

    pub async fn add_cors_origin(&self, id: StringUuid, origin: &str) -> Result<Tenant> {
        self.mutate(id, |tenant| tenant.add_cors_origin(origin)).await
    }

    pub async fn remove_cors_origin(&self, id: StringUuid, origin: &str) -> Result<Tenant> {
        self.mutate(id, |tenant| {
            tenant.remove_cors_origin(origin);
            Ok(())
        })
        .await
    }

    pub async fn add_url_alias(&self, id: StringUuid, alias: &str) -> Result<Tenant> {
        self.mutate(id, |tenant| {
            tenant.add_url_alias(alias);
            Ok(())
        })
        .await
    }

    /// Associate the tenant with a client registration. The client must exist.
    pub async fn set_client(&self, id: StringUuid, client_id: StringUuid) -> Result<Tenant> {
        if self.client_repo.find_by_id(client_id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "Client {} not found",
                client_id
            )));
        }
        self.mutate(id, |tenant| {
            tenant.set_client(client_id);
            Ok(())
        })
        .await
    }

    pub async fn clear_client(&self, id: StringUuid) -> Result<Tenant> {
        self.mutate(id, |tenant| {
            tenant.clear_client();
            Ok(())
        })
        .await
    }

    pub async fn activate(&self, id: StringUuid) -> Result<Tenant> {
        self.mutate(id, |tenant| {
            tenant.activate();
            Ok(())
        })
        .await
    }

    pub async fn deactivate(&self, id: StringUuid) -> Result<Tenant> {
        self.mutate(id, |tenant| {
            tenant.deactivate();
            Ok(())
        })
        .await
    }

    /// Load from the store (never the cache), mutate, persist, invalidate.
    async fn mutate<F>(&self, id: StringUuid, apply: F) -> Result<Tenant>
    where
        F: FnOnce(&mut Tenant) -> Result<()>,
    {
        let mut tenant = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Tenant {} not found", id)))?;
        apply(&mut tenant)?;
        let updated = self.repo.update(&tenant).await?;
        if let Some(cache) = &self.cache_manager {
            let _ = cache.invalidate_tenant(&updated).await;
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::client::MockClientRepository;
    use crate::repository::tenant::MockTenantRepository;
    use mockall::predicate::eq;
    use uuid::Uuid;

    fn create_input(name: &str) -> CreateTenantInput {
        CreateTenantInput {
            name: name.to_string(),
            display_name: "Acme Corp".to_string(),
            configuration_id: Uuid::new_v4(),
        }
    }

    fn service(
        repo: MockTenantRepository,
        client_repo: MockClientRepository,
    ) -> TenantService<MockTenantRepository, MockClientRepository> {
        TenantService::new(Arc::new(repo), Arc::new(client_repo), None)
    }

    #[tokio::test]
    async fn test_create_success() {
        let mut repo = MockTenantRepository::new();
        repo.expect_find_by_name()
            .with(eq("acme"))
            .returning(|_| Ok(None));
        repo.expect_create().returning(|tenant| Ok(tenant.clone()));

        let svc = service(repo, MockClientRepository::new());
        let tenant = svc.create(create_input("acme")).await.unwrap();
        assert_eq!(tenant.name, "acme");
        assert!(tenant.is_active);
    }

    #[tokio::test]
    async fn test_create_duplicate_name_conflicts() {
        let existing = Tenant::new("acme", "Acme", StringUuid::new_v4()).unwrap();
        let mut repo = MockTenantRepository::new();
        repo.expect_find_by_name()
            .returning(move |_| Ok(Some(existing.clone())));

        let svc = service(repo, MockClientRepository::new());
        let result = svc.create(create_input("acme")).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_bad_name() {
        let svc = service(MockTenantRepository::new(), MockClientRepository::new());
        let result = svc.create(create_input("Not Valid")).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_add_return_url_persists() {
        let tenant = Tenant::new("acme", "Acme", StringUuid::new_v4()).unwrap();
        let id = tenant.id;
        let mut repo = MockTenantRepository::new();
        repo.expect_find_by_id()
            .with(eq(id))
            .returning(move |_| Ok(Some(tenant.clone())));
        repo.expect_update().returning(|tenant| {
            assert_eq!(tenant.return_urls, vec!["https://acme.example/cb"]);
            Ok(tenant.clone())
        });

        let svc = service(repo, MockClientRepository::new());
        let updated = svc
            .add_return_url(id, "https://acme.example/cb")
            .await
            .unwrap();
        assert_eq!(updated.return_urls.len(), 1);
    }

    #[tokio::test]
    async fn test_add_invalid_return_url_does_not_write() {
        let tenant = Tenant::new("acme", "Acme", StringUuid::new_v4()).unwrap();
        let id = tenant.id;
        let mut repo = MockTenantRepository::new();
        repo.expect_find_by_id()
            .returning(move |_| Ok(Some(tenant.clone())));

        let svc = service(repo, MockClientRepository::new());
        let result = svc.add_return_url(id, "not-a-url").await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_set_client_requires_existing_client() {
        let tenant = Tenant::new("acme", "Acme", StringUuid::new_v4()).unwrap();
        let id = tenant.id;
        let client_id = StringUuid::new_v4();

        let mut client_repo = MockClientRepository::new();
        client_repo
            .expect_find_by_id()
            .with(eq(client_id))
            .returning(|_| Ok(None));

        let svc = service(MockTenantRepository::new(), client_repo);
        let result = svc.set_client(id, client_id).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_deactivate_clears_active_flag() {
        let tenant = Tenant::new("acme", "Acme", StringUuid::new_v4()).unwrap();
        let id = tenant.id;
        let mut repo = MockTenantRepository::new();
        repo.expect_find_by_id()
            .returning(move |_| Ok(Some(tenant.clone())));
        repo.expect_update().returning(|tenant| Ok(tenant.clone()));

        let svc = service(repo, MockClientRepository::new());
        let updated = svc.deactivate(id).await.unwrap();
        assert!(!updated.is_active);
    }
}
