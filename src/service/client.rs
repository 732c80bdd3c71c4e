//! Client business logic

use crate::cache::CacheManager;
use crate::domain::{Client, ClientWithSecret, CreateClientInput, StringUuid, UpdateClientInput};
use crate::error::{AppError, Result};
use crate::repository::ClientRepository;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};
use chrono::Utc;
use rand::Rng;
use std::sync::Arc;
use validator::Validate;

pub struct ClientService<R: ClientRepository> {
    repo: Arc<R>,
    cache_manager: Option<CacheManager>,
}

impl<R: ClientRepository> ClientService<R> {
    pub fn new(repo: Arc<R>, cache_manager: Option<CacheManager>) -> Self {
        Self {
            repo,
            cache_manager,
        }
    }

    /// Create a client. When the client requires a secret, one is generated
    /// and returned in plaintext exactly once.
    pub async fn create(&self, input: CreateClientInput) -> Result<ClientWithSecret> {
        input.validate()?;

        if self.repo.find_by_name(&input.name).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "Client with name '{}' already exists",
                input.name
            )));
        }

        let (secret, secret_hash) = if input.require_client_secret {
            let secret = generate_client_secret();
            let hash = hash_secret(&secret)?;
            (Some(secret), Some(hash))
        } else {
            (None, None)
        };

        let client = Client {
            name: input.name,
            allowed_scopes: input.allowed_scopes,
            require_client_secret: input.require_client_secret,
            require_consent: input.require_consent,
            require_mfa: input.require_mfa,
            secret_hash,
            ..Default::default()
        };

        let client = self.repo.create(&client).await?;
        if let Some(cache) = &self.cache_manager {
            let _ = cache.set_client(&client).await;
        }

        Ok(ClientWithSecret {
            client,
            client_secret: secret,
        })
    }

    pub async fn get(&self, id: StringUuid) -> Result<Client> {
        if let Some(cache) = &self.cache_manager {
            if let Ok(Some(client)) = cache.get_client(id).await {
                return Ok(client);
            }
        }
        let client = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Client {} not found", id)))?;
        if let Some(cache) = &self.cache_manager {
            let _ = cache.set_client(&client).await;
        }
        Ok(client)
    }

    pub async fn get_by_name(&self, name: &str) -> Result<Client> {
        let client = self
            .repo
            .find_by_name(name)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Client '{}' not found", name)))?;
        if let Some(cache) = &self.cache_manager {
            let _ = cache.set_client(&client).await;
        }
        Ok(client)
    }

    pub async fn list(&self, page: i64, per_page: i64) -> Result<(Vec<Client>, i64)> {
        let offset = (page - 1) * per_page;
        let clients = self.repo.list(offset, per_page).await?;
        let total = self.repo.count().await?;
        Ok((clients, total))
    }

    pub async fn update(&self, id: StringUuid, input: UpdateClientInput) -> Result<Client> {
        input.validate()?;
        let mut client = self.get(id).await?;

        if let Some(scopes) = input.allowed_scopes {
            client.allowed_scopes = scopes;
        }
        if let Some(v) = input.require_client_secret {
            client.require_client_secret = v;
        }
        if let Some(v) = input.require_consent {
            client.require_consent = v;
        }
        if let Some(v) = input.require_mfa {
            client.require_mfa = v;
        }
        if let Some(v) = input.is_active {
            client.is_active = v;
        }
        client.updated_at = Utc::now();

        let updated = self.repo.update(&client).await?;
        if let Some(cache) = &self.cache_manager {
            let _ = cache.invalidate_client(&updated).await;
        }
        Ok(updated)
    }

    pub async fn regenerate_secret(&self, id: StringUuid) -> Result<String> {
        let client = self.get(id).await?;

        let secret = generate_client_secret();
        let hash = hash_secret(&secret)?;
        self.repo.update_secret(id, &hash).await?;
        if let Some(cache) = &self.cache_manager {
            let _ = cache.invalidate_client(&client).await;
        }
        Ok(secret)
    }

    pub async fn verify_secret(&self, name: &str, secret: &str) -> Result<Client> {
        let client = self.get_by_name(name).await?;

        let hash = client.secret_hash.as_deref().ok_or_else(|| {
            AppError::Unauthorized("Client has no secret configured".to_string())
        })?;
        if verify_secret(secret, hash)? {
            Ok(client)
        } else {
            Err(AppError::Unauthorized(
                "Invalid client credentials".to_string(),
            ))
        }
    }

    pub async fn delete(&self, id: StringUuid) -> Result<()> {
        let client = self.get(id).await?;
        self.repo.delete(id).await?;
        if let Some(cache) = &self.cache_manager {
            let _ = cache.invalidate_client(&client).await;
        }
        Ok(())
    }
}

/// Generate a cryptographically secure client secret
fn generate_client_secret() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    base64::Engine::encode(&base64::engine::general_purpose::URL_SAFE_NO_PAD, bytes)
}

/// Hash a client secret using Argon2
fn hash_secret(secret: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(secret.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to hash secret: {}", e)))?;
    Ok(hash.to_string())
}

/// Verify a client secret against its hash
fn verify_secret(secret: &str, hash: &str) -> Result<bool> {
    use argon2::{PasswordHash, PasswordVerifier};

    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Invalid hash: {}", e)))?;

    Ok(Argon2::default()
        .verify_password(secret.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::client::MockClientRepository;
    use mockall::predicate::eq;

    fn create_input(name: &str, require_secret: bool) -> CreateClientInput {
        CreateClientInput {
            name: name.to_string(),
            allowed_scopes: vec!["openid".to_string()],
            require_client_secret: require_secret,
            require_consent: false,
            require_mfa: false,
        }
    }

    #[test]
    fn test_generate_client_secret() {
        let secret1 = generate_client_secret();
        let secret2 = generate_client_secret();

        // 32 bytes base64 encoded without padding
        assert_eq!(secret1.len(), 43);
        assert_ne!(secret1, secret2);
    }

    #[test]
    fn test_hash_and_verify_secret() {
        let secret = "test-secret-123";
        let hash = hash_secret(secret).unwrap();

        assert!(verify_secret(secret, &hash).unwrap());
        assert!(!verify_secret("wrong-secret", &hash).unwrap());
    }

    #[tokio::test]
    async fn test_create_with_secret() {
        let mut repo = MockClientRepository::new();
        repo.expect_find_by_name()
            .with(eq("spa"))
            .returning(|_| Ok(None));
        repo.expect_create().returning(|client| Ok(client.clone()));

        let svc = ClientService::new(Arc::new(repo), None);
        let created = svc.create(create_input("spa", true)).await.unwrap();
        assert!(created.client_secret.is_some());
        assert!(created.client.secret_hash.is_some());
    }

    #[tokio::test]
    async fn test_create_public_client_has_no_secret() {
        let mut repo = MockClientRepository::new();
        repo.expect_find_by_name().returning(|_| Ok(None));
        repo.expect_create().returning(|client| Ok(client.clone()));

        let svc = ClientService::new(Arc::new(repo), None);
        let created = svc.create(create_input("spa", false)).await.unwrap();
        assert!(created.client_secret.is_none());
        assert!(created.client.secret_hash.is_none());
    }

    #[tokio::test]
    async fn test_create_duplicate_name_conflicts() {
        let mut repo = MockClientRepository::new();
        repo.expect_find_by_name()
            .returning(|_| Ok(Some(Client::default())));

        let svc = ClientService::new(Arc::new(repo), None);
        let result = svc.create(create_input("spa", true)).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_short_name() {
        let svc = ClientService::new(Arc::new(MockClientRepository::new()), None);
        let result = svc.create(create_input("ab", true)).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_verify_secret_round_trip() {
        let secret = generate_client_secret();
        let hash = hash_secret(&secret).unwrap();
        let client = Client {
            name: "spa".to_string(),
            secret_hash: Some(hash),
            ..Default::default()
        };
        let client_clone = client.clone();

        let mut repo = MockClientRepository::new();
        repo.expect_find_by_name()
            .returning(move |_| Ok(Some(client_clone.clone())));

        let svc = ClientService::new(Arc::new(repo), None);
        assert!(svc.verify_secret("spa", &secret).await.is_ok());
        assert!(matches!(
            svc.verify_secret("spa", "wrong").await,
            Err(AppError::Unauthorized(_))
        ));
    }
}
