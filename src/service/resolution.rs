//! Client resolution engine
//!
//! Turns stored Client + Tenant records into an ephemeral, protocol-ready
//! descriptor. The aggregation is recomputed on every lookup so that tenant
//! URL changes take effect without any invalidation step; only the raw row
//! reads may go through the cache.

use crate::cache::CacheManager;
use crate::domain::{Client, ClientDescriptor, ClientResolution, StringUuid, Tenant};
use crate::error::Result;
use crate::repository::{ClientRepository, TenantRepository};
use std::sync::Arc;
use tracing::{debug, warn};

pub struct ClientResolutionService<C: ClientRepository, T: TenantRepository> {
    client_repo: Arc<C>,
    tenant_repo: Arc<T>,
    cache_manager: Option<CacheManager>,
}

impl<C: ClientRepository, T: TenantRepository> ClientResolutionService<C, T> {
    pub fn new(
        client_repo: Arc<C>,
        tenant_repo: Arc<T>,
        cache_manager: Option<CacheManager>,
    ) -> Self {
        Self {
            client_repo,
            tenant_repo,
            cache_manager,
        }
    }

    /// Resolve a client identifier (id or name) into a protocol-ready
    /// descriptor.
    ///
    /// `NotVisible` means the client exists but has no active tenant with a
    /// usable return URL; the protocol engine must treat it exactly like
    /// `NotFound`.
    pub async fn resolve(&self, identifier: &str) -> Result<ClientResolution> {
        let client = match self.load_client(identifier).await? {
            Some(client) => client,
            None => {
                debug!(identifier, "Client not found");
                return Ok(ClientResolution::NotFound);
            }
        };

        let tenants = self.tenant_repo.find_by_client_id(client.id).await?;
        let active: Vec<Tenant> = tenants
            .into_iter()
            .filter(|t| {
                if t.is_active {
                    true
                } else {
                    warn!(tenant = %t.name, client = %client.name, "Skipping inactive tenant");
                    false
                }
            })
            .collect();

        if active.is_empty() {
            debug!(client = %client.name, "No active tenants reference this client");
            return Ok(ClientResolution::NotVisible);
        }

        let redirect_uris = union(active.iter().map(|t| &t.return_urls));
        if redirect_uris.is_empty() {
            debug!(client = %client.name, "No usable return URLs across active tenants");
            return Ok(ClientResolution::NotVisible);
        }

        let allowed_cors_origins = union(active.iter().map(|t| &t.cors_origins));

        Ok(ClientResolution::Found(Box::new(ClientDescriptor {
            client_id: client.id,
            client_name: client.name.clone(),
            post_logout_redirect_uris: redirect_uris.clone(),
            redirect_uris,
            allowed_cors_origins,
            allowed_scopes: client.allowed_scopes.clone(),
            require_client_secret: client.require_client_secret,
            require_consent: client.require_consent,
            require_mfa: client.require_mfa,
            enabled: client.is_active,
        })))
    }

    /// Raw client lookup, id first then name, optionally through the cache.
    async fn load_client(&self, identifier: &str) -> Result<Option<Client>> {
        if let Ok(id) = StringUuid::parse_str(identifier) {
            if let Some(cache) = &self.cache_manager {
                if let Ok(Some(client)) = cache.get_client(id).await {
                    return Ok(Some(client));
                }
            }
            if let Some(client) = self.client_repo.find_by_id(id).await? {
                if let Some(cache) = &self.cache_manager {
                    let _ = cache.set_client(&client).await;
                }
                return Ok(Some(client));
            }
        }

        if let Some(cache) = &self.cache_manager {
            if let Ok(Some(client)) = cache.get_client_by_name(identifier).await {
                return Ok(Some(client));
            }
        }
        let client = self.client_repo.find_by_name(identifier).await?;
        if let (Some(cache), Some(client)) = (&self.cache_manager, &client) {
            let _ = cache.set_client(client).await;
        }
        Ok(client)
    }
}

/// Deduplicated union of ordered string sets, preserving first-seen order.
fn union<'a>(sets: impl Iterator<Item = &'a Vec<String>>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for set in sets {
        for value in set {
            if !out.iter().any(|v| v == value) {
                out.push(value.clone());
            }
        }
    }
    out
}
