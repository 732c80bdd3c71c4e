//! Client resolution integration tests
//!
//! End-to-end over real repositories: descriptors are synthesized from the
//! client row plus the aggregated URLs of its active associated tenants.

use std::sync::Arc;

use tessera_core::domain::{Client, ClientResolution, StringUuid, Tenant};
use tessera_core::repository::client::ClientRepositoryImpl;
use tessera_core::repository::tenant::TenantRepositoryImpl;
use tessera_core::repository::{ClientRepository, TenantRepository};
use tessera_core::service::ClientResolutionService;

mod common;

async fn seed_client(repo: &ClientRepositoryImpl, name: &str) -> Client {
    let client = Client {
        name: name.to_string(),
        allowed_scopes: vec!["openid".to_string(), "profile".to_string()],
        ..Client::default()
    };
    repo.create(&client).await.unwrap()
}

async fn seed_tenant(
    repo: &TenantRepositoryImpl,
    name: &str,
    client_id: StringUuid,
    return_urls: &[&str],
) -> Tenant {
    let mut tenant =
        Tenant::new(name, format!("{} Inc.", name), StringUuid::new_v4()).unwrap();
    tenant.set_client(client_id);
    for url in return_urls {
        tenant.add_return_url(url).unwrap();
    }
    repo.create(&tenant).await.unwrap()
}

#[tokio::test]
async fn test_resolve_aggregates_active_tenants() {
    let pool = match common::get_test_pool().await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("Skipping test: could not connect to database: {}", e);
            return;
        }
    };
    common::setup_database(&pool).await.unwrap();

    let client_repo = Arc::new(ClientRepositoryImpl::new(pool.clone()));
    let tenant_repo = Arc::new(TenantRepositoryImpl::new(pool.clone()));

    let client = seed_client(&client_repo, "portal").await;
    seed_tenant(
        &tenant_repo,
        "acme",
        client.id,
        &["https://app.acme.example/callback"],
    )
    .await;
    let mut globex = seed_tenant(
        &tenant_repo,
        "globex",
        client.id,
        &["https://globex.example/cb", "https://app.acme.example/callback"],
    )
    .await;

    let svc = ClientResolutionService::new(client_repo.clone(), tenant_repo.clone(), None);

    let descriptor = match svc.resolve(&client.id.to_string()).await.unwrap() {
        ClientResolution::Found(d) => d,
        other => panic!("expected Found, got {:?}", other),
    };
    assert_eq!(descriptor.client_name, "portal");
    // Union preserves first-seen order and drops the duplicate callback.
    assert_eq!(
        descriptor.redirect_uris,
        vec![
            "https://app.acme.example/callback".to_string(),
            "https://globex.example/cb".to_string(),
        ]
    );
    assert!(descriptor.enabled);

    // Name-based lookup resolves to the same descriptor.
    let by_name = match svc.resolve("portal").await.unwrap() {
        ClientResolution::Found(d) => d,
        other => panic!("expected Found, got {:?}", other),
    };
    assert_eq!(by_name, descriptor);

    // Deactivating a tenant removes its URLs from the aggregate.
    globex.deactivate();
    tenant_repo.update(&globex).await.unwrap();
    let after = match svc.resolve("portal").await.unwrap() {
        ClientResolution::Found(d) => d,
        other => panic!("expected Found, got {:?}", other),
    };
    assert_eq!(
        after.redirect_uris,
        vec!["https://app.acme.example/callback".to_string()]
    );
}

#[tokio::test]
async fn test_resolve_unknown_client_is_not_found() {
    let pool = match common::get_test_pool().await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("Skipping test: could not connect to database: {}", e);
            return;
        }
    };
    common::setup_database(&pool).await.unwrap();

    let client_repo = Arc::new(ClientRepositoryImpl::new(pool.clone()));
    let tenant_repo = Arc::new(TenantRepositoryImpl::new(pool.clone()));
    let svc = ClientResolutionService::new(client_repo, tenant_repo, None);

    let result = svc.resolve(&StringUuid::new_v4().to_string()).await.unwrap();
    assert_eq!(result, ClientResolution::NotFound);
}

#[tokio::test]
async fn test_resolve_without_visible_tenants_is_not_visible() {
    let pool = match common::get_test_pool().await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("Skipping test: could not connect to database: {}", e);
            return;
        }
    };
    common::setup_database(&pool).await.unwrap();

    let client_repo = Arc::new(ClientRepositoryImpl::new(pool.clone()));
    let tenant_repo = Arc::new(TenantRepositoryImpl::new(pool.clone()));

    // Client exists but nothing references it.
    let orphan = seed_client(&client_repo, "orphan").await;

    // Second client whose only tenant is inactive.
    let shadowed = seed_client(&client_repo, "shadowed").await;
    let mut tenant = seed_tenant(
        &tenant_repo,
        "acme",
        shadowed.id,
        &["https://app.acme.example/callback"],
    )
    .await;
    tenant.deactivate();
    tenant_repo.update(&tenant).await.unwrap();

    let svc = ClientResolutionService::new(client_repo, tenant_repo, None);

    assert_eq!(
        svc.resolve(&orphan.id.to_string()).await.unwrap(),
        ClientResolution::NotVisible
    );
    assert_eq!(
        svc.resolve(&shadowed.id.to_string()).await.unwrap(),
        ClientResolution::NotVisible
    );
}
