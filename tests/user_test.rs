//! User repository integration tests
//!
//! The interesting property here is tenant-scoped identity: the same
//! email address may exist once per tenant, never twice within one.

use tessera_core::domain::{ActivationPolicy, StringUuid, Tenant, User, UserStatus};
use tessera_core::repository::tenant::TenantRepositoryImpl;
use tessera_core::repository::user::UserRepositoryImpl;
use tessera_core::repository::{TenantRepository, UserRepository};
use tessera_core::AppError;

mod common;

async fn seed_tenant(repo: &TenantRepositoryImpl, name: &str) -> Tenant {
    let tenant = Tenant::new(name, format!("{} Inc.", name), StringUuid::new_v4()).unwrap();
    repo.create(&tenant).await.unwrap()
}

fn user(tenant_id: StringUuid, email: &str) -> User {
    let mut user = User::register(
        tenant_id,
        email,
        "Ada",
        "Lovelace",
        "member",
        ActivationPolicy::RequireActivation,
    )
    .unwrap();
    user.take_events();
    user
}

#[tokio::test]
async fn test_same_email_in_two_tenants_is_allowed() {
    let pool = match common::get_test_pool().await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("Skipping test: could not connect to database: {}", e);
            return;
        }
    };
    common::setup_database(&pool).await.unwrap();

    let tenant_repo = TenantRepositoryImpl::new(pool.clone());
    let repo = UserRepositoryImpl::new(pool.clone());

    let acme = seed_tenant(&tenant_repo, "acme").await;
    let globex = seed_tenant(&tenant_repo, "globex").await;

    let in_acme = repo.create(&user(acme.id, "ada@example.com")).await.unwrap();
    let in_globex = repo
        .create(&user(globex.id, "ada@example.com"))
        .await
        .unwrap();
    assert_ne!(in_acme.id, in_globex.id);

    let found = repo
        .find_by_email_in_tenant("ada@example.com", acme.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, in_acme.id);
    assert_eq!(found.tenant_id, acme.id);
}

#[tokio::test]
async fn test_duplicate_email_within_tenant_conflicts() {
    let pool = match common::get_test_pool().await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("Skipping test: could not connect to database: {}", e);
            return;
        }
    };
    common::setup_database(&pool).await.unwrap();

    let tenant_repo = TenantRepositoryImpl::new(pool.clone());
    let repo = UserRepositoryImpl::new(pool.clone());

    let acme = seed_tenant(&tenant_repo, "acme").await;

    repo.create(&user(acme.id, "ada@example.com")).await.unwrap();
    let result = repo.create(&user(acme.id, "ada@example.com")).await;
    assert!(matches!(result, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn test_status_survives_update_roundtrip() {
    let pool = match common::get_test_pool().await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("Skipping test: could not connect to database: {}", e);
            return;
        }
    };
    common::setup_database(&pool).await.unwrap();

    let tenant_repo = TenantRepositoryImpl::new(pool.clone());
    let repo = UserRepositoryImpl::new(pool.clone());

    let acme = seed_tenant(&tenant_repo, "acme").await;
    let mut stored = repo.create(&user(acme.id, "ada@example.com")).await.unwrap();

    stored.set_password_hash("$argon2id$fake");
    stored.activate().unwrap();
    stored.take_events();
    repo.update(&stored).await.unwrap();

    let reloaded = repo.find_by_id(stored.id).await.unwrap().unwrap();
    assert_eq!(reloaded.status, UserStatus::Active);
    assert!(reloaded.email_confirmed);
    assert!(reloaded.activated_at.is_some());
    assert_eq!(reloaded.password_hash.as_deref(), Some("$argon2id$fake"));
}

#[tokio::test]
async fn test_find_by_email_prefers_earliest_created() {
    let pool = match common::get_test_pool().await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("Skipping test: could not connect to database: {}", e);
            return;
        }
    };
    common::setup_database(&pool).await.unwrap();

    let tenant_repo = TenantRepositoryImpl::new(pool.clone());
    let repo = UserRepositoryImpl::new(pool.clone());

    let acme = seed_tenant(&tenant_repo, "acme").await;
    let globex = seed_tenant(&tenant_repo, "globex").await;

    let mut first = user(acme.id, "ada@example.com");
    first.created_at = first.created_at - chrono::Duration::seconds(60);
    repo.create(&first).await.unwrap();
    repo.create(&user(globex.id, "ada@example.com")).await.unwrap();

    let found = repo.find_by_email("ada@example.com").await.unwrap().unwrap();
    assert_eq!(found.tenant_id, acme.id);
}

#[tokio::test]
async fn test_list_and_count_by_tenant() {
    let pool = match common::get_test_pool().await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("Skipping test: could not connect to database: {}", e);
            return;
        }
    };
    common::setup_database(&pool).await.unwrap();

    let tenant_repo = TenantRepositoryImpl::new(pool.clone());
    let repo = UserRepositoryImpl::new(pool.clone());

    let acme = seed_tenant(&tenant_repo, "acme").await;
    let globex = seed_tenant(&tenant_repo, "globex").await;

    repo.create(&user(acme.id, "ada@example.com")).await.unwrap();
    repo.create(&user(acme.id, "grace@example.com")).await.unwrap();
    repo.create(&user(globex.id, "alan@example.com")).await.unwrap();

    assert_eq!(repo.count_by_tenant(acme.id).await.unwrap(), 2);
    let listed = repo.list_by_tenant(acme.id, 0, 10).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert!(listed.iter().all(|u| u.tenant_id == acme.id));
}
