//! Shared application state
//!
//! Owns the fully-wired service layer: repositories over one connection
//! pool, services over those repositories, and the producer handle of
//! the domain event queue. Built once at startup; the transport layer
//! (external to this crate) clones what it needs per request.

use std::sync::Arc;

use sqlx::MySqlPool;

use crate::cache::CacheManager;
use crate::config::Config;
use crate::events::EventBus;
use crate::jwt::JwtManager;
use crate::repository::{ClientRepositoryImpl, TenantRepositoryImpl, UserRepositoryImpl};
use crate::service::{
    Argon2PasswordVerifier, AuthService, ClientResolutionService, ClientService, TenantService,
    UserService,
};

pub struct AppState {
    pub config: Config,
    pub db_pool: MySqlPool,
    pub event_bus: EventBus,
    pub tenant_service: Arc<TenantService<TenantRepositoryImpl, ClientRepositoryImpl>>,
    pub client_service: Arc<ClientService<ClientRepositoryImpl>>,
    pub user_service: Arc<UserService<UserRepositoryImpl, TenantRepositoryImpl>>,
    pub auth_service:
        Arc<AuthService<TenantRepositoryImpl, UserRepositoryImpl, Argon2PasswordVerifier>>,
    pub resolution_service: Arc<ClientResolutionService<ClientRepositoryImpl, TenantRepositoryImpl>>,
}

impl AppState {
    pub fn build(
        config: Config,
        db_pool: MySqlPool,
        cache_manager: Option<CacheManager>,
        event_bus: EventBus,
    ) -> Self {
        let tenant_repo = Arc::new(TenantRepositoryImpl::new(db_pool.clone()));
        let client_repo = Arc::new(ClientRepositoryImpl::new(db_pool.clone()));
        let user_repo = Arc::new(UserRepositoryImpl::new(db_pool.clone()));

        let jwt_manager = JwtManager::new(config.jwt.clone());

        let tenant_service = Arc::new(TenantService::new(
            tenant_repo.clone(),
            client_repo.clone(),
            cache_manager.clone(),
        ));
        let client_service = Arc::new(ClientService::new(
            client_repo.clone(),
            cache_manager.clone(),
        ));
        let user_service = Arc::new(UserService::new(
            user_repo.clone(),
            tenant_repo.clone(),
            event_bus.clone(),
        ));
        let auth_service = Arc::new(AuthService::new(
            tenant_repo.clone(),
            user_repo.clone(),
            Arc::new(Argon2PasswordVerifier),
            jwt_manager,
        ));
        let resolution_service = Arc::new(ClientResolutionService::new(
            client_repo,
            tenant_repo,
            cache_manager,
        ));

        Self {
            config,
            db_pool,
            event_bus,
            tenant_service,
            client_service,
            user_service,
            auth_service,
            resolution_service,
        }
    }
}
