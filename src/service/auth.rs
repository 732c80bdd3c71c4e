//! Tenant-scoped authentication
//!
//! Every gate short-circuits, and every credential-shaped failure collapses
//! into the same uninformative rejection so that neither users nor tenant
//! memberships can be enumerated.

use crate::domain::{AuthOutcome, RejectReason, StringUuid, Tenant, User};
use crate::error::{AppError, Result};
use crate::jwt::JwtManager;
use crate::repository::{TenantRepository, UserRepository};
use argon2::{Argon2, PasswordHash, PasswordVerifier as _};
use std::sync::Arc;
use tracing::debug;

/// Wildcard selector: no explicit tenant context in the request.
pub const WILDCARD_SELECTOR: &str = "*";

const TENANT_PREFIX: &str = "tenant:";

/// Derive the tenant selector from a space-separated ACR-style value list.
///
/// The first token prefixed `tenant:` wins, with the prefix stripped; an
/// absent or empty list yields the wildcard.
pub fn extract_tenant_selector(acr_values: Option<&str>) -> String {
    acr_values
        .unwrap_or_default()
        .split_whitespace()
        .find_map(|token| token.strip_prefix(TENANT_PREFIX))
        .filter(|s| !s.is_empty())
        .unwrap_or(WILDCARD_SELECTOR)
        .to_string()
}

/// Credential verification seam to the external credential store.
#[cfg_attr(test, mockall::automock)]
pub trait PasswordVerifier: Send + Sync {
    fn verify(&self, hash: &str, candidate: &str) -> Result<bool>;
}

/// Argon2-backed verifier for stores that hand us PHC-format hashes.
pub struct Argon2PasswordVerifier;

impl PasswordVerifier for Argon2PasswordVerifier {
    fn verify(&self, hash: &str, candidate: &str) -> Result<bool> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Invalid hash: {}", e)))?;
        Ok(Argon2::default()
            .verify_password(candidate.as_bytes(), &parsed_hash)
            .is_ok())
    }
}

pub struct AuthService<T: TenantRepository, U: UserRepository, V: PasswordVerifier> {
    tenant_repo: Arc<T>,
    user_repo: Arc<U>,
    verifier: Arc<V>,
    jwt: JwtManager,
}

impl<T: TenantRepository, U: UserRepository, V: PasswordVerifier> AuthService<T, U, V> {
    pub fn new(tenant_repo: Arc<T>, user_repo: Arc<U>, verifier: Arc<V>, jwt: JwtManager) -> Self {
        Self {
            tenant_repo,
            user_repo,
            verifier,
            jwt,
        }
    }

    /// Authenticate `email`/`password` in the tenant context selected by
    /// `acr_values`. No side effects on failure.
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
        acr_values: Option<&str>,
    ) -> Result<AuthOutcome> {
        let email = email.trim().to_lowercase();
        let selector = extract_tenant_selector(acr_values);

        let (user, tenant) = if selector == WILDCARD_SELECTOR {
            match self.resolve_wildcard(&email).await? {
                Some(pair) => pair,
                None => return Ok(AuthOutcome::Rejected(RejectReason::InvalidCredentials)),
            }
        } else {
            let tenant = match self.tenant_repo.find_by_name(&selector).await? {
                Some(t) if t.is_active => t,
                _ => {
                    debug!(selector, "Unknown or inactive tenant selector");
                    return Ok(AuthOutcome::Rejected(RejectReason::InvalidTenant));
                }
            };

            // Resolution by exact name satisfies the selector predicate;
            // the assertion marks the enforcement point should resolution
            // ever admit aliases or return-URL hosts.
            debug_assert!(tenant.accepts_selector(&selector));

            let user = match self
                .user_repo
                .find_by_email_in_tenant(&email, tenant.id)
                .await?
            {
                Some(u) => u,
                None => return Ok(AuthOutcome::Rejected(RejectReason::InvalidCredentials)),
            };

            (user, tenant)
        };

        if !user.can_login() {
            return Ok(AuthOutcome::Rejected(RejectReason::InvalidCredentials));
        }

        let hash = match &user.password_hash {
            Some(h) => h,
            None => return Ok(AuthOutcome::Rejected(RejectReason::InvalidCredentials)),
        };
        if !self.verifier.verify(hash, password)? {
            return Ok(AuthOutcome::Rejected(RejectReason::InvalidCredentials));
        }

        let session = self.jwt.issue_session(&user, &tenant)?;
        Ok(AuthOutcome::Success(Box::new(session)))
    }

    /// Wildcard path: resolve by email alone, then gate on the owning tenant.
    /// Tenant problems stay indistinguishable from credential problems here.
    async fn resolve_wildcard(&self, email: &str) -> Result<Option<(User, Tenant)>> {
        let user = match self.user_repo.find_by_email(email).await? {
            Some(u) => u,
            None => return Ok(None),
        };
        let tenant = match self.tenant_repo.find_by_id(user.tenant_id).await? {
            Some(t) if t.is_active => t,
            _ => return Ok(None),
        };
        Ok(Some((user, tenant)))
    }
}
