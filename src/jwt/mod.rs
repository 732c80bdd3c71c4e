//! Session token handling

use crate::config::JwtConfig;
use crate::domain::{Session, Tenant, User};
use crate::error::{AppError, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Session token claims.
///
/// Tenant id and name are explicit claims so downstream enrichment can scope
/// role/permission lookups to the authenticated tenant context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (user ID)
    pub sub: String,
    /// Email
    pub email: String,
    /// Authenticated tenant ID
    pub tenant_id: String,
    /// Authenticated tenant name
    pub tenant_name: String,
    /// Role within the tenant
    pub role: String,
    /// Sub-scopes within the tenant
    pub scopes: Vec<String>,
    /// Issuer
    pub iss: String,
    /// Audience
    pub aud: String,
    /// Token type discriminator (prevents token confusion attacks)
    #[serde(default)]
    pub token_type: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
}

/// Session token manager
#[derive(Clone)]
pub struct JwtManager {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
}

impl JwtManager {
    pub fn new(config: JwtConfig) -> Self {
        let algorithm = if config.private_key_pem.is_some() {
            Algorithm::RS256
        } else {
            Algorithm::HS256
        };
        let encoding_key = match config.private_key_pem.as_ref() {
            Some(private_key) => EncodingKey::from_rsa_pem(private_key.as_bytes())
                .expect("Failed to load JWT private key"),
            None => EncodingKey::from_secret(config.secret.as_bytes()),
        };
        let decoding_key = match config.public_key_pem.as_ref() {
            Some(public_key) => DecodingKey::from_rsa_pem(public_key.as_bytes())
                .expect("Failed to load JWT public key"),
            None => match config.private_key_pem.as_ref() {
                Some(private_key) => DecodingKey::from_rsa_pem(private_key.as_bytes())
                    .expect("Failed to load JWT private key"),
                None => DecodingKey::from_secret(config.secret.as_bytes()),
            },
        };
        Self {
            config,
            encoding_key,
            decoding_key,
            algorithm,
        }
    }

    /// Strict leeway (5 seconds) instead of the default 60 seconds.
    fn strict_validation(&self) -> Validation {
        let mut v = Validation::new(self.algorithm);
        v.leeway = 5;
        v.set_audience(&[self.config.audience.clone()]);
        v
    }

    /// Issue a session for an authenticated user in the given tenant context.
    pub fn issue_session(&self, user: &User, tenant: &Tenant) -> Result<Session> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.config.session_ttl_secs);

        let claims = SessionClaims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            tenant_id: tenant.id.to_string(),
            tenant_name: tenant.name.clone(),
            role: user.role.clone(),
            scopes: user.scopes.clone(),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
            token_type: "session".to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        let header = Header::new(self.algorithm);
        let token = encode(&header, &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(e.into()))?;

        Ok(Session {
            token,
            user_id: user.id,
            tenant_id: tenant.id,
            tenant_name: tenant.name.clone(),
            issued_at: now,
            expires_at: exp,
        })
    }

    /// Decode and validate a session token.
    pub fn decode_session(&self, token: &str) -> Result<SessionClaims> {
        let data = decode::<SessionClaims>(token, &self.decoding_key, &self.strict_validation())?;
        if data.claims.token_type != "session" {
            return Err(AppError::Unauthorized(
                "Token is not a session token".to_string(),
            ));
        }
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ActivationPolicy, StringUuid};

    fn manager() -> JwtManager {
        JwtManager::new(JwtConfig {
            secret: "test-secret-key-for-unit-tests".to_string(),
            issuer: "https://tessera.test".to_string(),
            audience: "tessera".to_string(),
            session_ttl_secs: 3600,
            private_key_pem: None,
            public_key_pem: None,
        })
    }

    fn user_and_tenant() -> (User, Tenant) {
        let tenant = Tenant::new("acme", "Acme Corp", StringUuid::new_v4()).unwrap();
        let user = User::register(
            tenant.id,
            "ada@acme.example",
            "Ada",
            "Lovelace",
            "member",
            ActivationPolicy::Immediate,
        )
        .unwrap();
        (user, tenant)
    }

    #[test]
    fn test_session_carries_tenant_claims() {
        let (user, tenant) = user_and_tenant();
        let manager = manager();

        let session = manager.issue_session(&user, &tenant).unwrap();
        assert_eq!(session.tenant_name, "acme");

        let claims = manager.decode_session(&session.token).unwrap();
        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.tenant_id, tenant.id.to_string());
        assert_eq!(claims.tenant_name, "acme");
        assert_eq!(claims.token_type, "session");
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let manager = manager();
        assert!(manager.decode_session("not-a-token").is_err());
    }
}
