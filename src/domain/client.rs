//! Client domain model
//!
//! An OAuth2/OIDC client registration shared by zero or more tenants. The
//! association is stored on the tenant side only (`Tenant::client_id`);
//! resolution queries tenants by client id instead of trusting a mirrored
//! list here.

use super::common::StringUuid;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

lazy_static::lazy_static! {
    pub static ref CLIENT_NAME_REGEX: regex::Regex =
        regex::Regex::new(r"^[A-Za-z0-9_-]{3,100}$").unwrap();
}

/// Client entity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Client {
    pub id: StringUuid,
    pub name: String,
    #[sqlx(json)]
    pub allowed_scopes: Vec<String>,
    pub require_client_secret: bool,
    pub require_consent: bool,
    pub require_mfa: bool,
    pub is_active: bool,
    /// Argon2 hash of the client secret; never exposed
    #[serde(skip_serializing, default)]
    pub secret_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for Client {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: StringUuid::new_v4(),
            name: String::new(),
            allowed_scopes: Vec::new(),
            require_client_secret: true,
            require_consent: false,
            require_mfa: false,
            is_active: true,
            secret_hash: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Input for creating a new client
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateClientInput {
    #[validate(length(min = 3, max = 100), custom(function = "validate_client_name"))]
    pub name: String,
    #[serde(default)]
    pub allowed_scopes: Vec<String>,
    #[serde(default = "default_true")]
    pub require_client_secret: bool,
    #[serde(default)]
    pub require_consent: bool,
    #[serde(default)]
    pub require_mfa: bool,
}

fn default_true() -> bool {
    true
}

fn validate_client_name(name: &str) -> std::result::Result<(), validator::ValidationError> {
    if CLIENT_NAME_REGEX.is_match(name) {
        Ok(())
    } else {
        Err(validator::ValidationError::new("invalid_client_name"))
    }
}

/// Input for updating a client
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateClientInput {
    pub allowed_scopes: Option<Vec<String>>,
    pub require_client_secret: Option<bool>,
    pub require_consent: Option<bool>,
    pub require_mfa: Option<bool>,
    pub is_active: Option<bool>,
}

/// Client plus the plaintext secret, returned once at creation time
#[derive(Debug, Clone, Serialize)]
pub struct ClientWithSecret {
    #[serde(flatten)]
    pub client: Client,
    pub client_secret: Option<String>,
}

/// Ephemeral protocol-ready view of a client plus its tenants' aggregated URLs.
///
/// Synthesized on every resolution; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientDescriptor {
    pub client_id: StringUuid,
    pub client_name: String,
    pub redirect_uris: Vec<String>,
    pub post_logout_redirect_uris: Vec<String>,
    pub allowed_cors_origins: Vec<String>,
    pub allowed_scopes: Vec<String>,
    pub require_client_secret: bool,
    pub require_consent: bool,
    pub require_mfa: bool,
    pub enabled: bool,
}

/// Outcome of client resolution.
///
/// `NotVisible` must be treated by the protocol engine exactly like
/// `NotFound`: no tokens for a client with no usable redirect target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientResolution {
    Found(Box<ClientDescriptor>),
    NotFound,
    NotVisible,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_client_name_rules() {
        assert!(CLIENT_NAME_REGEX.is_match("spa"));
        assert!(CLIENT_NAME_REGEX.is_match("my-app_2"));
        assert!(!CLIENT_NAME_REGEX.is_match("ab"));
        assert!(!CLIENT_NAME_REGEX.is_match("has space"));
        assert!(!CLIENT_NAME_REGEX.is_match(&"x".repeat(101)));
    }

    #[test]
    fn test_create_client_input_validation() {
        let input = CreateClientInput {
            name: "a".to_string(),
            allowed_scopes: vec![],
            require_client_secret: true,
            require_consent: false,
            require_mfa: false,
        };
        assert!(input.validate().is_err());

        let input = CreateClientInput {
            name: "spa".to_string(),
            allowed_scopes: vec!["openid".to_string()],
            require_client_secret: false,
            require_consent: false,
            require_mfa: false,
        };
        assert!(input.validate().is_ok());
    }
}
