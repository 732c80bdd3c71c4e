//! Tenant domain model
//!
//! A tenant is the identity-scoping unit: it owns its allowed return URLs,
//! CORS origins, URL aliases, and a required branding/configuration
//! reference. The optional `client_id` is the single stored side of the
//! Tenant-Client association; clients never mirror it.

use super::common::StringUuid;
use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use url::Url;
use validator::Validate;

// Lowercase alphanumeric with hyphens, same shape as a DNS label list
lazy_static::lazy_static! {
    pub static ref TENANT_NAME_REGEX: regex::Regex =
        regex::Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").unwrap();
}

/// Tenant entity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Tenant {
    pub id: StringUuid,
    /// Unique lowercase name, used as the tenant selector in ACR values
    pub name: String,
    pub display_name: String,
    pub is_active: bool,
    /// Required reference to the external branding/configuration aggregate
    pub configuration_id: StringUuid,
    /// At most one associated OAuth2/OIDC client
    pub client_id: Option<StringUuid>,
    /// Allowed return URLs, insertion-ordered, no duplicates
    #[sqlx(json)]
    pub return_urls: Vec<String>,
    /// Allowed CORS origins, insertion-ordered, no duplicates
    #[sqlx(json)]
    pub cors_origins: Vec<String>,
    /// Alternative selector values accepted for this tenant
    #[sqlx(json)]
    pub url_aliases: Vec<String>,
    pub notify_endpoint: Option<String>,
    pub notify_api_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tenant {
    /// Create a new tenant. The configuration reference is mandatory.
    pub fn new(
        name: impl Into<String>,
        display_name: impl Into<String>,
        configuration_id: StringUuid,
    ) -> Result<Self> {
        let name = name.into();
        let display_name = display_name.into();

        validate_tenant_name(&name)?;
        if display_name.is_empty() || display_name.len() > 200 {
            return Err(AppError::Validation(
                "display_name must be 1-200 characters".to_string(),
            ));
        }
        if configuration_id.is_nil() {
            return Err(AppError::Validation(
                "configuration_id is required".to_string(),
            ));
        }

        let now = Utc::now();
        Ok(Self {
            id: StringUuid::new_v4(),
            name,
            display_name,
            is_active: true,
            configuration_id,
            client_id: None,
            return_urls: Vec::new(),
            cors_origins: Vec::new(),
            url_aliases: Vec::new(),
            notify_endpoint: None,
            notify_api_key: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Add an allowed return URL. Must be an absolute URI; duplicates are a no-op.
    pub fn add_return_url(&mut self, url: &str) -> Result<()> {
        let parsed = Url::parse(url)
            .map_err(|e| AppError::Validation(format!("return URL '{}' is not valid: {}", url, e)))?;
        if parsed.cannot_be_a_base() {
            return Err(AppError::Validation(format!(
                "return URL '{}' must be an absolute URL",
                url
            )));
        }
        if !self.return_urls.iter().any(|u| u == url) {
            self.return_urls.push(url.to_string());
            self.touch();
        }
        Ok(())
    }

    pub fn remove_return_url(&mut self, url: &str) {
        let before = self.return_urls.len();
        self.return_urls.retain(|u| u != url);
        if self.return_urls.len() != before {
            self.touch();
        }
    }

    /// Add an allowed CORS origin. Must be an absolute URI with no path component.
    pub fn add_cors_origin(&mut self, origin: &str) -> Result<()> {
        let parsed = Url::parse(origin).map_err(|e| {
            AppError::Validation(format!("CORS origin '{}' is not valid: {}", origin, e))
        })?;
        if parsed.cannot_be_a_base() {
            return Err(AppError::Validation(format!(
                "CORS origin '{}' must be an absolute URL",
                origin
            )));
        }
        if !matches!(parsed.path(), "" | "/")
            || parsed.query().is_some()
            || parsed.fragment().is_some()
        {
            return Err(AppError::Validation(format!(
                "CORS origin '{}' must not carry a path",
                origin
            )));
        }
        if !self.cors_origins.iter().any(|o| o == origin) {
            self.cors_origins.push(origin.to_string());
            self.touch();
        }
        Ok(())
    }

    pub fn remove_cors_origin(&mut self, origin: &str) {
        let before = self.cors_origins.len();
        self.cors_origins.retain(|o| o != origin);
        if self.cors_origins.len() != before {
            self.touch();
        }
    }

    pub fn add_url_alias(&mut self, alias: &str) {
        if !self.url_aliases.iter().any(|a| a == alias) {
            self.url_aliases.push(alias.to_string());
            self.touch();
        }
    }

    /// Associate this tenant with a client registration.
    pub fn set_client(&mut self, client_id: StringUuid) {
        self.client_id = Some(client_id);
        self.touch();
    }

    pub fn clear_client(&mut self) {
        self.client_id = None;
        self.touch();
    }

    pub fn activate(&mut self) {
        self.is_active = true;
        self.touch();
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
        self.touch();
    }

    /// Whether an explicit tenant selector targets this tenant.
    ///
    /// The tenant name always matches. When the tenant defines URL aliases
    /// or return URLs, the selector may also match an alias or the host
    /// portion of a return URL.
    pub fn accepts_selector(&self, selector: &str) -> bool {
        if selector == self.name {
            return true;
        }
        if self.url_aliases.iter().any(|a| a == selector) {
            return true;
        }
        self.return_urls
            .iter()
            .filter_map(|u| Url::parse(u).ok())
            .filter_map(|u| u.host_str().map(str::to_owned))
            .any(|host| host == selector)
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

fn validate_tenant_name(name: &str) -> Result<()> {
    if name.is_empty() || name.len() > 100 {
        return Err(AppError::Validation(
            "tenant name must be 1-100 characters".to_string(),
        ));
    }
    if !TENANT_NAME_REGEX.is_match(name) {
        return Err(AppError::Validation(format!(
            "tenant name '{}' must be lowercase alphanumeric with hyphens",
            name
        )));
    }
    Ok(())
}

/// Input for creating a new tenant
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTenantInput {
    #[validate(length(min = 1, max = 100), custom(function = "validate_name_field"))]
    pub name: String,
    #[validate(length(min = 1, max = 200))]
    pub display_name: String,
    pub configuration_id: uuid::Uuid,
}

fn validate_name_field(name: &str) -> std::result::Result<(), validator::ValidationError> {
    if TENANT_NAME_REGEX.is_match(name) {
        Ok(())
    } else {
        Err(validator::ValidationError::new("invalid_tenant_name"))
    }
}

/// Input for updating tenant metadata
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateTenantInput {
    #[validate(length(min = 1, max = 200))]
    pub display_name: Option<String>,
    pub notify_endpoint: Option<String>,
    pub notify_api_key: Option<String>,
}
