//! User domain model and lifecycle state machine
//!
//! A user belongs to exactly one tenant, fixed at creation. Email uniqueness
//! is scoped to the tenant (composite (email, tenant_id) key), so the same
//! address may register independently under two different tenants.

use super::common::StringUuid;
use super::event::DomainEvent;
use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// User lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    #[default]
    PendingActivation,
    Active,
    Suspended,
    /// Terminal; no further transitions permitted
    Deleted,
}

impl std::str::FromStr for UserStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending_activation" => Ok(UserStatus::PendingActivation),
            "active" => Ok(UserStatus::Active),
            "suspended" => Ok(UserStatus::Suspended),
            "deleted" => Ok(UserStatus::Deleted),
            _ => Err(format!("Unknown user status: {}", s)),
        }
    }
}

impl std::fmt::Display for UserStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserStatus::PendingActivation => write!(f, "pending_activation"),
            UserStatus::Active => write!(f, "active"),
            UserStatus::Suspended => write!(f, "suspended"),
            UserStatus::Deleted => write!(f, "deleted"),
        }
    }
}

impl<'r> sqlx::Decode<'r, sqlx::MySql> for UserStatus {
    fn decode(
        value: sqlx::mysql::MySqlValueRef<'r>,
    ) -> std::result::Result<Self, sqlx::error::BoxDynError> {
        let s: String = sqlx::Decode::<'r, sqlx::MySql>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl sqlx::Type<sqlx::MySql> for UserStatus {
    fn type_info() -> sqlx::mysql::MySqlTypeInfo {
        <String as sqlx::Type<sqlx::MySql>>::type_info()
    }

    fn compatible(ty: &sqlx::mysql::MySqlTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::MySql>>::compatible(ty)
    }
}

impl<'q> sqlx::Encode<'q, sqlx::MySql> for UserStatus {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<u8>,
    ) -> std::result::Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        <String as sqlx::Encode<sqlx::MySql>>::encode_by_ref(&self.to_string(), buf)
    }
}

/// Whether a freshly registered user starts active or awaits activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationPolicy {
    /// Admin-provisioned or federated users; no activation step
    Immediate,
    /// Self-registration; user must set credentials and activate
    RequireActivation,
}

/// User entity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: StringUuid,
    /// Owning tenant, set at creation, never transfers
    pub tenant_id: StringUuid,
    /// Case-normalized; unique per tenant, not globally
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub email_confirmed: bool,
    pub mfa_enabled: bool,
    pub status: UserStatus,
    /// Absent until the credential store sets it
    #[serde(skip_serializing, default)]
    pub password_hash: Option<String>,
    pub role: String,
    #[sqlx(json)]
    pub scopes: Vec<String>,
    pub activated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Events recorded by lifecycle mutations, drained after persisting
    #[serde(skip)]
    #[sqlx(skip)]
    pub pending_events: Vec<DomainEvent>,
}

impl User {
    /// Register a new user under a tenant.
    ///
    /// `Immediate` enters `Active` and emits `UserRegistered`;
    /// `RequireActivation` enters `PendingActivation` and emits
    /// `UserPendingActivation`.
    pub fn register(
        tenant_id: StringUuid,
        email: &str,
        first_name: &str,
        last_name: &str,
        role: &str,
        policy: ActivationPolicy,
    ) -> Result<Self> {
        let email = normalize_email(email)?;
        if first_name.is_empty() || first_name.len() > 50 {
            return Err(AppError::Validation(
                "first_name must be 1-50 characters".to_string(),
            ));
        }
        if last_name.is_empty() || last_name.len() > 50 {
            return Err(AppError::Validation(
                "last_name must be 1-50 characters".to_string(),
            ));
        }
        if tenant_id.is_nil() {
            return Err(AppError::Validation("tenant_id is required".to_string()));
        }

        let now = Utc::now();
        let (status, activated_at) = match policy {
            ActivationPolicy::Immediate => (UserStatus::Active, Some(now)),
            ActivationPolicy::RequireActivation => (UserStatus::PendingActivation, None),
        };

        let mut user = Self {
            id: StringUuid::new_v4(),
            tenant_id,
            email,
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email_confirmed: false,
            mfa_enabled: false,
            status,
            password_hash: None,
            role: role.to_string(),
            scopes: Vec::new(),
            activated_at,
            created_at: now,
            updated_at: now,
            pending_events: Vec::new(),
        };

        let event = match policy {
            ActivationPolicy::Immediate => DomainEvent::UserRegistered {
                user_id: user.id,
                tenant_id: user.tenant_id,
                email: user.email.clone(),
                first_name: user.first_name.clone(),
                occurred_at: now,
            },
            ActivationPolicy::RequireActivation => DomainEvent::UserPendingActivation {
                user_id: user.id,
                tenant_id: user.tenant_id,
                email: user.email.clone(),
                first_name: user.first_name.clone(),
                occurred_at: now,
            },
        };
        user.record(event);
        Ok(user)
    }

    /// Mark the email address as confirmed. Illegal when already confirmed
    /// or after deletion.
    pub fn confirm_email(&mut self) -> Result<()> {
        if self.status == UserStatus::Deleted {
            return Err(AppError::IllegalState(format!(
                "user {} is deleted; no further transitions permitted",
                self.id
            )));
        }
        if self.email_confirmed {
            return Err(AppError::IllegalState(format!(
                "email for user {} is already confirmed",
                self.id
            )));
        }
        self.email_confirmed = true;
        self.touch();
        self.record(DomainEvent::UserEmailConfirmed {
            user_id: self.id,
            tenant_id: self.tenant_id,
            email: self.email.clone(),
            occurred_at: Utc::now(),
        });
        Ok(())
    }

    /// Store the credential hash produced by the external credential store.
    pub fn set_password_hash(&mut self, hash: impl Into<String>) {
        self.password_hash = Some(hash.into());
        self.touch();
    }

    /// Transition `PendingActivation -> Active`.
    ///
    /// Requires a password hash. Forces the email-confirmed flag and stamps
    /// the activation timestamp.
    pub fn activate(&mut self) -> Result<()> {
        if self.status != UserStatus::PendingActivation {
            return Err(AppError::IllegalState(format!(
                "user {} cannot be activated from status '{}'",
                self.id, self.status
            )));
        }
        if self.password_hash.is_none() {
            return Err(AppError::IllegalState(format!(
                "user {} has no password set; activation requires credentials",
                self.id
            )));
        }
        let now = Utc::now();
        self.status = UserStatus::Active;
        self.email_confirmed = true;
        self.activated_at = Some(now);
        self.touch();
        self.record(DomainEvent::UserActivated {
            user_id: self.id,
            tenant_id: self.tenant_id,
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            occurred_at: now,
        });
        Ok(())
    }

    /// Transition `Active -> Suspended`.
    pub fn suspend(&mut self, reason: &str) -> Result<()> {
        if self.status != UserStatus::Active {
            return Err(AppError::IllegalState(format!(
                "user {} cannot be suspended from status '{}'",
                self.id, self.status
            )));
        }
        self.status = UserStatus::Suspended;
        self.touch();
        self.record(DomainEvent::UserSuspended {
            user_id: self.id,
            tenant_id: self.tenant_id,
            reason: reason.to_string(),
            occurred_at: Utc::now(),
        });
        Ok(())
    }

    /// Transition to `Deleted`. Irreversible.
    pub fn deactivate(&mut self) -> Result<()> {
        if self.status == UserStatus::Deleted {
            return Err(AppError::IllegalState(format!(
                "user {} is already deleted",
                self.id
            )));
        }
        self.status = UserStatus::Deleted;
        self.touch();
        self.record(DomainEvent::UserDeactivated {
            user_id: self.id,
            tenant_id: self.tenant_id,
            occurred_at: Utc::now(),
        });
        Ok(())
    }

    pub fn can_activate(&self) -> bool {
        self.status == UserStatus::PendingActivation && self.password_hash.is_some()
    }

    pub fn can_suspend(&self) -> bool {
        self.status == UserStatus::Active
    }

    pub fn can_login(&self) -> bool {
        self.status == UserStatus::Active
    }

    /// Drain events recorded since the last call.
    pub fn take_events(&mut self) -> Vec<DomainEvent> {
        std::mem::take(&mut self.pending_events)
    }

    fn record(&mut self, event: DomainEvent) {
        self.pending_events.push(event);
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

fn normalize_email(email: &str) -> Result<String> {
    let email = email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') || email.len() > 255 {
        return Err(AppError::Validation(format!(
            "'{}' is not a valid email address",
            email
        )));
    }
    Ok(email)
}

/// Input for registering a new user
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterUserInput {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 50))]
    pub first_name: String,
    #[validate(length(min = 1, max = 50))]
    pub last_name: String,
    #[validate(length(min = 1, max = 50))]
    pub role: String,
}
