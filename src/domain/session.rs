//! Session issued on successful tenant-scoped authentication

use super::common::StringUuid;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Authenticated session.
///
/// Carries explicit tenant context so downstream claim enrichment can scope
/// to the authenticated tenant instead of leaking all memberships.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user_id: StringUuid,
    pub tenant_id: StringUuid,
    pub tenant_name: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Why an authentication attempt was rejected.
///
/// `InvalidCredentials` deliberately covers both "no such user" and "wrong
/// password" (enumeration resistance).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    InvalidTenant,
    InvalidCredentials,
}

impl RejectReason {
    /// The uninformative message shown to callers.
    pub fn message(&self) -> &'static str {
        match self {
            RejectReason::InvalidTenant => "invalid tenant",
            RejectReason::InvalidCredentials => "invalid email or password",
        }
    }
}

/// Outcome of an authentication attempt.
#[derive(Debug, Clone)]
pub enum AuthOutcome {
    Success(Box<Session>),
    Rejected(RejectReason),
}

impl AuthOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, AuthOutcome::Success(_))
    }
}
