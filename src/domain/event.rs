//! Domain events emitted by aggregate mutations

use super::common::StringUuid;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Discriminator used to route an event to its registered handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    UserRegistered,
    UserPendingActivation,
    UserActivated,
    UserEmailConfirmed,
    UserSuspended,
    UserDeactivated,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EventKind::UserRegistered => "user.registered",
            EventKind::UserPendingActivation => "user.pending_activation",
            EventKind::UserActivated => "user.activated",
            EventKind::UserEmailConfirmed => "user.email_confirmed",
            EventKind::UserSuspended => "user.suspended",
            EventKind::UserDeactivated => "user.deactivated",
        };
        write!(f, "{}", s)
    }
}

/// Immutable record of something that happened to an aggregate.
///
/// Produced synchronously inside lifecycle mutations and drained to the
/// event bus after the mutation has been persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DomainEvent {
    UserRegistered {
        user_id: StringUuid,
        tenant_id: StringUuid,
        email: String,
        first_name: String,
        occurred_at: DateTime<Utc>,
    },
    UserPendingActivation {
        user_id: StringUuid,
        tenant_id: StringUuid,
        email: String,
        first_name: String,
        occurred_at: DateTime<Utc>,
    },
    UserActivated {
        user_id: StringUuid,
        tenant_id: StringUuid,
        email: String,
        first_name: String,
        occurred_at: DateTime<Utc>,
    },
    UserEmailConfirmed {
        user_id: StringUuid,
        tenant_id: StringUuid,
        email: String,
        occurred_at: DateTime<Utc>,
    },
    UserSuspended {
        user_id: StringUuid,
        tenant_id: StringUuid,
        reason: String,
        occurred_at: DateTime<Utc>,
    },
    UserDeactivated {
        user_id: StringUuid,
        tenant_id: StringUuid,
        occurred_at: DateTime<Utc>,
    },
}

impl DomainEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            DomainEvent::UserRegistered { .. } => EventKind::UserRegistered,
            DomainEvent::UserPendingActivation { .. } => EventKind::UserPendingActivation,
            DomainEvent::UserActivated { .. } => EventKind::UserActivated,
            DomainEvent::UserEmailConfirmed { .. } => EventKind::UserEmailConfirmed,
            DomainEvent::UserSuspended { .. } => EventKind::UserSuspended,
            DomainEvent::UserDeactivated { .. } => EventKind::UserDeactivated,
        }
    }

    /// The aggregate the event belongs to.
    pub fn user_id(&self) -> StringUuid {
        match self {
            DomainEvent::UserRegistered { user_id, .. }
            | DomainEvent::UserPendingActivation { user_id, .. }
            | DomainEvent::UserActivated { user_id, .. }
            | DomainEvent::UserEmailConfirmed { user_id, .. }
            | DomainEvent::UserSuspended { user_id, .. }
            | DomainEvent::UserDeactivated { user_id, .. } => *user_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        let event = DomainEvent::UserActivated {
            user_id: StringUuid::new_v4(),
            tenant_id: StringUuid::new_v4(),
            email: "user@example.com".to_string(),
            first_name: "Test".to_string(),
            occurred_at: Utc::now(),
        };
        assert_eq!(event.kind(), EventKind::UserActivated);
        assert_eq!(event.kind().to_string(), "user.activated");
    }
}
