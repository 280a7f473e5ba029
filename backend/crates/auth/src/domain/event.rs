//! Domain Events
//!
//! Published after the state change they describe has been persisted.

use chrono::{DateTime, Utc};
use kernel::id::UserId;
use serde::Serialize;

use crate::domain::value_object::email::Email;
use crate::error::AuthResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthEvent {
    /// A new account was created (still unverified)
    Registered {
        user_id: UserId,
        email: Email,
        at: DateTime<Utc>,
    },
    /// The `Unverified -> Verified` edge; emitted at most once per user
    EmailVerified {
        user_id: UserId,
        email: Email,
        at: DateTime<Utc>,
    },
    /// Password replaced through a reset link; all sessions were ended
    PasswordReset {
        user_id: UserId,
        email: Email,
        at: DateTime<Utc>,
    },
}

impl AuthEvent {
    pub fn user_id(&self) -> UserId {
        match self {
            AuthEvent::Registered { user_id, .. }
            | AuthEvent::EmailVerified { user_id, .. }
            | AuthEvent::PasswordReset { user_id, .. } => *user_id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AuthEvent::Registered { .. } => "registered",
            AuthEvent::EmailVerified { .. } => "email_verified",
            AuthEvent::PasswordReset { .. } => "password_reset",
        }
    }
}

/// Event sink
#[trait_variant::make(EventPublisher: Send)]
pub trait LocalEventPublisher {
    async fn publish(&self, event: AuthEvent) -> AuthResult<()>;
}
