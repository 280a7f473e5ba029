//! Signed link delivery
//!
//! `LogMailer` writes the link to the log (development transport);
//! `OutboxMailer` keeps sent links in memory for inspection.

use std::sync::{Arc, Mutex};

use crate::domain::entity::user::User;
use crate::domain::notifier::VerificationNotifier;
use crate::domain::signed_url::SignedLink;
use crate::domain::value_object::email::Email;
use crate::error::{AuthError, AuthResult};

#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

impl VerificationNotifier for LogMailer {
    async fn send_verification_link(&self, user: &User, link: &SignedLink) -> AuthResult<()> {
        tracing::info!(
            to = %user.email,
            user_id = %user.user_id,
            url = %link.url,
            expires_at = ?link.expires_at(),
            "Verify email address"
        );
        Ok(())
    }

    async fn send_password_reset_link(&self, user: &User, link: &SignedLink) -> AuthResult<()> {
        tracing::info!(
            to = %user.email,
            user_id = %user.user_id,
            url = %link.url,
            expires_at = ?link.expires_at(),
            "Reset password"
        );
        Ok(())
    }
}

/// A message accepted by [`OutboxMailer`]
#[derive(Debug, Clone)]
pub struct SentMail {
    pub to: Email,
    pub link: SignedLink,
}

#[derive(Debug, Clone, Default)]
pub struct OutboxMailer {
    sent: Arc<Mutex<Vec<SentMail>>>,
    fail: bool,
}

impl OutboxMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mailer whose transport is down
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<SentMail> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }
}

impl OutboxMailer {
    fn record(&self, user: &User, link: &SignedLink) -> AuthResult<()> {
        if self.fail {
            return Err(AuthError::Notification("outbox transport unavailable".to_string()));
        }

        self.sent
            .lock()
            .map_err(|_| AuthError::Internal("outbox poisoned".to_string()))?
            .push(SentMail {
                to: user.email.clone(),
                link: link.clone(),
            });
        Ok(())
    }
}

impl VerificationNotifier for OutboxMailer {
    async fn send_verification_link(&self, user: &User, link: &SignedLink) -> AuthResult<()> {
        self.record(user, link)
    }

    async fn send_password_reset_link(&self, user: &User, link: &SignedLink) -> AuthResult<()> {
        self.record(user, link)
    }
}
