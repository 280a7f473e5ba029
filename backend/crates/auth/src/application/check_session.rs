//! Check Session Use Case
//!
//! Resolves a session cookie to the signed-in user.

use std::sync::Arc;

use platform::clock::Clock;

use crate::application::config::{AuthConfig, chrono_ttl};
use crate::application::session_token;
use crate::domain::entity::{auth_session::AuthSession, user::User};
use crate::domain::repository::{AuthSessionRepository, UserRepository};
use crate::error::{AuthError, AuthResult};

/// The authenticated user of the current request
///
/// Loaded fresh on every request, so `user.email` and
/// `user.email_verified_at` reflect the store.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    pub session: AuthSession,
}

pub struct CheckSessionUseCase<U, S>
where
    U: UserRepository,
    S: AuthSessionRepository + Send + Sync + 'static,
{
    user_repo: Arc<U>,
    session_repo: Arc<S>,
    clock: Arc<dyn Clock>,
    config: Arc<AuthConfig>,
}

impl<U, S> CheckSessionUseCase<U, S>
where
    U: UserRepository,
    S: AuthSessionRepository + Send + Sync + 'static,
{
    pub fn new(
        user_repo: Arc<U>,
        session_repo: Arc<S>,
        clock: Arc<dyn Clock>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            clock,
            config,
        }
    }

    pub async fn execute(
        &self,
        session_token: &str,
        fingerprint_hash: &[u8],
    ) -> AuthResult<CurrentUser> {
        let session = self.get_session(session_token, fingerprint_hash).await?;

        let Some(user) = self.user_repo.find_by_id(&session.user_id).await? else {
            self.session_repo.delete(&session.session_id).await?;
            return Err(AuthError::SessionInvalid);
        };

        Ok(CurrentUser { user, session })
    }

    /// Get session and update last activity
    pub async fn get_session(
        &self,
        session_token: &str,
        fingerprint_hash: &[u8],
    ) -> AuthResult<AuthSession> {
        let session_id = session_token::parse(&self.config.session_secret, session_token)?;
        let now = self.clock.now();

        let mut session = self
            .session_repo
            .find_by_id(&session_id, fingerprint_hash, now)
            .await?
            .ok_or(AuthError::SessionInvalid)?;

        if session.is_expired(now) {
            self.session_repo.delete(&session_id).await?;
            return Err(AuthError::SessionInvalid);
        }

        session.touch(now);
        session.extend_if_needed(chrono_ttl(self.config.session_ttl_long)?, now);

        // Update in background
        let session_clone = session.clone();
        let repo = self.session_repo.clone();
        tokio::spawn(async move {
            if let Err(e) = repo.update(&session_clone).await {
                tracing::warn!(error = %e, "Failed to update session activity");
            }
        });

        Ok(session)
    }
}
