//! Sign In Use Case
//!
//! Checks credentials and opens a fingerprint-bound session.

use std::sync::Arc;

use platform::clock::Clock;

use crate::application::config::{AuthConfig, chrono_ttl};
use crate::application::session_token;
use crate::domain::entity::{auth_session::AuthSession, user::User};
use crate::domain::repository::{AuthSessionRepository, UserRepository};
use crate::domain::value_object::{email::Email, user_password::RawPassword};
use crate::error::{AuthError, AuthResult};

/// Re-export ClientFingerprint from platform
pub use platform::client::ClientFingerprint;

pub struct SignInInput {
    pub email: String,
    pub password: String,
    pub remember_me: bool,
}

pub struct SignInOutput {
    /// Session token for cookie
    pub session_token: String,
    pub user: User,
}

pub struct SignInUseCase<U, S>
where
    U: UserRepository,
    S: AuthSessionRepository,
{
    user_repo: Arc<U>,
    session_repo: Arc<S>,
    clock: Arc<dyn Clock>,
    config: Arc<AuthConfig>,
}

impl<U, S> SignInUseCase<U, S>
where
    U: UserRepository,
    S: AuthSessionRepository,
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
        input: SignInInput,
        fingerprint: &ClientFingerprint,
    ) -> AuthResult<SignInOutput> {
        let email = Email::new(input.email).map_err(|_| AuthError::InvalidCredentials)?;

        let mut user = self
            .user_repo
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let raw_password = RawPassword::for_login(input.password);
        if !user.password_hash.verify(&raw_password, self.config.pepper()) {
            return Err(AuthError::InvalidCredentials);
        }

        user.record_login(self.clock.now());
        self.user_repo.update(&user).await?;

        let session_token = self.start_session(&user, input.remember_me, fingerprint).await?;

        Ok(SignInOutput {
            session_token,
            user,
        })
    }

    /// Open a session for an already authenticated user
    pub async fn start_session(
        &self,
        user: &User,
        remember_me: bool,
        fingerprint: &ClientFingerprint,
    ) -> AuthResult<String> {
        let ttl = chrono_ttl(self.config.session_ttl(remember_me))?;
        let session = AuthSession::new(
            user.user_id,
            remember_me,
            fingerprint,
            ttl,
            self.clock.now(),
        );

        self.session_repo.create(&session).await?;

        tracing::info!(
            user_id = %user.user_id,
            session_id = %session.session_id,
            remember_me = remember_me,
            "Session started"
        );

        Ok(session_token::issue(
            &self.config.session_secret,
            &session.session_id,
        ))
    }
}
