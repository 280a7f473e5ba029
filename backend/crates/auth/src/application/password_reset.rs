//! Password Reset Use Case
//!
//! `request` mails a signed reset link; `reset` checks it, replaces the
//! password and ends every session of the user. The link is bound to the
//! current password hash, so it works once.

use std::sync::Arc;

use kernel::id::UserId;
use platform::clock::Clock;

use crate::application::config::{AuthConfig, chrono_ttl};
use crate::domain::entity::user::User;
use crate::domain::event::{AuthEvent, EventPublisher};
use crate::domain::notifier::VerificationNotifier;
use crate::domain::repository::{AuthSessionRepository, UserRepository};
use crate::domain::signed_url::{SignedAction, SignedLink, SignedLinkParams, UrlSigner};
use crate::domain::value_object::{
    email::Email,
    user_password::{RawPassword, UserPassword},
};
use crate::error::{AuthResult, VerificationError};

pub struct ResetPasswordInput {
    pub link: SignedLinkParams,
    pub password: String,
}

pub struct PasswordResetUseCase<U, S, N, E>
where
    U: UserRepository,
    S: AuthSessionRepository,
    N: VerificationNotifier,
    E: EventPublisher,
{
    user_repo: Arc<U>,
    session_repo: Arc<S>,
    notifier: Arc<N>,
    events: Arc<E>,
    clock: Arc<dyn Clock>,
    config: Arc<AuthConfig>,
    signer: UrlSigner,
}

impl<U, S, N, E> PasswordResetUseCase<U, S, N, E>
where
    U: UserRepository,
    S: AuthSessionRepository,
    N: VerificationNotifier,
    E: EventPublisher,
{
    pub fn new(
        user_repo: Arc<U>,
        session_repo: Arc<S>,
        notifier: Arc<N>,
        events: Arc<E>,
        clock: Arc<dyn Clock>,
        config: Arc<AuthConfig>,
    ) -> Self {
        let signer = config.url_signer();
        Self {
            user_repo,
            session_repo,
            notifier,
            events,
            clock,
            config,
            signer,
        }
    }

    /// Mail a reset link if `email` belongs to an account
    ///
    /// Unknown addresses and transport failures are only logged, so the
    /// caller answers the same way whether or not the account exists.
    pub async fn request(&self, email: String) -> AuthResult<Option<SignedLink>> {
        let email = Email::new(email)?;

        let Some(user) = self.user_repo.find_by_email(&email).await? else {
            tracing::debug!("Password reset requested for unknown email");
            return Ok(None);
        };

        let ttl = chrono_ttl(self.config.password_reset_ttl)?;
        let link = self
            .signer
            .issue_for(SignedAction::ResetPassword, &user, self.clock.now() + ttl);

        if let Err(e) = self.notifier.send_password_reset_link(&user, &link).await {
            tracing::error!(user_id = %user.user_id, error = %e, "Password reset link not sent");
            return Ok(None);
        }

        tracing::info!(
            user_id = %user.user_id,
            expires = link.expires,
            "Password reset link sent"
        );

        Ok(Some(link))
    }

    /// Check the link, then replace the password and end all sessions
    pub async fn reset(&self, input: ResetPasswordInput) -> AuthResult<User> {
        let now = self.clock.now();
        self.signer
            .check_signature(SignedAction::ResetPassword, &input.link, now)?;

        let user_id: UserId = input
            .link
            .id
            .parse()
            .map_err(|_| VerificationError::InvalidSignature)?;
        let mut user = self
            .user_repo
            .find_by_id(&user_id)
            .await?
            .ok_or(VerificationError::StaleContent)?;

        self.signer
            .check_content(SignedAction::ResetPassword, &input.link, &user)?;

        let raw_password = RawPassword::new(input.password)?;
        let new_hash = UserPassword::from_raw(&raw_password, self.config.pepper())?;

        // A concurrent reset with the same link may have won
        if !self
            .user_repo
            .replace_password(&user.user_id, &user.password_hash, &new_hash, now)
            .await?
        {
            return Err(VerificationError::StaleContent.into());
        }

        let sessions_ended = self.session_repo.delete_for_user(&user.user_id).await?;
        tracing::info!(user_id = %user.user_id, sessions_ended, "Password reset");

        let event = AuthEvent::PasswordReset {
            user_id: user.user_id,
            email: user.email.clone(),
            at: now,
        };
        if let Err(e) = self.events.publish(event).await {
            tracing::error!(
                user_id = %user.user_id,
                error = %e,
                "Failed to publish password reset event"
            );
        }

        user.password_hash = new_hash;
        user.updated_at = now;
        Ok(user)
    }
}
