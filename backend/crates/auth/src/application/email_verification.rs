//! Email Verification Use Case
//!
//! Issues signed verification links, checks them, and performs the
//! `Unverified -> Verified` transition with its event.

use std::sync::Arc;

use platform::clock::Clock;

use crate::application::config::{AuthConfig, chrono_ttl};
use crate::domain::entity::user::User;
use crate::domain::event::{AuthEvent, EventPublisher};
use crate::domain::notifier::VerificationNotifier;
use crate::domain::repository::UserRepository;
use crate::domain::signed_url::{SignedLink, SignedLinkParams, UrlSigner};
use crate::error::AuthResult;

/// Result of a successful `verify`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// This call performed the transition and emitted the event
    Verified,
    /// Nothing changed; the email was already verified
    AlreadyVerified,
}

/// Result of a `resend`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResendOutcome {
    /// Nothing sent
    AlreadyVerified,
    /// One fresh link delivered
    LinkSent,
}

pub struct EmailVerificationUseCase<U, N, E>
where
    U: UserRepository,
    N: VerificationNotifier,
    E: EventPublisher,
{
    user_repo: Arc<U>,
    notifier: Arc<N>,
    events: Arc<E>,
    clock: Arc<dyn Clock>,
    config: Arc<AuthConfig>,
    signer: UrlSigner,
}

impl<U, N, E> EmailVerificationUseCase<U, N, E>
where
    U: UserRepository,
    N: VerificationNotifier,
    E: EventPublisher,
{
    pub fn new(
        user_repo: Arc<U>,
        notifier: Arc<N>,
        events: Arc<E>,
        clock: Arc<dyn Clock>,
        config: Arc<AuthConfig>,
    ) -> Self {
        let signer = config.url_signer();
        Self {
            user_repo,
            notifier,
            events,
            clock,
            config,
            signer,
        }
    }

    /// Build a link expiring `verification_ttl` from now (no side effects)
    pub fn issue(&self, user: &User) -> AuthResult<SignedLink> {
        let ttl = chrono_ttl(self.config.verification_ttl)?;
        Ok(self.signer.issue(user, self.clock.now() + ttl))
    }

    /// Issue a link and hand it to the notifier
    pub async fn send_link(&self, user: &User) -> AuthResult<SignedLink> {
        let link = self.issue(user)?;
        self.notifier.send_verification_link(user, &link).await?;

        tracing::info!(
            user_id = %user.user_id,
            expires = link.expires,
            "Verification link sent"
        );

        Ok(link)
    }

    /// Check a visited link and verify the session user's email
    pub async fn verify(
        &self,
        params: &SignedLinkParams,
        session_user: &User,
    ) -> AuthResult<VerifyOutcome> {
        let now = self.clock.now();
        self.signer.check(params, session_user, now)?;

        if session_user.has_verified_email() {
            tracing::debug!(user_id = %session_user.user_id, "Email already verified");
            return Ok(VerifyOutcome::AlreadyVerified);
        }

        // A concurrent request may have won since the user was loaded
        if !self
            .user_repo
            .mark_email_verified(&session_user.user_id, now)
            .await?
        {
            tracing::debug!(
                user_id = %session_user.user_id,
                "Email verified by a concurrent request"
            );
            return Ok(VerifyOutcome::AlreadyVerified);
        }

        tracing::info!(user_id = %session_user.user_id, "Email verified");

        let event = AuthEvent::EmailVerified {
            user_id: session_user.user_id,
            email: session_user.email.clone(),
            at: now,
        };
        if let Err(e) = self.events.publish(event).await {
            // The transition is committed; a lost event must not fail the request.
            tracing::error!(
                user_id = %session_user.user_id,
                error = %e,
                "Failed to publish email verified event"
            );
        }

        Ok(VerifyOutcome::Verified)
    }

    /// Send a fresh link unless the session user is already verified
    pub async fn resend(&self, session_user: &User) -> AuthResult<ResendOutcome> {
        if session_user.has_verified_email() {
            return Ok(ResendOutcome::AlreadyVerified);
        }

        self.send_link(session_user).await?;
        Ok(ResendOutcome::LinkSent)
    }
}
