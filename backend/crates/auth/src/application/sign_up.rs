//! Sign Up Use Case
//!
//! Creates an unverified account and sends its first verification link.

use std::sync::Arc;

use platform::clock::Clock;

use crate::application::config::AuthConfig;
use crate::application::email_verification::EmailVerificationUseCase;
use crate::domain::entity::user::User;
use crate::domain::event::{AuthEvent, EventPublisher};
use crate::domain::notifier::VerificationNotifier;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{
    email::Email,
    user_password::{RawPassword, UserPassword},
};
use crate::error::{AuthError, AuthResult};

pub struct SignUpInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug)]
pub struct SignUpOutput {
    pub user: User,
}

pub struct SignUpUseCase<U, N, E>
where
    U: UserRepository,
    N: VerificationNotifier,
    E: EventPublisher,
{
    user_repo: Arc<U>,
    events: Arc<E>,
    clock: Arc<dyn Clock>,
    config: Arc<AuthConfig>,
    verification: EmailVerificationUseCase<U, N, E>,
}

impl<U, N, E> SignUpUseCase<U, N, E>
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
        let verification = EmailVerificationUseCase::new(
            user_repo.clone(),
            notifier,
            events.clone(),
            clock.clone(),
            config.clone(),
        );
        Self {
            user_repo,
            events,
            clock,
            config,
            verification,
        }
    }

    pub async fn execute(&self, input: SignUpInput) -> AuthResult<SignUpOutput> {
        let email = Email::new(input.email)?;

        if self.user_repo.exists_by_email(&email).await? {
            return Err(AuthError::EmailTaken);
        }

        let raw_password = RawPassword::new(input.password)?;
        let password_hash = UserPassword::from_raw(&raw_password, self.config.pepper())?;

        let now = self.clock.now();
        let user = User::new(email, password_hash, now);

        // The unique index still guards the race between the check and the insert
        self.user_repo.create(&user).await?;

        tracing::info!(user_id = %user.user_id, "User signed up");

        let registered = AuthEvent::Registered {
            user_id: user.user_id,
            email: user.email.clone(),
            at: now,
        };
        if let Err(e) = self.events.publish(registered).await {
            tracing::error!(user_id = %user.user_id, error = %e, "Failed to publish registered event");
        }

        // The account exists either way; the user can ask for a new link.
        if let Err(e) = self.verification.send_link(&user).await {
            tracing::error!(user_id = %user.user_id, error = %e, "Initial verification link not sent");
        }

        Ok(SignUpOutput { user })
    }
}
