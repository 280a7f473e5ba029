//! Repository Traits
//!
//! Interfaces for data persistence. Implementations are in the infra layer.

use chrono::{DateTime, Utc};
use kernel::id::{SessionId, UserId};

use crate::domain::entity::{auth_session::AuthSession, user::User};
use crate::domain::value_object::email::Email;
use crate::domain::value_object::user_password::UserPassword;
use crate::error::AuthResult;

/// User repository trait
#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    /// Insert a new user; a duplicate email is `AuthError::EmailTaken`
    async fn create(&self, user: &User) -> AuthResult<()>;

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>>;

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>>;

    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool>;

    /// Persist profile fields (email, password, last login)
    ///
    /// Never touches `email_verified_at`; use [`mark_email_verified`].
    ///
    /// [`mark_email_verified`]: LocalUserRepository::mark_email_verified
    async fn update(&self, user: &User) -> AuthResult<()>;

    /// Compare-and-set `email_verified_at` from NULL to `at`
    ///
    /// Returns `true` only for the call that performed the transition.
    async fn mark_email_verified(&self, user_id: &UserId, at: DateTime<Utc>) -> AuthResult<bool>;

    /// Compare-and-set the password hash from `current` to `new`
    ///
    /// Returns `false` if the stored hash is no longer `current`, so one
    /// reset link changes the password at most once.
    async fn replace_password(
        &self,
        user_id: &UserId,
        current: &UserPassword,
        new: &UserPassword,
        at: DateTime<Utc>,
    ) -> AuthResult<bool>;
}

/// Auth session repository trait
#[trait_variant::make(AuthSessionRepository: Send)]
pub trait LocalAuthSessionRepository {
    async fn create(&self, session: &AuthSession) -> AuthResult<()>;

    /// Find a live session and verify its fingerprint
    ///
    /// A fingerprint mismatch is `AuthError::SessionFingerprintMismatch`.
    async fn find_by_id(
        &self,
        session_id: &SessionId,
        fingerprint_hash: &[u8],
        now: DateTime<Utc>,
    ) -> AuthResult<Option<AuthSession>>;

    /// Update expiry and last activity
    async fn update(&self, session: &AuthSession) -> AuthResult<()>;

    async fn delete(&self, session_id: &SessionId) -> AuthResult<()>;

    /// Delete every session of `user_id`, returning how many were removed
    async fn delete_for_user(&self, user_id: &UserId) -> AuthResult<u64>;

    /// Delete sessions expired at `now`, returning how many were removed
    async fn cleanup_expired(&self, now: DateTime<Utc>) -> AuthResult<u64>;
}
