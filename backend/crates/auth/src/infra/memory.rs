//! In-memory repository
//!
//! Same contract as [`PgAuthRepository`](super::postgres::PgAuthRepository),
//! including the unique email and the compare-and-set on verification.

use chrono::{DateTime, Utc};
use kernel::id::{SessionId, UserId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::domain::entity::{auth_session::AuthSession, user::User};
use crate::domain::repository::{AuthSessionRepository, UserRepository};
use crate::domain::value_object::email::Email;
use crate::domain::value_object::user_password::UserPassword;
use crate::error::{AuthError, AuthResult};

#[derive(Debug, Clone, Default)]
pub struct InMemoryAuthRepository {
    users: Arc<Mutex<HashMap<UserId, User>>>,
    sessions: Arc<Mutex<HashMap<SessionId, AuthSession>>>,
}

impl InMemoryAuthRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions
    pub fn session_count(&self) -> AuthResult<usize> {
        Ok(lock(&self.sessions)?.len())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> AuthResult<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| AuthError::Internal("in-memory store poisoned".to_string()))
}

impl UserRepository for InMemoryAuthRepository {
    async fn create(&self, user: &User) -> AuthResult<()> {
        let mut users = lock(&self.users)?;
        if users.values().any(|u| u.email == user.email) {
            return Err(AuthError::EmailTaken);
        }
        users.insert(user.user_id, user.clone());
        Ok(())
    }

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        Ok(lock(&self.users)?.get(user_id).cloned())
    }

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
        Ok(lock(&self.users)?
            .values()
            .find(|u| &u.email == email)
            .cloned())
    }

    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool> {
        Ok(lock(&self.users)?.values().any(|u| &u.email == email))
    }

    async fn update(&self, user: &User) -> AuthResult<()> {
        let mut users = lock(&self.users)?;
        if users
            .values()
            .any(|u| u.user_id != user.user_id && u.email == user.email)
        {
            return Err(AuthError::EmailTaken);
        }

        let stored = users.get_mut(&user.user_id).ok_or(AuthError::UserNotFound)?;
        let verified_at = stored.email_verified_at;
        *stored = user.clone();
        stored.email_verified_at = verified_at;
        Ok(())
    }

    async fn mark_email_verified(&self, user_id: &UserId, at: DateTime<Utc>) -> AuthResult<bool> {
        let mut users = lock(&self.users)?;
        let user = users.get_mut(user_id).ok_or(AuthError::UserNotFound)?;
        Ok(user.mark_email_verified(at))
    }

    async fn replace_password(
        &self,
        user_id: &UserId,
        current: &UserPassword,
        new: &UserPassword,
        at: DateTime<Utc>,
    ) -> AuthResult<bool> {
        let mut users = lock(&self.users)?;
        let user = users.get_mut(user_id).ok_or(AuthError::UserNotFound)?;
        if user.password_hash.as_phc_string() != current.as_phc_string() {
            return Ok(false);
        }
        user.password_hash = new.clone();
        user.updated_at = at;
        Ok(true)
    }
}

impl AuthSessionRepository for InMemoryAuthRepository {
    async fn create(&self, session: &AuthSession) -> AuthResult<()> {
        lock(&self.sessions)?.insert(session.session_id, session.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        session_id: &SessionId,
        fingerprint_hash: &[u8],
        now: DateTime<Utc>,
    ) -> AuthResult<Option<AuthSession>> {
        let sessions = lock(&self.sessions)?;
        let Some(session) = sessions
            .get(session_id)
            .filter(|s| s.expires_at_ms > now.timestamp_millis())
        else {
            return Ok(None);
        };

        if session.client_fingerprint_hash != fingerprint_hash {
            tracing::warn!(session_id = %session_id, "Auth session fingerprint mismatch");
            return Err(AuthError::SessionFingerprintMismatch);
        }

        Ok(Some(session.clone()))
    }

    async fn update(&self, session: &AuthSession) -> AuthResult<()> {
        if let Some(stored) = lock(&self.sessions)?.get_mut(&session.session_id) {
            stored.expires_at_ms = session.expires_at_ms;
            stored.last_activity_at = session.last_activity_at;
        }
        Ok(())
    }

    async fn delete(&self, session_id: &SessionId) -> AuthResult<()> {
        lock(&self.sessions)?.remove(session_id);
        Ok(())
    }

    async fn delete_for_user(&self, user_id: &UserId) -> AuthResult<u64> {
        let mut sessions = lock(&self.sessions)?;
        let before = sessions.len();
        sessions.retain(|_, s| &s.user_id != user_id);
        Ok((before - sessions.len()) as u64)
    }

    async fn cleanup_expired(&self, now: DateTime<Utc>) -> AuthResult<u64> {
        let mut sessions = lock(&self.sessions)?;
        let before = sessions.len();
        sessions.retain(|_, s| s.expires_at_ms >= now.timestamp_millis());
        Ok((before - sessions.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::user_password::RawPassword;
    use chrono::Duration;
    use platform::client::ClientFingerprint;

    fn user(email: &str) -> User {
        let raw = RawPassword::new("correct horse battery".to_string()).unwrap();
        User::new(
            Email::new(email).unwrap(),
            UserPassword::from_raw(&raw, None).unwrap(),
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_email_is_unique() {
        let repo = InMemoryAuthRepository::new();
        UserRepository::create(&repo, &user("a@example.com")).await.unwrap();

        let err = UserRepository::create(&repo, &user("a@example.com")).await.unwrap_err();
        assert!(matches!(err, AuthError::EmailTaken));
        assert!(repo.exists_by_email(&Email::new("a@example.com").unwrap()).await.unwrap());
    }

    #[tokio::test]
    async fn test_mark_email_verified_is_compare_and_set() {
        let repo = InMemoryAuthRepository::new();
        let user = user("a@example.com");
        UserRepository::create(&repo, &user).await.unwrap();
        let first = Utc::now();

        assert!(repo.mark_email_verified(&user.user_id, first).await.unwrap());
        assert!(
            !repo
                .mark_email_verified(&user.user_id, first + Duration::seconds(1))
                .await
                .unwrap()
        );

        let stored = UserRepository::find_by_id(&repo, &user.user_id).await.unwrap().unwrap();
        assert_eq!(stored.email_verified_at, Some(first));
    }

    #[tokio::test]
    async fn test_update_never_unverifies() {
        let repo = InMemoryAuthRepository::new();
        let user = user("a@example.com");
        UserRepository::create(&repo, &user).await.unwrap();
        repo.mark_email_verified(&user.user_id, Utc::now()).await.unwrap();

        // `user` is a stale, unverified snapshot
        UserRepository::update(&repo, &user).await.unwrap();

        let stored = UserRepository::find_by_id(&repo, &user.user_id).await.unwrap().unwrap();
        assert!(stored.has_verified_email());
    }

    #[tokio::test]
    async fn test_cleanup_expired_sessions() {
        let repo = InMemoryAuthRepository::new();
        let now = Utc::now();
        let fp = ClientFingerprint::new([0u8; 32], None, None);
        let short = AuthSession::new(UserId::new(), false, &fp, Duration::hours(1), now);
        let long = AuthSession::new(UserId::new(), true, &fp, Duration::weeks(1), now);
        AuthSessionRepository::create(&repo, &short).await.unwrap();
        AuthSessionRepository::create(&repo, &long).await.unwrap();

        let removed = repo.cleanup_expired(now + Duration::hours(2)).await.unwrap();

        assert_eq!(removed, 1);
        assert_eq!(repo.session_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_replace_password_is_compare_and_set() {
        let repo = InMemoryAuthRepository::new();
        let user = user("a@example.com");
        UserRepository::create(&repo, &user).await.unwrap();

        let raw = RawPassword::new("a brand new passphrase".to_string()).unwrap();
        let first = UserPassword::from_raw(&raw, None).unwrap();
        let second = UserPassword::from_raw(&raw, None).unwrap();

        assert!(
            repo.replace_password(&user.user_id, &user.password_hash, &first, Utc::now())
                .await
                .unwrap()
        );
        // Same expected hash again: someone already replaced it
        assert!(
            !repo
                .replace_password(&user.user_id, &user.password_hash, &second, Utc::now())
                .await
                .unwrap()
        );

        let stored = UserRepository::find_by_id(&repo, &user.user_id).await.unwrap().unwrap();
        assert_eq!(stored.password_hash.as_phc_string(), first.as_phc_string());
    }

    #[tokio::test]
    async fn test_delete_for_user_keeps_other_sessions() {
        let repo = InMemoryAuthRepository::new();
        let now = Utc::now();
        let fp = ClientFingerprint::new([0u8; 32], None, None);
        let alice = UserId::new();
        for _ in 0..2 {
            let session = AuthSession::new(alice, false, &fp, Duration::hours(1), now);
            AuthSessionRepository::create(&repo, &session).await.unwrap();
        }
        let bob = AuthSession::new(UserId::new(), false, &fp, Duration::hours(1), now);
        AuthSessionRepository::create(&repo, &bob).await.unwrap();

        assert_eq!(repo.delete_for_user(&alice).await.unwrap(), 2);
        assert_eq!(repo.session_count().unwrap(), 1);
    }
}
