//! User Entity
//!
//! Account record owning the email verification state.

use chrono::{DateTime, Utc};
use kernel::id::UserId;

use crate::domain::value_object::{
    email::Email, user_password::UserPassword, verification_status::VerificationStatus,
};

#[derive(Debug, Clone)]
pub struct User {
    /// Internal UUID identifier (also the `{id}` segment of verification links)
    pub user_id: UserId,
    /// Unique, normalised email
    pub email: Email,
    /// Argon2id hash
    pub password_hash: UserPassword,
    /// `None` until the email is verified; never reset afterwards
    pub email_verified_at: Option<DateTime<Utc>>,
    /// Last successful login time
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new, unverified user
    pub fn new(email: Email, password_hash: UserPassword, now: DateTime<Utc>) -> Self {
        Self {
            user_id: UserId::new(),
            email,
            password_hash,
            email_verified_at: None,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_verified_email(&self) -> bool {
        self.email_verified_at.is_some()
    }

    pub fn verification_status(&self) -> VerificationStatus {
        VerificationStatus::from_verified_at(self.email_verified_at)
    }

    /// Apply the `Unverified -> Verified` transition
    ///
    /// Returns `false` (and changes nothing) if already verified.
    pub fn mark_email_verified(&mut self, now: DateTime<Utc>) -> bool {
        if self.has_verified_email() {
            return false;
        }
        self.email_verified_at = Some(now);
        self.updated_at = now;
        true
    }

    /// Record successful login
    pub fn record_login(&mut self, now: DateTime<Utc>) {
        self.last_login_at = Some(now);
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::user_password::RawPassword;
    use chrono::Duration;

    fn user(now: DateTime<Utc>) -> User {
        let raw = RawPassword::new("correct horse battery".to_string()).unwrap();
        User::new(
            Email::new("user@example.com").unwrap(),
            UserPassword::from_raw(&raw, None).unwrap(),
            now,
        )
    }

    #[test]
    fn test_new_user_is_unverified() {
        let user = user(Utc::now());
        assert!(!user.has_verified_email());
        assert_eq!(user.verification_status(), VerificationStatus::Unverified);
    }

    #[test]
    fn test_verification_is_monotonic() {
        let now = Utc::now();
        let mut user = user(now);

        assert!(user.mark_email_verified(now));
        assert_eq!(user.email_verified_at, Some(now));

        // A second transition is a no-op and keeps the first timestamp
        assert!(!user.mark_email_verified(now + Duration::minutes(5)));
        assert_eq!(user.email_verified_at, Some(now));
        assert_eq!(user.verification_status(), VerificationStatus::Verified);
    }

    #[test]
    fn test_record_login() {
        let now = Utc::now();
        let mut user = user(now);
        let later = now + Duration::hours(1);

        user.record_login(later);
        assert_eq!(user.last_login_at, Some(later));
        assert_eq!(user.updated_at, later);
    }
}
