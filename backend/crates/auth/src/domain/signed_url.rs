//! Signed Links
//!
//! A signed link is a URL whose own contents carry everything needed to
//! check it, so nothing is stored server-side:
//!
//! ```text
//! {app_url}/verify-email/{id}/{hash}?expires={unix_secs}&signature={hex}
//! {app_url}/reset-password/{id}/{hash}?expires={unix_secs}&signature={hex}
//! ```
//!
//! - `hash` is an HMAC-SHA256 of the state the action consumes (the email
//!   for verification, the password hash for a reset), so the link dies
//!   when that state changes
//! - `signature` is an HMAC-SHA256 over `"{path}?expires={expires}"`, so
//!   the action, subject, hash and expiry cannot be altered
//!
//! Both use the application signing key. Parameters must be in the exact
//! form `issue` writes them; any other spelling is a different link.

use chrono::{DateTime, TimeZone, Utc};
use kernel::id::UserId;
use platform::crypto::{from_hex, hmac_sha256, to_hex, verify_hmac_sha256};

use crate::domain::entity::user::User;
use crate::error::VerificationError;

/// Route prefix of verification links
pub const VERIFY_EMAIL_PATH: &str = "/verify-email";

/// Route prefix of password reset links
pub const RESET_PASSWORD_PATH: &str = "/reset-password";

/// What a signed link authorizes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignedAction {
    VerifyEmail,
    ResetPassword,
}

impl SignedAction {
    pub fn path(&self) -> &'static str {
        match self {
            SignedAction::VerifyEmail => VERIFY_EMAIL_PATH,
            SignedAction::ResetPassword => RESET_PASSWORD_PATH,
        }
    }

    fn content_input(&self, user: &User) -> String {
        match self {
            SignedAction::VerifyEmail => format!("email:{}", user.email),
            SignedAction::ResetPassword => {
                format!("password:{}", user.password_hash.as_phc_string())
            }
        }
    }
}

/// A freshly issued signed link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedLink {
    pub action: SignedAction,
    pub user_id: UserId,
    pub hash: String,
    /// Unix seconds
    pub expires: i64,
    pub signature: String,
    /// Absolute URL sent to the user
    pub url: String,
}

impl SignedLink {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.expires, 0).single()
    }
}

/// Link parameters exactly as they arrived in the request
///
/// Nothing is parsed or trusted yet; `expires` and `signature` may be
/// missing or malformed.
#[derive(Debug, Clone, Default)]
pub struct SignedLinkParams {
    pub id: String,
    pub hash: String,
    pub expires: Option<String>,
    pub signature: Option<String>,
}

impl From<&SignedLink> for SignedLinkParams {
    fn from(link: &SignedLink) -> Self {
        Self {
            id: link.user_id.to_string(),
            hash: link.hash.clone(),
            expires: Some(link.expires.to_string()),
            signature: Some(link.signature.clone()),
        }
    }
}

/// Issues and checks signed links with one process-wide key
#[derive(Clone)]
pub struct UrlSigner {
    key: Vec<u8>,
    app_url: String,
}

impl UrlSigner {
    pub fn new(key: impl Into<Vec<u8>>, app_url: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            app_url: app_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn path(action: SignedAction, id: &str, hash: &str) -> String {
        format!("{}/{id}/{hash}", action.path())
    }

    fn signing_input(path: &str, expires: &str) -> String {
        format!("{path}?expires={expires}")
    }

    /// Keyed hash binding a link to the state `action` consumes
    pub fn content_hash(&self, action: SignedAction, user: &User) -> String {
        to_hex(&hmac_sha256(&self.key, action.content_input(user).as_bytes()))
    }

    /// Build an email verification link for `user` valid until `expires_at`
    pub fn issue(&self, user: &User, expires_at: DateTime<Utc>) -> SignedLink {
        self.issue_for(SignedAction::VerifyEmail, user, expires_at)
    }

    /// Build a link authorizing `action` for `user` until `expires_at`
    pub fn issue_for(
        &self,
        action: SignedAction,
        user: &User,
        expires_at: DateTime<Utc>,
    ) -> SignedLink {
        let id = user.user_id.to_string();
        let hash = self.content_hash(action, user);
        let expires = expires_at.timestamp();

        let path = Self::path(action, &id, &hash);
        let signature = to_hex(&hmac_sha256(
            &self.key,
            Self::signing_input(&path, &expires.to_string()).as_bytes(),
        ));
        let url = format!(
            "{}{}?expires={}&signature={}",
            self.app_url, path, expires, signature
        );

        SignedLink {
            action,
            user_id: user.user_id,
            hash,
            expires,
            signature,
            url,
        }
    }

    /// Check an email verification link against the session user, in this
    /// order: subject, signature, expiry, content hash
    pub fn check(
        &self,
        params: &SignedLinkParams,
        session_user: &User,
        now: DateTime<Utc>,
    ) -> Result<(), VerificationError> {
        if params.id != session_user.user_id.to_string() {
            return Err(VerificationError::Forbidden);
        }

        self.check_signature(SignedAction::VerifyEmail, params, now)?;
        self.check_content(SignedAction::VerifyEmail, params, session_user)
    }

    /// Signature then expiry; needs no user, so it can run before a lookup
    pub fn check_signature(
        &self,
        action: SignedAction,
        params: &SignedLinkParams,
        now: DateTime<Utc>,
    ) -> Result<(), VerificationError> {
        let raw_expires = params
            .expires
            .as_deref()
            .ok_or(VerificationError::InvalidSignature)?;
        let expires = parse_expires(raw_expires).ok_or(VerificationError::InvalidSignature)?;
        let signature = params
            .signature
            .as_deref()
            .and_then(from_hex)
            .ok_or(VerificationError::InvalidSignature)?;

        let path = Self::path(action, &params.id, &params.hash);
        if !verify_hmac_sha256(
            &self.key,
            Self::signing_input(&path, raw_expires).as_bytes(),
            &signature,
        ) {
            return Err(VerificationError::InvalidSignature);
        }

        if now.timestamp() > expires {
            return Err(VerificationError::Expired);
        }

        Ok(())
    }

    /// Content hash against the user's current state
    pub fn check_content(
        &self,
        action: SignedAction,
        params: &SignedLinkParams,
        user: &User,
    ) -> Result<(), VerificationError> {
        let content_ok = from_hex(&params.hash).is_some_and(|hash| {
            verify_hmac_sha256(&self.key, action.content_input(user).as_bytes(), &hash)
        });
        if !content_ok {
            return Err(VerificationError::StaleContent);
        }

        Ok(())
    }
}

/// Unix seconds in canonical decimal (no sign, no padding)
fn parse_expires(raw: &str) -> Option<i64> {
    raw.parse::<i64>()
        .ok()
        .filter(|expires| expires.to_string() == raw)
}

impl std::fmt::Debug for UrlSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlSigner")
            .field("key", &"[REDACTED]")
            .field("app_url", &self.app_url)
            .finish()
    }
}
