//! Application Configuration
//!
//! Every secret and policy value the use cases need, injected explicitly.

use std::time::Duration;

use platform::cookie::CookieConfig;
use platform::crypto::random_secret;

/// Re-export SameSite from platform
pub use platform::cookie::SameSite;

use crate::domain::signed_url::{UrlSigner, VERIFY_EMAIL_PATH};
use crate::error::{AuthError, AuthResult};

/// Status flag reported after a verification link was (re)sent
pub const VERIFICATION_LINK_SENT: &str = "verification-link-sent";

/// Status reported for every password reset request, known email or not
pub const RESET_LINK_SENT: &str = "reset-link-sent";

/// Status reported after a password was replaced
pub const PASSWORD_RESET: &str = "password-reset";

#[derive(Clone)]
pub struct AuthConfig {
    /// Public base URL used in verification links
    pub app_url: String,
    /// Key for signing verification links (process-wide, never rotated at runtime)
    pub url_signing_key: [u8; 32],
    /// Lifetime of a verification link (60 minutes)
    pub verification_ttl: Duration,
    /// Lifetime of a password reset link (60 minutes)
    pub password_reset_ttl: Duration,
    /// Where verified users land
    pub landing_path: String,
    /// Session cookie name
    pub session_cookie_name: String,
    /// Session secret key for HMAC signing (32 bytes)
    pub session_secret: [u8; 32],
    /// Session TTL without "Remember Me" (12 hours)
    pub session_ttl_short: Duration,
    /// Session TTL with "Remember Me" (1 week)
    pub session_ttl_long: Duration,
    pub cookie_secure: bool,
    pub cookie_same_site: SameSite,
    /// Password pepper (optional, application-wide secret)
    pub password_pepper: Option<Vec<u8>>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            app_url: "http://localhost:31113".to_string(),
            url_signing_key: [0u8; 32],
            verification_ttl: Duration::from_secs(60 * 60),
            password_reset_ttl: Duration::from_secs(60 * 60),
            landing_path: "/dashboard".to_string(),
            session_cookie_name: "auth_session".to_string(),
            session_secret: [0u8; 32],
            session_ttl_short: Duration::from_secs(12 * 3600), // 12 hours
            session_ttl_long: Duration::from_secs(7 * 24 * 3600), // 1 week
            cookie_secure: true,
            cookie_same_site: SameSite::Lax,
            password_pepper: None,
        }
    }
}

impl AuthConfig {
    /// Config with random signing and session secrets
    pub fn with_random_secret() -> Self {
        Self {
            url_signing_key: random_secret(),
            session_secret: random_secret(),
            ..Default::default()
        }
    }

    /// Config for development (random secrets, insecure cookie)
    pub fn development() -> Self {
        Self {
            cookie_secure: false,
            ..Self::with_random_secret()
        }
    }

    pub fn url_signer(&self) -> UrlSigner {
        UrlSigner::new(self.url_signing_key.to_vec(), self.app_url.clone())
    }

    pub fn session_cookie(&self) -> CookieConfig {
        CookieConfig::new(
            self.session_cookie_name.clone(),
            self.cookie_secure,
            self.cookie_same_site,
        )
    }

    /// Session TTL for the given remember-me choice
    pub fn session_ttl(&self, remember_me: bool) -> Duration {
        if remember_me {
            self.session_ttl_long
        } else {
            self.session_ttl_short
        }
    }

    pub fn pepper(&self) -> Option<&[u8]> {
        self.password_pepper.as_deref()
    }

    /// Redirect target after a successful (or repeated) verification
    pub fn verified_redirect(&self) -> String {
        let separator = if self.landing_path.contains('?') { '&' } else { '?' };
        format!("{}{}verified=1", self.landing_path, separator)
    }

    /// Redirect target after a link was resent
    pub fn link_sent_redirect(&self) -> String {
        format!("{VERIFY_EMAIL_PATH}?status={VERIFICATION_LINK_SENT}")
    }
}

/// Convert a configured TTL into a chrono duration
pub fn chrono_ttl(ttl: Duration) -> AuthResult<chrono::Duration> {
    chrono::Duration::from_std(ttl)
        .map_err(|e| AuthError::Internal(format!("Invalid TTL: {e}")))
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("app_url", &self.app_url)
            .field("url_signing_key", &"[REDACTED]")
            .field("verification_ttl", &self.verification_ttl)
            .field("password_reset_ttl", &self.password_reset_ttl)
            .field("landing_path", &self.landing_path)
            .field("session_cookie_name", &self.session_cookie_name)
            .field("session_secret", &"[REDACTED]")
            .field("session_ttl_short", &self.session_ttl_short)
            .field("session_ttl_long", &self.session_ttl_long)
            .field("cookie_secure", &self.cookie_secure)
            .field("cookie_same_site", &self.cookie_same_site)
            .field("password_pepper", &self.password_pepper.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}
