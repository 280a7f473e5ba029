//! User Password Value Object
//!
//! Domain wrappers over `platform::password`. Policy violations become
//! `AuthError::PasswordValidation`; hashing failures are internal errors.

use platform::password::{ClearTextPassword, HashedPassword, PasswordPolicyError};
use std::fmt;

use crate::error::{AuthError, AuthResult};

/// Password as typed by the user, zeroized on drop
pub struct RawPassword(ClearTextPassword);

impl RawPassword {
    /// Validate a newly chosen password against the policy
    pub fn new(raw: String) -> AuthResult<Self> {
        let clear_text = ClearTextPassword::new(raw).map_err(|e| {
            let message = match e {
                PasswordPolicyError::TooShort { min, .. } => {
                    format!("password must be at least {min} characters")
                }
                PasswordPolicyError::TooLong { max, .. } => {
                    format!("password must be at most {max} characters")
                }
                PasswordPolicyError::EmptyOrWhitespace => "password cannot be empty".to_string(),
                PasswordPolicyError::InvalidCharacter => {
                    "password contains invalid control characters".to_string()
                }
            };
            AuthError::PasswordValidation(message)
        })?;

        Ok(Self(clear_text))
    }

    /// Login attempt: normalised but never rejected by policy
    pub fn for_login(raw: String) -> Self {
        Self(ClearTextPassword::normalized(raw))
    }
}

impl fmt::Debug for RawPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RawPassword([REDACTED])")
    }
}

/// Stored Argon2id hash
#[derive(Clone, PartialEq, Eq)]
pub struct UserPassword(HashedPassword);

impl UserPassword {
    pub fn from_raw(raw: &RawPassword, pepper: Option<&[u8]>) -> AuthResult<Self> {
        raw.0
            .hash(pepper)
            .map(Self)
            .map_err(|e| AuthError::Internal(e.to_string()))
    }

    pub fn from_db(phc: impl Into<String>) -> AuthResult<Self> {
        HashedPassword::from_phc_string(phc)
            .map(Self)
            .map_err(|e| AuthError::Internal(format!("Invalid password hash: {e}")))
    }

    pub fn as_phc_string(&self) -> &str {
        self.0.as_phc_string()
    }

    pub fn verify(&self, raw: &RawPassword, pepper: Option<&[u8]>) -> bool {
        self.0.verify(&raw.0, pepper)
    }
}

impl fmt::Debug for UserPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("UserPassword([HASH])")
    }
}
