//! Auth Error Types
//!
//! Auth-specific error variants that integrate with the unified
//! `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Body shown for every rejected verification link
const VERIFICATION_REJECTED: &str = "This action is unauthorized.";

/// Why a signed verification link was rejected
///
/// All variants surface to the client as the same 403; the variant is only
/// visible in logs and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VerificationError {
    /// Link was issued for a different user than the session's
    #[error("verification link subject does not match the session user")]
    Forbidden,

    /// Signature missing, malformed or not matching the parameters
    #[error("verification link signature is invalid")]
    InvalidSignature,

    /// Link is past its expiry
    #[error("verification link has expired")]
    Expired,

    /// Email changed since the link was issued
    #[error("verification link was issued for a different email")]
    StaleContent,
}

impl VerificationError {
    /// Short machine-readable reason for log fields
    pub fn reason(&self) -> &'static str {
        match self {
            VerificationError::Forbidden => "subject_mismatch",
            VerificationError::InvalidSignature => "invalid_signature",
            VerificationError::Expired => "expired",
            VerificationError::StaleContent => "stale_content",
        }
    }
}

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("User not found")]
    UserNotFound,

    #[error("Email address is already registered")]
    EmailTaken,

    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// Wrong email or password (deliberately not distinguished)
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Session not found or expired")]
    SessionInvalid,

    #[error("Session fingerprint mismatch")]
    SessionFingerprintMismatch,

    #[error("Missing required header: {0}")]
    MissingHeader(String),

    #[error("Password validation failed: {0}")]
    PasswordValidation(String),

    #[error(transparent)]
    Verification(#[from] VerificationError),

    #[error("Notification delivery failed: {0}")]
    Notification(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::UserNotFound => ErrorKind::NotFound,
            AuthError::EmailTaken => ErrorKind::Conflict,
            AuthError::InvalidEmail(_) | AuthError::PasswordValidation(_) => {
                ErrorKind::UnprocessableEntity
            }
            AuthError::InvalidCredentials
            | AuthError::SessionInvalid
            | AuthError::SessionFingerprintMismatch => ErrorKind::Unauthorized,
            AuthError::MissingHeader(_) => ErrorKind::BadRequest,
            AuthError::Verification(_) => ErrorKind::Forbidden,
            AuthError::Notification(_) => ErrorKind::ServiceUnavailable,
            AuthError::Database(_) | AuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Convert to AppError, hiding details the client must not see
    pub fn to_app_error(&self) -> AppError {
        match self {
            AuthError::Verification(_) => AppError::forbidden(VERIFICATION_REJECTED),
            AuthError::Database(_) | AuthError::Internal(_) => {
                AppError::internal("Internal server error")
            }
            AuthError::Notification(_) => AppError::service_unavailable(
                "The verification email could not be sent",
            )
            .with_action("Try again in a few minutes"),
            _ => AppError::new(self.kind(), self.to_string()),
        }
    }

    fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::Notification(msg) => {
                tracing::error!(message = %msg, "Verification notification failed");
            }
            AuthError::Verification(e) => {
                tracing::warn!(reason = e.reason(), "Verification link rejected");
            }
            AuthError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            AuthError::SessionFingerprintMismatch => {
                tracing::warn!("Session fingerprint mismatch detected");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

impl From<platform::client::FingerprintError> for AuthError {
    fn from(err: platform::client::FingerprintError) -> Self {
        match err {
            platform::client::FingerprintError::MissingHeader(header) => {
                AuthError::MissingHeader(header)
            }
        }
    }
}
