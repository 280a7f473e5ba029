//! API DTOs (Data Transfer Objects)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entity::user::User;

// ============================================================================
// Register / Login
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub remember_me: bool,
}

/// Body of register and login responses
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub user_id: String,
    pub email: String,
    pub email_verified: bool,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.user_id.to_string(),
            email: user.email.to_string(),
            email_verified: user.has_verified_email(),
        }
    }
}

// ============================================================================
// Email Verification
// ============================================================================

/// `GET /verify-email` query
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PromptQuery {
    pub status: Option<String>,
}

/// Verification prompt for an unverified user
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationPromptResponse {
    pub email: String,
    pub email_verified: bool,
    /// `verification-link-sent` right after a resend
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Signed link query; kept raw so malformed values reach the signature check
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VerifyEmailQuery {
    pub expires: Option<String>,
    pub signature: Option<String>,
}

// ============================================================================
// Password Reset
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// Reset form: the link parameters plus the new password
#[derive(Debug, Clone, Deserialize)]
pub struct ResetPasswordRequest {
    pub id: String,
    pub hash: String,
    pub expires: Option<String>,
    pub signature: Option<String>,
    pub password: String,
}

/// Body carrying only a status flag
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

// ============================================================================
// Dashboard
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub user_id: String,
    pub email: String,
    pub email_verified_at: Option<DateTime<Utc>>,
}
