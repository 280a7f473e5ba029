//! Verification Status
//!
//! Two-state machine for a user's email: `Unverified -> Verified`.
//! `Verified` is terminal.

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Unverified,
    Verified,
}

impl VerificationStatus {
    /// Derive from the stored `email_verified_at` column
    pub fn from_verified_at(verified_at: Option<DateTime<Utc>>) -> Self {
        match verified_at {
            Some(_) => VerificationStatus::Verified,
            None => VerificationStatus::Unverified,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, VerificationStatus::Verified)
    }
}
