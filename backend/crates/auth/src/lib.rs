//! Auth (Authentication) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, signed links, repository traits
//! - `application/` - Use cases and configuration
//! - `infra/` - PostgreSQL and in-memory stores, mail transports, event bus
//! - `presentation/` - HTTP handlers, DTOs, router, middleware
//!
//! ## Features
//! - Registration and email + password sign in
//! - Server-side sessions with cookie-based tokens
//! - Email verification through signed, expiring links
//! - `EmailVerified` emitted exactly once per user
//!
//! ## Security Model
//! - Passwords hashed with Argon2id (NIST SP 800-63B compliant)
//! - Sessions bound to client fingerprint (User-Agent)
//! - Links signed with HMAC-SHA256 and bound to the current email
//! - Every rejected link answers the same 403

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::AuthConfig;
pub use error::{AuthError, AuthResult, VerificationError};
pub use infra::events::{EventBus, log_events};
pub use infra::mail::LogMailer;
pub use infra::memory::InMemoryAuthRepository;
pub use infra::postgres::PgAuthRepository;
pub use presentation::router::{auth_router, auth_router_generic};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
    pub use crate::presentation::dto::*;
}
