//! Platform Crate - Technical Infrastructure
//!
//! Shared technical foundations with no domain knowledge:
//! - Cryptographic utilities (SHA-256, HMAC-SHA256, Base64)
//! - Password hashing (Argon2id, NIST SP 800-63B compliant)
//! - Clock abstraction
//! - Cookie and client fingerprint helpers

pub mod client;
pub mod clock;
pub mod cookie;
pub mod crypto;
pub mod password;
