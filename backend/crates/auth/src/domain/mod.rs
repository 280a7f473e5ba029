//! Domain Layer
//!
//! Entities, value objects, signed links, events and the ports the
//! application layer depends on.

pub mod entity;
pub mod event;
pub mod notifier;
pub mod repository;
pub mod signed_url;
pub mod value_object;

// Re-exports
pub use entity::{auth_session::AuthSession, user::User};
pub use event::{AuthEvent, EventPublisher};
pub use notifier::VerificationNotifier;
pub use repository::{AuthSessionRepository, UserRepository};
pub use signed_url::{SignedAction, SignedLink, SignedLinkParams, UrlSigner};
