//! Infrastructure Layer
//!
//! Database implementations and external service integrations.

pub mod events;
pub mod mail;
pub mod memory;
pub mod postgres;

pub use events::EventBus;
pub use mail::{LogMailer, OutboxMailer};
pub use memory::InMemoryAuthRepository;
pub use postgres::PgAuthRepository;
