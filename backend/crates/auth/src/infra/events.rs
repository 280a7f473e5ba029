//! In-process event bus
//!
//! Fan-out over a tokio broadcast channel. Publishing with no subscriber is
//! not an error; a lagging subscriber loses the oldest events.

use tokio::sync::broadcast;

use crate::domain::event::{AuthEvent, EventPublisher};
use crate::error::AuthResult;

const DEFAULT_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<AuthEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventPublisher for EventBus {
    async fn publish(&self, event: AuthEvent) -> AuthResult<()> {
        let name = event.name();
        let user_id = event.user_id();
        let receivers = self.sender.send(event).unwrap_or(0);

        tracing::debug!(event = name, user_id = %user_id, receivers, "Auth event published");
        Ok(())
    }
}

/// Log every event until the bus is dropped
pub async fn log_events(mut rx: broadcast::Receiver<AuthEvent>) {
    loop {
        match rx.recv().await {
            Ok(event) => {
                tracing::info!(event = event.name(), user_id = %event.user_id(), "Auth event");
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Auth event log lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
