//! Session lifecycle notifications for the hosting application
//!
//! The engine only needs a "publish" capability; hosts choose how events
//! fan out. [`BroadcastEventBus`] is the stock implementation.

use tokio::sync::broadcast;
use tracing::debug;

const DEFAULT_CAPACITY: usize = 16;

/// Notifications emitted by the engine outside the normal call/return path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionEvent {
    /// The authorization server rejected the refresh token; the session has
    /// already been cleared and the user must sign in again
    SessionExpired,
}

/// Capability to publish [`SessionEvent`]s; must never block
pub trait SessionEventPublisher: Send + Sync {
    /// Fire-and-forget publish
    fn publish(&self, event: SessionEvent);
}

/// Publisher that drops every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPublisher;

impl SessionEventPublisher for NoopPublisher {
    fn publish(&self, _event: SessionEvent) {}
}

/// Broadcast-based publisher
///
/// Slow receivers lag rather than blocking the engine.
#[derive(Debug, Clone)]
pub struct BroadcastEventBus {
    tx: broadcast::Sender<SessionEvent>,
}

impl BroadcastEventBus {
    /// Create a bus with the default channel capacity
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a bus with a custom channel capacity
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Receive every event published after this call
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    /// Number of live subscribers
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for BroadcastEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionEventPublisher for BroadcastEventBus {
    fn publish(&self, event: SessionEvent) {
        let delivered = self.tx.send(event).unwrap_or(0);
        debug!(?event, delivered, "Published session event");
    }
}
