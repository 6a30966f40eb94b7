//! Session lifecycle event broadcast.
//!
//! Cross-component notification happens over an explicit broadcast channel
//! rather than ad hoc global dispatch. One listener (the bootstrapper)
//! reacts today, but any number may subscribe.

use tokio::sync::broadcast;

/// Capacity of the session event channel.
/// Events are rare (one per failed renewal), so 16 leaves plenty of headroom
/// for slow subscribers.
const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Events announcing session lifecycle changes outside the normal call flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// The access token could not be renewed. Carries no payload; by the
    /// time a listener runs, the session is already unrecoverable.
    Expired,
}

/// Broadcast handle for session events.
/// Clone is cheap - all clones feed the same channel.
#[derive(Clone, Debug)]
pub struct SessionEvents {
    tx: broadcast::Sender<SessionEvent>,
}

impl SessionEvents {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Subscribe to session events. Dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    /// Announce that the session can no longer be renewed.
    /// Sending fails only when no receiver exists, which is not an error.
    pub fn emit_expired(&self) {
        let _ = self.tx.send(SessionEvent::Expired);
    }
}

impl Default for SessionEvents {
    fn default() -> Self {
        Self::new()
    }
}
