//! Async receivers backed by a broadcast channel.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::warn;

use crate::event::Event;

/// Receiver for events from the event bus.
///
/// Sees every event emitted after it was created, in emission order. A
/// receiver that falls more than the channel capacity behind skips the
/// oldest events and logs a warning.
pub struct EventReceiver {
    receiver: broadcast::Receiver<Arc<Event>>,
    /// Exact event type, or a prefix ending in `*`.
    pattern: Option<String>,
}

impl EventReceiver {
    pub(crate) fn new(receiver: broadcast::Receiver<Arc<Event>>, pattern: Option<String>) -> Self {
        Self { receiver, pattern }
    }

    /// The filter pattern, if any.
    #[must_use]
    pub fn pattern(&self) -> Option<&str> {
        self.pattern.as_deref()
    }

    fn matches(&self, event: &Event) -> bool {
        let Some(pattern) = &self.pattern else {
            return true;
        };

        if let Some(prefix) = pattern.strip_suffix('*') {
            event.event_type().starts_with(prefix)
        } else {
            event.event_type() == pattern
        }
    }

    /// Receive the next matching event.
    ///
    /// Returns `None` once the bus (and every clone of it) has been dropped.
    pub async fn recv(&mut self) -> Option<Arc<Event>> {
        let mut skipped: usize = 0;
        loop {
            match self.receiver.recv().await {
                Ok(event) => {
                    if self.matches(&event) {
                        return Some(event);
                    }
                    skipped = skipped.wrapping_add(1);
                    if skipped.is_multiple_of(100) {
                        tokio::task::yield_now().await;
                    }
                },
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    warn!(skipped = count, "Event receiver lagged, events dropped");
                },
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Receive the next matching event without waiting.
    ///
    /// Returns `None` if nothing matching is buffered or the channel is
    /// closed.
    pub fn try_recv(&mut self) -> Option<Arc<Event>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.matches(&event) {
                        return Some(event);
                    }
                },
                Err(broadcast::error::TryRecvError::Lagged(count)) => {
                    warn!(skipped = count, "Event receiver lagged, events dropped");
                },
                Err(
                    broadcast::error::TryRecvError::Empty | broadcast::error::TryRecvError::Closed,
                ) => return None,
            }
        }
    }
}

impl std::fmt::Debug for EventReceiver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventReceiver")
            .field("pattern", &self.pattern)
            .finish_non_exhaustive()
    }
}
