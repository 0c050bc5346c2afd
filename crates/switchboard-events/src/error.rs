//! Event bus error types.

use thiserror::Error;

/// Errors returned to callers of the bus for misuse.
///
/// Subscriber faults are never surfaced here; they are logged and delivery
/// continues.
#[derive(Debug, Error)]
pub enum EventBusError {
    /// The event type (or receiver pattern) was empty or whitespace.
    #[error("event type must not be empty")]
    EmptyEventType,

    /// A typed payload could not be encoded.
    #[error("failed to encode payload for '{event_type}': {source}")]
    Serialization {
        /// Event type being emitted.
        event_type: &'static str,
        /// Underlying serde error.
        #[source]
        source: serde_json::Error,
    },
}

/// Result type for event bus operations.
pub type EventBusResult<T> = Result<T, EventBusError>;

/// Error raised by a subscriber while handling an event.
#[derive(Debug, Error)]
pub enum SubscriberError {
    /// The handler reported a failure.
    #[error("{0}")]
    Failed(String),

    /// A typed subscriber received an event without a payload.
    #[error("event '{event_type}' has no payload")]
    MissingPayload {
        /// The event type that was received.
        event_type: String,
    },

    /// A typed subscriber could not decode the payload.
    #[error("payload decode failed: {0}")]
    Payload(#[from] serde_json::Error),
}

impl SubscriberError {
    /// Build a [`SubscriberError::Failed`] from any displayable message.
    #[must_use]
    pub fn failed(message: impl std::fmt::Display) -> Self {
        Self::Failed(message.to_string())
    }
}

/// Result type returned by subscribers.
pub type SubscriberResult = Result<(), SubscriberError>;

pub(crate) fn validate_event_type(event_type: &str) -> EventBusResult<()> {
    if event_type.trim().is_empty() {
        return Err(EventBusError::EmptyEventType);
    }
    Ok(())
}
