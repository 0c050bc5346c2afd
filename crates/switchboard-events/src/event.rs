//! Event record delivered by the bus.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// One emitted notification.
///
/// Events are constructed by the [`EventBus`](crate::EventBus) at emission
/// time and handed out as `Arc<Event>`; there is no way to mutate one after
/// it has been emitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    id: Uuid,
    seq: u64,
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    payload: Option<Value>,
    timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    source: Option<String>,
}

impl Event {
    pub(crate) fn new(
        seq: u64,
        event_type: String,
        payload: Option<Value>,
        source: Option<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            seq,
            event_type,
            payload,
            timestamp,
            source,
        }
    }

    /// Unique identifier of this event.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Emission sequence number, strictly increasing per bus.
    #[must_use]
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// The routing key (e.g. `"task:created"`).
    #[must_use]
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// Whether this event carries the given type.
    #[must_use]
    pub fn is(&self, event_type: &str) -> bool {
        self.event_type == event_type
    }

    /// Raw payload, if any.
    #[must_use]
    pub fn payload(&self) -> Option<&Value> {
        self.payload.as_ref()
    }

    /// Decode the payload into a concrete type.
    ///
    /// Returns `Ok(None)` when the event has no payload.
    ///
    /// # Errors
    ///
    /// Returns the serde error if the payload does not match `T`.
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<Option<T>, serde_json::Error> {
        self.payload.as_ref().map(T::deserialize).transpose()
    }

    /// When the bus emitted this event.
    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Free-text label of the emitting component.
    #[must_use]
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }
}

/// Arguments for a single emission, in builder form.
///
/// ```rust
/// use switchboard_events::{EmitRequest, EventBus};
///
/// let bus = EventBus::new();
/// bus.emit_event(
///     EmitRequest::new("task:created")
///         .with_payload(serde_json::json!({ "id": 1 }))
///         .with_source("task-panel"),
/// )
/// .unwrap();
/// assert_eq!(bus.history_len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct EmitRequest {
    pub(crate) event_type: String,
    pub(crate) payload: Option<Value>,
    pub(crate) source: Option<String>,
}

impl EmitRequest {
    /// Start a request for the given event type.
    #[must_use]
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            payload: None,
            source: None,
        }
    }

    /// Attach a payload.
    #[must_use]
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Attach a source label.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}
