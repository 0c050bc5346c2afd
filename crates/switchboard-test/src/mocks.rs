//! Mock subscribers for testing.
//!
//! All mocks are cheap to clone; clones share their recorded state, so a
//! test can hand one clone to the bus and inspect another.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use switchboard_events::{Event, EventSubscriber, SubscriberError, SubscriberResult};

/// Records every event it receives, in delivery order.
#[derive(Debug, Clone, Default)]
pub struct RecordingSubscriber {
    name: String,
    events: Arc<Mutex<Vec<Event>>>,
}

impl RecordingSubscriber {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::named("recorder")
    }

    /// Create an empty recorder reporting `name` to the bus.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            events: Arc::default(),
        }
    }

    /// Snapshot of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<Event> {
        self.lock().clone()
    }

    /// Number of recorded events.
    #[must_use]
    pub fn count(&self) -> usize {
        self.lock().len()
    }

    /// The most recent recorded event.
    #[must_use]
    pub fn last(&self) -> Option<Event> {
        self.lock().last().cloned()
    }

    /// Event types of the recorded events, in order.
    #[must_use]
    pub fn event_types(&self) -> Vec<String> {
        self.lock()
            .iter()
            .map(|e| e.event_type().to_owned())
            .collect()
    }

    /// Forget everything recorded so far.
    pub fn reset(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Event>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl EventSubscriber for RecordingSubscriber {
    fn on_event(&self, event: &Event) -> SubscriberResult {
        self.lock().push(event.clone());
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Always returns an error, counting its invocations.
#[derive(Debug, Clone, Default)]
pub struct FailingSubscriber {
    calls: Arc<AtomicUsize>,
}

impl FailingSubscriber {
    /// Create a failing subscriber.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times it was invoked.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl EventSubscriber for FailingSubscriber {
    fn on_event(&self, event: &Event) -> SubscriberResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(SubscriberError::failed(format!(
            "refused '{}'",
            event.event_type()
        )))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Panics on every event, counting its invocations.
#[derive(Debug, Clone, Default)]
pub struct PanickingSubscriber {
    calls: Arc<AtomicUsize>,
}

impl PanickingSubscriber {
    /// Create a panicking subscriber.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times it was invoked.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl EventSubscriber for PanickingSubscriber {
    fn on_event(&self, event: &Event) -> SubscriberResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        panic!("subscriber panicked on '{}'", event.event_type());
    }

    fn name(&self) -> &str {
        "panicking"
    }
}
