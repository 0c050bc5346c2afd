//! Event subscriber trait and registry.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{trace, warn};
use uuid::Uuid;

use crate::error::SubscriberResult;
use crate::event::Event;

/// Trait for synchronous event subscribers.
///
/// `on_event` runs on the emitting thread before `emit` returns, so it
/// should return quickly. Hand heavy work to an
/// [`EventReceiver`](crate::EventReceiver) or a task of your own.
///
/// A returned error or a panic is caught by the bus, logged, and does not
/// affect delivery to other subscribers. The subscriber stays registered.
pub trait EventSubscriber: Send + Sync {
    /// Called for every emitted event of the registered type.
    ///
    /// # Errors
    ///
    /// Any error is logged by the bus and otherwise ignored.
    fn on_event(&self, event: &Event) -> SubscriberResult;

    /// Optional name for debugging.
    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "anonymous"
    }
}

/// Closure-backed subscriber.
pub struct FnSubscriber<F> {
    name: String,
    handler: F,
}

impl<F> FnSubscriber<F>
where
    F: Fn(&Event) -> SubscriberResult + Send + Sync,
{
    /// Wrap a fallible closure.
    pub fn new(name: impl Into<String>, handler: F) -> Self {
        Self {
            name: name.into(),
            handler,
        }
    }
}

impl<F> EventSubscriber for FnSubscriber<F>
where
    F: Fn(&Event) -> SubscriberResult + Send + Sync,
{
    fn on_event(&self, event: &Event) -> SubscriberResult {
        (self.handler)(event)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl<F> fmt::Debug for FnSubscriber<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnSubscriber")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Registration handle identifier.
///
/// Unique across every bus in the process, so an id handed to the wrong
/// bus matches nothing there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(Uuid);

impl SubscriberId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// One registration record.
#[derive(Clone)]
pub(crate) struct Registration {
    pub(crate) id: SubscriberId,
    pub(crate) subscriber: Arc<dyn EventSubscriber>,
}

/// Registrations grouped by event type.
///
/// Not synchronized on its own: the bus keeps it behind the same lock as
/// the history buffer.
#[derive(Default)]
pub(crate) struct SubscriberRegistry {
    by_type: HashMap<String, Vec<Registration>>,
    types: HashMap<SubscriberId, String>,
}

impl SubscriberRegistry {
    pub(crate) fn insert(
        &mut self,
        event_type: String,
        subscriber: Arc<dyn EventSubscriber>,
    ) -> SubscriberId {
        let id = SubscriberId::new();

        self.types.insert(id, event_type.clone());
        self.by_type
            .entry(event_type)
            .or_default()
            .push(Registration { id, subscriber });
        id
    }

    /// Remove a registration, handing it back so the caller can drop it
    /// after releasing the bus lock.
    pub(crate) fn remove(&mut self, id: SubscriberId) -> Option<Registration> {
        let event_type = self.types.remove(&id)?;
        let list = self.by_type.get_mut(&event_type)?;
        let position = list.iter().position(|r| r.id == id)?;
        let removed = list.remove(position);
        if list.is_empty() {
            self.by_type.remove(&event_type);
        }
        Some(removed)
    }

    pub(crate) fn contains(&self, id: SubscriberId) -> bool {
        self.types.contains_key(&id)
    }

    /// Copy of the current registrations for `event_type`.
    pub(crate) fn snapshot(&self, event_type: &str) -> Vec<Registration> {
        self.by_type.get(event_type).cloned().unwrap_or_default()
    }

    /// Remove everything.
    pub(crate) fn drain(&mut self) -> Vec<Registration> {
        self.types.clear();
        self.by_type.drain().flat_map(|(_, list)| list).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.types.len()
    }

    pub(crate) fn len_for(&self, event_type: &str) -> usize {
        self.by_type.get(event_type).map_or(0, Vec::len)
    }
}

/// Outcome of delivering one event to a snapshot of subscribers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Delivery {
    pub(crate) invoked: usize,
    pub(crate) faults: usize,
}

/// Invoke every target, isolating errors and panics per subscriber.
pub(crate) fn deliver(event: &Event, targets: &[Registration]) -> Delivery {
    let mut delivery = Delivery::default();

    for registration in targets {
        let subscriber = &registration.subscriber;
        trace!(
            subscriber_id = %registration.id,
            subscriber_name = %subscriber.name(),
            event_type = %event.event_type(),
            "Notifying subscriber"
        );

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| subscriber.on_event(event)));
        delivery.invoked = delivery.invoked.saturating_add(1);

        match outcome {
            Ok(Ok(())) => {},
            Ok(Err(error)) => {
                delivery.faults = delivery.faults.saturating_add(1);
                warn!(
                    subscriber_id = %registration.id,
                    subscriber_name = %subscriber.name(),
                    event_type = %event.event_type(),
                    seq = event.seq(),
                    %error,
                    "Subscriber failed"
                );
            },
            Err(payload) => {
                delivery.faults = delivery.faults.saturating_add(1);
                warn!(
                    subscriber_id = %registration.id,
                    subscriber_name = %subscriber.name(),
                    event_type = %event.event_type(),
                    seq = event.seq(),
                    panic = %panic_message(payload.as_ref()),
                    "Subscriber panicked"
                );
            },
        }
    }

    delivery
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "<non-string panic payload>"
    }
}
