//! Event bus with synchronous subscribers and a bounded history.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, trace};

use crate::error::{
    EventBusError, EventBusResult, SubscriberError, SubscriberResult, validate_event_type,
};
use crate::event::{EmitRequest, Event};
use crate::receiver::EventReceiver;
use crate::subscriber::{
    EventSubscriber, FnSubscriber, SubscriberId, SubscriberRegistry, deliver,
};
use crate::subscription::Subscription;
use crate::topics::TypedEvent;

/// Default number of events retained in history.
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// Default capacity of the broadcast channel backing async receivers.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Sizing for an [`EventBus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventBusConfig {
    /// Number of most recent events kept in history (clamped to at least 1).
    pub history_capacity: usize,
    /// Broadcast buffer for async receivers (clamped to at least 1).
    pub channel_capacity: usize,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

#[cfg(feature = "config")]
impl From<&switchboard_config::EventsSection> for EventBusConfig {
    fn from(section: &switchboard_config::EventsSection) -> Self {
        Self {
            history_capacity: section.history_capacity,
            channel_capacity: section.channel_capacity,
        }
    }
}

/// Mutable state. Registry and history change together, so one lock guards
/// both.
#[derive(Default)]
struct BusState {
    registry: SubscriberRegistry,
    history: VecDeque<Arc<Event>>,
    next_seq: u64,
    last_timestamp: Option<DateTime<Utc>>,
}

impl BusState {
    fn next_event(
        &mut self,
        event_type: String,
        payload: Option<Value>,
        source: Option<String>,
    ) -> Event {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);

        // Wall clock may step backwards; emission order wins.
        let now = Utc::now();
        let timestamp = match self.last_timestamp {
            Some(previous) if now < previous => previous,
            _ => now,
        };
        self.last_timestamp = Some(timestamp);

        Event::new(seq, event_type, payload, source, timestamp)
    }

    fn record(&mut self, event: Arc<Event>, capacity: usize) {
        self.history.push_back(event);
        while self.history.len() > capacity {
            self.history.pop_front();
        }
    }
}

pub(crate) struct Shared {
    state: Mutex<BusState>,
    sender: broadcast::Sender<Arc<Event>>,
    history_capacity: usize,
    channel_capacity: usize,
    faults: AtomicU64,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, BusState> {
        // No invariant spans a subscriber call, so a poisoned lock is safe to reuse.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn unregister(&self, id: SubscriberId) -> bool {
        let removed = self.lock().registry.remove(id);
        // Dropped here, outside the lock: a subscriber's Drop may emit.
        match removed {
            Some(registration) => {
                debug!(
                    subscriber_id = %id,
                    subscriber_name = %registration.subscriber.name(),
                    "Subscriber unregistered"
                );
                true
            },
            None => false,
        }
    }

    pub(crate) fn is_registered(&self, id: SubscriberId) -> bool {
        self.lock().registry.contains(id)
    }
}

/// In-process publish/subscribe bus with a bounded event history.
///
/// The bus is a cheap, cloneable handle; clones share the same registry and
/// history. Create one at the composition root and pass it to the
/// components that need it.
///
/// - `emit` delivers synchronously: every subscriber registered for the
///   event type at the moment of emission runs before `emit` returns.
/// - A subscriber that returns an error or panics is logged and skipped;
///   the rest still receive the event.
/// - The most recent `history_capacity` events are retained, oldest first.
///
/// The internal lock is never held while a subscriber runs, so subscribers
/// may subscribe, unsubscribe, emit, or clear from inside a callback.
///
/// **WARNING:** storing a clone of the bus inside one of its own subscribers
/// creates an `Arc` cycle that keeps the bus alive until that subscriber is
/// unregistered.
///
/// ```rust
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use switchboard_events::EventBus;
///
/// let bus = EventBus::new();
/// let badge = Arc::new(AtomicUsize::new(0));
///
/// let counter = Arc::clone(&badge);
/// let subscription = bus
///     .subscribe("task:created", move |_event| {
///         counter.fetch_add(1, Ordering::SeqCst);
///     })
///     .unwrap();
///
/// bus.emit("task:created", Some(serde_json::json!({ "id": 1 })), Some("task-panel"))
///     .unwrap();
/// assert_eq!(badge.load(Ordering::SeqCst), 1);
///
/// subscription.unsubscribe();
/// bus.emit("task:created", None, None).unwrap();
/// assert_eq!(badge.load(Ordering::SeqCst), 1);
/// assert_eq!(bus.history().len(), 2);
/// ```
#[derive(Clone)]
pub struct EventBus {
    shared: Arc<Shared>,
}

impl EventBus {
    /// Create a bus with default sizing.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(EventBusConfig::default())
    }

    /// Create a bus retaining `history_capacity` events.
    #[must_use]
    pub fn with_history_capacity(history_capacity: usize) -> Self {
        Self::with_config(EventBusConfig {
            history_capacity,
            ..EventBusConfig::default()
        })
    }

    /// Create a bus with explicit sizing.
    #[must_use]
    pub fn with_config(config: EventBusConfig) -> Self {
        let history_capacity = config.history_capacity.max(1);
        let channel_capacity = config.channel_capacity.max(1);
        let (sender, _) = broadcast::channel(channel_capacity);

        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(BusState {
                    history: VecDeque::with_capacity(history_capacity),
                    ..BusState::default()
                }),
                sender,
                history_capacity,
                channel_capacity,
                faults: AtomicU64::new(0),
            }),
        }
    }

    // ---------------------------------------------------------------------
    // Subscriptions
    // ---------------------------------------------------------------------

    /// Register a callback for `event_type`.
    ///
    /// The callback sees only events emitted after this call; history is
    /// not replayed. Registering the same logic twice yields two independent
    /// registrations, each delivered to and each with its own handle.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::EmptyEventType`] for an empty event type.
    pub fn subscribe<F>(
        &self,
        event_type: impl Into<String>,
        callback: F,
    ) -> EventBusResult<Subscription>
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        let subscriber = FnSubscriber::new("closure", move |event: &Event| {
            callback(event);
            Ok(())
        });
        self.register(event_type, Arc::new(subscriber))
    }

    /// Register a callback that may report failure.
    ///
    /// Errors are logged by the bus; the callback stays registered.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::EmptyEventType`] for an empty event type.
    pub fn subscribe_fallible<F>(
        &self,
        event_type: impl Into<String>,
        callback: F,
    ) -> EventBusResult<Subscription>
    where
        F: Fn(&Event) -> SubscriberResult + Send + Sync + 'static,
    {
        self.register(event_type, Arc::new(FnSubscriber::new("closure", callback)))
    }

    /// Register a callback receiving the decoded payload of a [`TypedEvent`].
    ///
    /// Events without a payload, or whose payload does not decode as `T`,
    /// are reported as subscriber faults.
    ///
    /// # Errors
    ///
    /// Never fails for well-formed `T::EVENT_TYPE`; returns
    /// [`EventBusError::EmptyEventType`] if it is empty.
    pub fn subscribe_typed<T, F>(&self, callback: F) -> EventBusResult<Subscription>
    where
        T: TypedEvent,
        F: Fn(&T, &Event) + Send + Sync + 'static,
    {
        let subscriber = FnSubscriber::new(T::EVENT_TYPE, move |event: &Event| {
            let payload = event.payload().ok_or_else(|| SubscriberError::MissingPayload {
                event_type: event.event_type().to_owned(),
            })?;
            let typed = T::deserialize(payload)?;
            callback(&typed, event);
            Ok(())
        });
        self.register(T::EVENT_TYPE, Arc::new(subscriber))
    }

    /// Register a subscriber object for `event_type`.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::EmptyEventType`] for an empty event type.
    pub fn register(
        &self,
        event_type: impl Into<String>,
        subscriber: Arc<dyn EventSubscriber>,
    ) -> EventBusResult<Subscription> {
        let event_type = event_type.into();
        validate_event_type(&event_type)?;

        let name = subscriber.name().to_owned();
        let id = self
            .shared
            .lock()
            .registry
            .insert(event_type.clone(), subscriber);

        debug!(
            subscriber_id = %id,
            subscriber_name = %name,
            event_type = %event_type,
            "Subscriber registered"
        );

        Ok(Subscription::new(id, event_type, Arc::downgrade(&self.shared)))
    }

    /// Remove a registration by id. Returns `true` if it was present.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        self.shared.unregister(id)
    }

    // ---------------------------------------------------------------------
    // Emission
    // ---------------------------------------------------------------------

    /// Emit an event and deliver it to the current subscribers of its type.
    ///
    /// Returns the number of subscribers invoked, including ones that
    /// failed.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::EmptyEventType`] for an empty event type;
    /// nothing is recorded in that case.
    pub fn emit(
        &self,
        event_type: impl Into<String>,
        payload: Option<Value>,
        source: Option<&str>,
    ) -> EventBusResult<usize> {
        self.emit_event(EmitRequest {
            event_type: event_type.into(),
            payload,
            source: source.map(str::to_owned),
        })
    }

    /// Emit from a prepared [`EmitRequest`].
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::EmptyEventType`] for an empty event type.
    pub fn emit_event(&self, request: EmitRequest) -> EventBusResult<usize> {
        let EmitRequest {
            event_type,
            payload,
            source,
        } = request;
        validate_event_type(&event_type)?;

        let (event, targets) = {
            let mut state = self.shared.lock();
            let event = Arc::new(state.next_event(event_type, payload, source));
            state.record(Arc::clone(&event), self.shared.history_capacity);
            // Sent under the lock so receivers observe history order.
            let receivers = self.shared.sender.send(Arc::clone(&event)).unwrap_or(0);
            trace!(
                event_type = %event.event_type(),
                seq = event.seq(),
                receivers,
                "Event recorded"
            );
            let targets = state.registry.snapshot(event.event_type());
            (event, targets)
        };

        let delivery = deliver(&event, &targets);
        if delivery.faults > 0 {
            let faults = u64::try_from(delivery.faults).unwrap_or(u64::MAX);
            self.shared.faults.fetch_add(faults, Ordering::Relaxed);
        }

        debug!(
            event_type = %event.event_type(),
            seq = event.seq(),
            delivered = delivery.invoked,
            faults = delivery.faults,
            "Event emitted"
        );

        Ok(delivery.invoked)
    }

    /// Encode and emit a [`TypedEvent`].
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::Serialization`] if the payload cannot be
    /// encoded as JSON.
    pub fn emit_typed<T: TypedEvent>(
        &self,
        payload: &T,
        source: Option<&str>,
    ) -> EventBusResult<usize> {
        let value =
            serde_json::to_value(payload).map_err(|source| EventBusError::Serialization {
                event_type: T::EVENT_TYPE,
                source,
            })?;
        self.emit(T::EVENT_TYPE, Some(value), source)
    }

    // ---------------------------------------------------------------------
    // History
    // ---------------------------------------------------------------------

    /// Snapshot of the retained history, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<Arc<Event>> {
        self.shared.lock().history.iter().cloned().collect()
    }

    /// Retained events of one type, oldest first.
    ///
    /// Filtering happens over the already-bounded history, so a burst of
    /// other event types can evict older entries of `event_type` before
    /// they are queried.
    #[must_use]
    pub fn history_of(&self, event_type: &str) -> Vec<Arc<Event>> {
        self.shared
            .lock()
            .history
            .iter()
            .filter(|event| event.is(event_type))
            .cloned()
            .collect()
    }

    /// Number of events currently retained.
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.shared.lock().history.len()
    }

    /// Maximum number of retained events.
    #[must_use]
    pub fn history_capacity(&self) -> usize {
        self.shared.history_capacity
    }

    // ---------------------------------------------------------------------
    // Reset & introspection
    // ---------------------------------------------------------------------

    /// Remove every subscription and empty the history.
    ///
    /// Outstanding [`Subscription`] handles become no-ops. Sequence numbers
    /// keep counting from where they were.
    pub fn clear(&self) {
        let (registrations, history) = {
            let mut state = self.shared.lock();
            (state.registry.drain(), std::mem::take(&mut state.history))
        };
        debug!(
            subscribers = registrations.len(),
            events = history.len(),
            "Event bus cleared"
        );
    }

    /// Subscribe an async receiver to every emitted event.
    #[must_use]
    pub fn receiver(&self) -> EventReceiver {
        EventReceiver::new(self.shared.sender.subscribe(), None)
    }

    /// Subscribe an async receiver to events matching `pattern`.
    ///
    /// The pattern is an exact event type or a prefix ending in `*`
    /// (e.g. `task:*`).
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::EmptyEventType`] for an empty pattern.
    pub fn receiver_for(&self, pattern: impl Into<String>) -> EventBusResult<EventReceiver> {
        let pattern = pattern.into();
        validate_event_type(&pattern)?;
        Ok(EventReceiver::new(
            self.shared.sender.subscribe(),
            Some(pattern),
        ))
    }

    /// Number of synchronous registrations across all event types.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.shared.lock().registry.len()
    }

    /// Number of synchronous registrations for one event type.
    #[must_use]
    pub fn subscriber_count_for(&self, event_type: &str) -> usize {
        self.shared.lock().registry.len_for(event_type)
    }

    /// Number of live async receivers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.shared.sender.receiver_count()
    }

    /// Broadcast buffer size for async receivers.
    #[must_use]
    pub fn channel_capacity(&self) -> usize {
        self.shared.channel_capacity
    }

    /// Total subscriber errors and panics caught since creation.
    #[must_use]
    pub fn fault_count(&self) -> u64 {
        self.shared.faults.load(Ordering::Relaxed)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.lock();
        f.debug_struct("EventBus")
            .field("subscriber_count", &state.registry.len())
            .field("history_len", &state.history.len())
            .field("history_capacity", &self.shared.history_capacity)
            .field("receiver_count", &self.shared.sender.receiver_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    fn counter() -> (Arc<AtomicUsize>, impl Fn(&Event) + Send + Sync + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let handle = Arc::clone(&count);
        (count, move |_: &Event| {
            handle.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_event_bus_creation() {
        let bus = EventBus::new();
        assert_eq!(bus.history_capacity(), DEFAULT_HISTORY_CAPACITY);
        assert_eq!(bus.channel_capacity(), DEFAULT_CHANNEL_CAPACITY);
        assert_eq!(bus.subscriber_count(), 0);
        assert_eq!(bus.history_len(), 0);
    }

    #[test]
    fn test_capacity_clamped() {
        let bus = EventBus::with_config(EventBusConfig {
            history_capacity: 0,
            channel_capacity: 0,
        });
        assert_eq!(bus.history_capacity(), 1);
        assert_eq!(bus.channel_capacity(), 1);
    }

    #[test]
    fn test_subscribe_and_emit() {
        let bus = EventBus::new();
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);

        let _sub = bus
            .subscribe("task:created", move |event| {
                sink.lock().unwrap().push(event.clone());
            })
            .unwrap();

        let delivered = bus
            .emit("task:created", Some(json!({ "id": 1 })), Some("task-panel"))
            .unwrap();
        assert_eq!(delivered, 1);

        let received = received.lock().unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].event_type(), "task:created");
        assert_eq!(received[0].payload(), Some(&json!({ "id": 1 })));
        assert_eq!(received[0].source(), Some("task-panel"));
    }

    #[test]
    fn test_emit_without_subscribers_records_history() {
        let bus = EventBus::new();
        assert_eq!(bus.emit("x", None, None).unwrap(), 0);
        assert_eq!(bus.history_len(), 1);
    }

    #[test]
    fn test_other_types_not_delivered() {
        let bus = EventBus::new();
        let (count, callback) = counter();
        let _sub = bus.subscribe("task:created", callback).unwrap();

        bus.emit("task:updated", None, None).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_empty_event_type_rejected_without_side_effects() {
        let bus = EventBus::new();
        let (_, callback) = counter();

        assert!(matches!(
            bus.subscribe("", callback),
            Err(EventBusError::EmptyEventType)
        ));
        assert!(matches!(
            bus.emit("  ", None, None),
            Err(EventBusError::EmptyEventType)
        ));
        assert!(bus.receiver_for("").is_err());
        assert_eq!(bus.subscriber_count(), 0);
        assert_eq!(bus.history_len(), 0);
    }

    #[test]
    fn test_history_evicts_oldest() {
        let bus = EventBus::with_history_capacity(3);
        for i in 0..5 {
            bus.emit("x", Some(json!(i)), None).unwrap();
        }

        let payloads: Vec<_> = bus
            .history()
            .iter()
            .map(|e| e.payload().cloned().unwrap())
            .collect();
        assert_eq!(payloads, vec![json!(2), json!(3), json!(4)]);
    }

    #[test]
    fn test_sequence_and_timestamps_monotonic() {
        let bus = EventBus::new();
        for _ in 0..20 {
            bus.emit("x", None, None).unwrap();
        }
        let history = bus.history();
        for pair in history.windows(2) {
            assert!(pair[0].seq() < pair[1].seq());
            assert!(pair[0].timestamp() <= pair[1].timestamp());
        }
    }

    #[test]
    fn test_timestamp_clamped_when_clock_steps_back() {
        let mut state = BusState {
            last_timestamp: Utc::now().checked_add_signed(chrono::Duration::hours(1)),
            ..BusState::default()
        };
        let previous = state.last_timestamp.unwrap();
        let event = state.next_event("x".to_owned(), None, None);
        assert_eq!(event.timestamp(), previous);
    }

    #[test]
    fn test_history_is_a_copy() {
        let bus = EventBus::new();
        bus.emit("x", None, None).unwrap();

        let mut snapshot = bus.history();
        snapshot.clear();
        assert_eq!(bus.history_len(), 1);
    }

    #[test]
    fn test_history_of_filters_bounded_history() {
        let bus = EventBus::with_history_capacity(4);
        bus.emit("rare", Some(json!(1)), None).unwrap();
        bus.emit("noise", None, None).unwrap();
        bus.emit("rare", Some(json!(2)), None).unwrap();
        assert_eq!(bus.history_of("rare").len(), 2);

        for _ in 0..3 {
            bus.emit("noise", None, None).unwrap();
        }
        // Only the second "rare" survives the burst.
        let rare = bus.history_of("rare");
        assert_eq!(rare.len(), 1);
        assert_eq!(rare[0].payload(), Some(&json!(2)));
    }

    #[test]
    fn test_unsubscribe_by_id() {
        let bus = EventBus::new();
        let (count, callback) = counter();
        let sub = bus.subscribe("x", callback).unwrap();

        assert!(bus.unsubscribe(sub.id()));
        assert!(!bus.unsubscribe(sub.id()));
        bus.emit("x", None, None).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unsubscribe_foreign_id_rejected() {
        let first = EventBus::new();
        let second = EventBus::new();
        let foreign = first.subscribe("x", |_| {}).unwrap();
        let (count, callback) = counter();
        let _own = second.subscribe("y", callback).unwrap();

        assert!(!second.unsubscribe(foreign.id()));
        assert_eq!(second.subscriber_count(), 1);
        assert_eq!(second.emit("y", None, None).unwrap(), 1);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(foreign.is_active());
    }

    #[cfg(feature = "config")]
    #[test]
    fn test_config_from_events_section() {
        let section = switchboard_config::EventsSection {
            history_capacity: 25,
            channel_capacity: 64,
        };
        let config = EventBusConfig::from(&section);
        assert_eq!(config.history_capacity, 25);
        assert_eq!(config.channel_capacity, 64);

        let bus = EventBus::with_config(config);
        assert_eq!(bus.history_capacity(), 25);
        assert_eq!(bus.channel_capacity(), 64);
    }

    #[test]
    fn test_clear_resets_subscribers_and_history() {
        let bus = EventBus::new();
        let (count, callback) = counter();
        let sub = bus.subscribe("x", callback).unwrap();
        bus.emit("x", None, None).unwrap();
        let seq_before = bus.history()[0].seq();

        bus.clear();
        assert_eq!(bus.subscriber_count(), 0);
        assert_eq!(bus.history_len(), 0);
        assert!(!sub.unsubscribe());

        assert_eq!(bus.emit("x", None, None).unwrap(), 0);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        let history = bus.history();
        assert_eq!(history.len(), 1);
        assert!(history[0].seq() > seq_before);
    }

    #[test]
    fn test_failing_subscriber_counted() {
        let bus = EventBus::new();
        let _sub = bus
            .subscribe_fallible("x", |_| Err(SubscriberError::failed("nope")))
            .unwrap();

        assert_eq!(bus.emit("x", None, None).unwrap(), 1);
        assert_eq!(bus.emit("x", None, None).unwrap(), 1);
        assert_eq!(bus.fault_count(), 2);
        assert_eq!(bus.subscriber_count_for("x"), 1);
    }

    #[test]
    fn test_cloned_bus_shares_state() {
        let bus = EventBus::new();
        let cloned = bus.clone();
        let (count, callback) = counter();

        let _sub = cloned.subscribe("x", callback).unwrap();
        bus.emit("x", None, None).unwrap();

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(cloned.history_len(), 1);
    }

    #[test]
    fn test_reentrant_unsubscribe_from_callback() {
        let bus = EventBus::new();
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let (count, _) = counter();

        let inner_slot = Arc::clone(&slot);
        let inner_count = Arc::clone(&count);
        let sub = bus
            .subscribe("x", move |_| {
                inner_count.fetch_add(1, Ordering::SeqCst);
                if let Some(sub) = inner_slot.lock().unwrap().as_ref() {
                    // Must not deadlock against emit.
                    sub.unsubscribe();
                }
            })
            .unwrap();
        *slot.lock().unwrap() = Some(sub);

        bus.emit("x", None, None).unwrap();
        bus.emit("x", None, None).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_reentrant_emit_from_callback() {
        let bus = EventBus::new();
        let handle = bus.clone();
        let (count, callback) = counter();

        let _chain = bus
            .subscribe("task:created", move |event| {
                handle
                    .emit("task:updated", event.payload().cloned(), Some("chain"))
                    .unwrap();
            })
            .unwrap();
        let _sink = bus.subscribe("task:updated", callback).unwrap();

        bus.emit("task:created", Some(json!(1)), None).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);

        let types: Vec<_> = bus
            .history()
            .iter()
            .map(|e| e.event_type().to_owned())
            .collect();
        assert_eq!(types, vec!["task:created", "task:updated"]);
        bus.clear();
    }

    #[test]
    fn test_reentrant_clear_from_callback() {
        let bus = EventBus::new();
        let handle = bus.clone();
        let (count, callback) = counter();

        bus.subscribe("x", move |_| handle.clear()).unwrap();
        bus.subscribe("x", callback).unwrap();

        // The second subscriber was in the snapshot, so it still sees this one.
        assert_eq!(bus.emit("x", None, None).unwrap(), 2);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(bus.subscriber_count(), 0);
        assert_eq!(bus.history_len(), 0);

        assert_eq!(bus.emit("x", None, None).unwrap(), 0);
        assert_eq!(bus.history_len(), 1);
    }

    #[test]
    fn test_subscribe_during_emission_not_delivered_same_event() {
        let bus = EventBus::new();
        let handle = bus.clone();
        let (count, _) = counter();
        let late_subs = Arc::new(Mutex::new(Vec::new()));

        let inner_count = Arc::clone(&count);
        let inner_subs = Arc::clone(&late_subs);
        let _sub = bus
            .subscribe("x", move |_| {
                let c = Arc::clone(&inner_count);
                let sub = handle
                    .subscribe("x", move |_| {
                        c.fetch_add(1, Ordering::SeqCst);
                    })
                    .unwrap();
                inner_subs.lock().unwrap().push(sub);
            })
            .unwrap();

        bus.emit("x", None, None).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 0);

        bus.emit("x", None, None).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
        bus.clear();
    }

    #[test]
    fn test_unsubscribe_mid_emission_still_delivers_snapshot() {
        let bus = EventBus::new();
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));

        // Registered first, so it runs before the victim within one emission.
        let killer_slot = Arc::clone(&slot);
        let _killer = bus
            .subscribe("x", move |_| {
                if let Some(victim) = killer_slot.lock().unwrap().as_ref() {
                    victim.unsubscribe();
                }
            })
            .unwrap();

        let (count, callback) = counter();
        *slot.lock().unwrap() = Some(bus.subscribe("x", callback).unwrap());

        assert_eq!(bus.emit("x", None, None).unwrap(), 2);
        assert_eq!(count.load(Ordering::SeqCst), 1);

        assert_eq!(bus.emit("x", None, None).unwrap(), 1);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_publish_from_subscriber_drop_does_not_deadlock() {
        struct DroppingSubscriber {
            bus: EventBus,
        }

        impl EventSubscriber for DroppingSubscriber {
            fn on_event(&self, _event: &Event) -> SubscriberResult {
                Ok(())
            }
        }

        impl Drop for DroppingSubscriber {
            fn drop(&mut self) {
                // Would deadlock if unregister dropped us while holding the lock.
                let _ = self.bus.emit("dropped", None, None);
            }
        }

        let bus = EventBus::new();
        let sub = bus
            .register("x", Arc::new(DroppingSubscriber { bus: bus.clone() }))
            .unwrap();
        assert!(sub.unsubscribe());
        assert_eq!(bus.history_of("dropped").len(), 1);
    }

    #[test]
    fn test_debug_output() {
        let bus = EventBus::with_history_capacity(5);
        bus.emit("x", None, None).unwrap();
        let debug = format!("{bus:?}");
        assert!(debug.contains("history_len: 1"));
        assert!(debug.contains("history_capacity: 5"));
    }
}
