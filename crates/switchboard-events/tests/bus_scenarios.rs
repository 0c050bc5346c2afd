//! End-to-end behaviour of the event bus as seen by dashboard components.

#![allow(clippy::arithmetic_side_effects)]

use std::sync::Arc;

use serde_json::json;
use switchboard_events::topics::{TASK_CREATED, TaskCreated};
use switchboard_events::{EmitRequest, EventSubscriber};
use switchboard_test::prelude::*;

#[test]
fn subscriber_receives_matching_event() {
    init_test_logging();
    let bus = test_bus();
    let recorder = RecordingSubscriber::new();
    bus.register(TASK_CREATED, Arc::new(recorder.clone())).unwrap();

    let invoked = bus
        .emit(TASK_CREATED, Some(json!({ "id": 1 })), None)
        .unwrap();

    assert_eq!(invoked, 1);
    assert_eq!(recorder.count(), 1);
    let event = recorder.last().unwrap();
    assert_eq!(event.event_type(), TASK_CREATED);
    assert_eq!(event.payload(), Some(&json!({ "id": 1 })));
    assert_eq!(event.source(), None);
}

#[test]
fn every_subscriber_of_a_type_is_invoked_once() {
    let bus = test_bus();
    let a = RecordingSubscriber::named("a");
    let b = RecordingSubscriber::named("b");
    bus.register("x", Arc::new(a.clone())).unwrap();
    bus.register("x", Arc::new(b.clone())).unwrap();

    assert_eq!(bus.emit("x", None, None).unwrap(), 2);
    assert_eq!(a.count(), 1);
    assert_eq!(b.count(), 1);
}

#[test]
fn history_keeps_the_most_recent_hundred() {
    let bus = test_bus();
    for i in 0..105 {
        bus.emit("x", Some(json!({ "n": i })), None).unwrap();
    }

    let history = bus.history();
    assert_eq!(history.len(), 100);
    assert_eq!(history[0].payload(), Some(&json!({ "n": 5 })));
    assert_eq!(history[99].payload(), Some(&json!({ "n": 104 })));
    assert!(history.windows(2).all(|w| w[0].seq() < w[1].seq()));
}

#[test]
fn unsubscribed_callback_is_not_called() {
    let bus = test_bus();
    let recorder = RecordingSubscriber::new();
    let sub = bus.register("x", Arc::new(recorder.clone())).unwrap();

    assert!(sub.unsubscribe());
    assert_eq!(bus.emit("x", None, None).unwrap(), 0);
    assert_eq!(recorder.count(), 0);
    assert!(!sub.unsubscribe());
}

#[test]
fn failing_subscriber_does_not_block_others() {
    init_test_logging();
    let bus = test_bus();
    let failing = FailingSubscriber::new();
    let panicking = PanickingSubscriber::new();
    let recorder = RecordingSubscriber::new();
    bus.register("x", Arc::new(failing.clone())).unwrap();
    bus.register("x", Arc::new(panicking.clone())).unwrap();
    bus.register("x", Arc::new(recorder.clone())).unwrap();

    assert_eq!(bus.emit("x", None, None).unwrap(), 3);
    assert_eq!(recorder.count(), 1);
    assert_eq!(bus.fault_count(), 2);

    // Faulting subscribers stay registered and keep being invoked.
    bus.emit("x", None, None).unwrap();
    assert_eq!(failing.calls(), 2);
    assert_eq!(panicking.calls(), 2);
    assert_eq!(recorder.count(), 2);
    assert_eq!(bus.fault_count(), 4);
}

#[test]
fn subscribers_only_see_their_type_with_full_event_data() {
    let bus = test_bus();
    let tasks = RecordingSubscriber::new();
    let nav = RecordingSubscriber::new();
    bus.register(TASK_CREATED, Arc::new(tasks.clone())).unwrap();
    bus.register("ui:navigate", Arc::new(nav.clone())).unwrap();

    bus.emit_event(
        EmitRequest::new(TASK_CREATED)
            .with_payload(task_created_payload("t-1"))
            .with_source("task-panel"),
    )
    .unwrap();
    bus.emit("ui:navigate", Some(json!({ "path": "/agents" })), Some("sidebar"))
        .unwrap();
    bus.emit("agent:updated", None, None).unwrap();

    assert_eq!(tasks.event_types(), vec![TASK_CREATED]);
    assert_eq!(nav.event_types(), vec!["ui:navigate"]);

    let task = tasks.last().unwrap();
    assert_eq!(task.source(), Some("task-panel"));
    assert_eq!(
        task.payload_as::<TaskCreated>().unwrap(),
        Some(typed_task_created("t-1"))
    );
    assert!(task.timestamp() <= nav.last().unwrap().timestamp());
}

#[test]
fn history_of_is_the_matching_subsequence() {
    let bus = small_bus(5);
    for (i, ty) in ["a", "b", "a", "c", "a", "b", "a"].iter().enumerate() {
        bus.emit(*ty, Some(json!(i)), None).unwrap();
    }

    let all = bus.history();
    let only_a = bus.history_of("a");
    let expected: Vec<_> = all.iter().filter(|e| e.is("a")).cloned().collect();
    assert_eq!(only_a, expected);
    // The first "a" was evicted before filtering.
    assert_eq!(only_a.len(), 3);
    assert_eq!(only_a[0].payload(), Some(&json!(2)));
    assert!(bus.history_of("missing").is_empty());
}

#[test]
fn clear_resets_subscribers_and_history() {
    let bus = test_bus();
    let recorder = RecordingSubscriber::new();
    let sub = bus.register("x", Arc::new(recorder.clone())).unwrap();
    bus.emit("x", None, None).unwrap();

    bus.clear();
    assert!(bus.history().is_empty());
    assert_eq!(bus.subscriber_count(), 0);
    assert!(!sub.is_active());

    assert_eq!(bus.emit("x", None, None).unwrap(), 0);
    assert_eq!(recorder.count(), 1);
    assert_eq!(bus.history_len(), 1);
}

#[test]
fn duplicate_registration_delivers_twice() {
    let bus = test_bus();
    let recorder = RecordingSubscriber::new();
    let shared: Arc<dyn EventSubscriber> = Arc::new(recorder.clone());
    let first = bus.register("x", Arc::clone(&shared)).unwrap();
    let second = bus.register("x", shared).unwrap();
    assert_ne!(first.id(), second.id());

    assert_eq!(bus.emit("x", None, None).unwrap(), 2);
    assert_eq!(recorder.count(), 2);

    first.unsubscribe();
    bus.emit("x", None, None).unwrap();
    assert_eq!(recorder.count(), 3);
}

#[test]
fn empty_event_type_is_rejected_without_side_effects() {
    let bus = test_bus();
    let recorder = RecordingSubscriber::new();

    assert!(bus.register("  ", Arc::new(recorder.clone())).is_err());
    assert!(bus.emit("", None, None).is_err());
    assert_eq!(bus.subscriber_count(), 0);
    assert_eq!(bus.history_len(), 0);
}

#[test]
fn buses_are_isolated() {
    let first = test_bus();
    let second = test_bus();
    let recorder = RecordingSubscriber::new();
    first.register("x", Arc::new(recorder.clone())).unwrap();

    second.emit("x", None, None).unwrap();
    assert_eq!(recorder.count(), 0);
    assert_eq!(first.history_len(), 0);
    assert_eq!(second.history_len(), 1);
}

#[test]
fn clones_share_state_across_threads() {
    let bus = test_bus();
    let recorder = RecordingSubscriber::new();
    bus.register("x", Arc::new(recorder.clone())).unwrap();

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let bus = bus.clone();
            std::thread::spawn(move || {
                for i in 0..25 {
                    bus.emit("x", Some(json!({ "t": t, "i": i })), None)
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(recorder.count(), 100);
    assert_eq!(bus.history_len(), 100);
    let history = bus.history();
    assert!(history.windows(2).all(|w| w[0].seq() < w[1].seq()));
    assert!(
        history
            .windows(2)
            .all(|w| w[0].timestamp() <= w[1].timestamp())
    );
}

#[test]
fn unsubscribe_with_another_bus_id_is_a_no_op() {
    let first = test_bus();
    let second = test_bus();
    let foreign = first.subscribe("x", |_| {}).unwrap();
    let recorder = RecordingSubscriber::new();
    second.register("y", Arc::new(recorder.clone())).unwrap();

    assert!(!second.unsubscribe(foreign.id()));
    assert_eq!(second.emit("y", None, None).unwrap(), 1);
    assert_eq!(recorder.count(), 1);
    assert_eq!(first.subscriber_count(), 1);
}
