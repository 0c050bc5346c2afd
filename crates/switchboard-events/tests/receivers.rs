//! Async receivers alongside synchronous subscribers.

use std::sync::Arc;
use std::time::Duration;

use switchboard_events::topics::{TASK_CREATED, TaskCreated};
use switchboard_test::prelude::*;

#[tokio::test]
async fn receiver_sees_events_in_history_order() {
    let bus = test_bus();
    let mut receiver = bus.receiver();
    let recorder = RecordingSubscriber::new();
    bus.register(TASK_CREATED, Arc::new(recorder.clone())).unwrap();

    bus.emit_typed(&typed_task_created("t-1"), Some("task-panel"))
        .unwrap();
    bus.emit("ui:navigate", None, None).unwrap();

    let history = bus.history();
    for expected in &history {
        let got = receiver.recv().await.unwrap();
        assert_eq!(got.id(), expected.id());
    }
    assert_eq!(recorder.count(), 1);
}

#[tokio::test]
async fn receiver_on_another_task() {
    let bus = test_bus();
    let mut receiver = bus.receiver_for("task:*").unwrap();

    let consumer = tokio::spawn(async move {
        let event = receiver.recv().await.unwrap();
        event.payload_as::<TaskCreated>().unwrap().unwrap()
    });

    bus.emit("agent:updated", None, None).unwrap();
    bus.emit_typed(&typed_task_created("t-7"), None).unwrap();

    let task = tokio::time::timeout(Duration::from_secs(5), consumer)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(task.task_id, "t-7");
}

#[tokio::test]
async fn clear_does_not_close_receivers() {
    let bus = test_bus();
    let mut receiver = bus.receiver();

    bus.clear();
    bus.emit("x", None, None).unwrap();
    assert_eq!(receiver.recv().await.unwrap().event_type(), "x");
}

#[test]
fn wait_until_observes_cross_thread_delivery() {
    let bus = test_bus();
    let recorder = RecordingSubscriber::new();
    bus.register("x", Arc::new(recorder.clone())).unwrap();

    let emitter = bus.clone();
    let handle = std::thread::spawn(move || emitter.emit("x", None, None).unwrap());

    assert!(wait_until(Duration::from_secs(5), || recorder.count() == 1));
    assert_eq!(handle.join().unwrap(), 1);
}
