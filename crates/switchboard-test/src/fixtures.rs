//! Test fixtures for buses and payloads.

use serde_json::{Value, json};
use switchboard_events::EventBus;
use switchboard_events::topics::TaskCreated;

/// A fresh, isolated bus with default sizing.
#[must_use]
pub fn test_bus() -> EventBus {
    EventBus::new()
}

/// A bus that retains only `capacity` events, for eviction tests.
#[must_use]
pub fn small_bus(capacity: usize) -> EventBus {
    EventBus::with_history_capacity(capacity)
}

/// A `task:created` payload as a JSON value.
#[must_use]
pub fn task_created_payload(task_id: &str) -> Value {
    json!({
        "task_id": task_id,
        "title": format!("Task {task_id}"),
    })
}

/// A typed `task:created` payload matching [`task_created_payload`].
#[must_use]
pub fn typed_task_created(task_id: &str) -> TaskCreated {
    TaskCreated {
        task_id: task_id.to_owned(),
        title: format!("Task {task_id}"),
        project_id: None,
        assignee: None,
    }
}
