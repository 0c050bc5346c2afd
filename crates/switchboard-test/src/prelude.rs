//! Common re-exports for tests.
//!
//! ```rust
//! use switchboard_test::prelude::*;
//! ```

pub use crate::fixtures::{
    small_bus, task_created_payload, test_bus, typed_task_created,
};
pub use crate::harness::{init_test_logging, wait_until};
pub use crate::mocks::{FailingSubscriber, PanickingSubscriber, RecordingSubscriber};
