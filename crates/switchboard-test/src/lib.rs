//! Shared test utilities for Switchboard crates.
//!
//! Add as a dev-dependency:
//!
//! ```toml
//! [dev-dependencies]
//! switchboard-test.workspace = true
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use switchboard_test::{RecordingSubscriber, test_bus};
//!
//! #[test]
//! fn records_deliveries() {
//!     let bus = test_bus();
//!     let recorder = RecordingSubscriber::new();
//!     bus.register("task:created", Arc::new(recorder.clone())).unwrap();
//!
//!     bus.emit("task:created", None, None).unwrap();
//!     assert_eq!(recorder.count(), 1);
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

pub mod fixtures;
pub mod harness;
pub mod mocks;

pub use fixtures::*;
pub use harness::*;
pub use mocks::*;
