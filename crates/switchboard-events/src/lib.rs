//! Switchboard Events - In-process event bus for the Switchboard dashboard.
//!
//! This crate provides:
//! - An [`EventBus`] with synchronous, per-type subscribers
//! - A bounded history of recently emitted events
//! - Async [`EventReceiver`]s for consumers running on a tokio runtime
//! - Conventional event types and typed payloads ([`topics`])
//!
//! # Architecture
//!
//! Producers call `emit`; the bus records the event in its history, fans it
//! out to async receivers, and then invokes every synchronous subscriber
//! registered for that event type on the calling thread. A subscriber that
//! fails or panics is logged and skipped; the producer never sees it.
//!
//! The bus is an explicit service object. Build one at startup and hand
//! clones to the components that need it; tests build their own.
//!
//! # Example
//!
//! ```rust
//! use switchboard_events::{EventBus, topics};
//!
//! let bus = EventBus::new();
//!
//! let subscription = bus
//!     .subscribe(topics::TASK_CREATED, |event| {
//!         println!("new task from {:?}", event.source());
//!     })
//!     .unwrap();
//!
//! bus.emit(topics::TASK_CREATED, Some(serde_json::json!({ "id": 1 })), Some("task-panel"))
//!     .unwrap();
//!
//! assert_eq!(bus.history_of(topics::TASK_CREATED).len(), 1);
//! subscription.unsubscribe();
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;
pub mod topics;

mod bus;
mod error;
mod event;
mod receiver;
mod subscriber;
mod subscription;

pub use bus::{DEFAULT_CHANNEL_CAPACITY, DEFAULT_HISTORY_CAPACITY, EventBus, EventBusConfig};
pub use error::{EventBusError, EventBusResult, SubscriberError, SubscriberResult};
pub use event::{EmitRequest, Event};
pub use receiver::EventReceiver;
pub use subscriber::{EventSubscriber, FnSubscriber, SubscriberId};
pub use subscription::{Subscription, SubscriptionGuard};
pub use topics::{KnownTopic, TypedEvent};
