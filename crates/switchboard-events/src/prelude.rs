//! Prelude module - commonly used types for convenient import.
//!
//! Use `use switchboard_events::prelude::*;` to import all essential types.
//!
//! # Example
//!
//! ```rust
//! use switchboard_events::prelude::*;
//!
//! let bus = EventBus::new();
//! let _guard = bus
//!     .subscribe(KnownTopic::UiNavigate, |event| {
//!         let _ = event.payload();
//!     })
//!     .unwrap()
//!     .into_guard();
//!
//! bus.emit(KnownTopic::UiNavigate, None, Some("sidebar")).unwrap();
//! ```

// Event bus
pub use crate::{DEFAULT_CHANNEL_CAPACITY, DEFAULT_HISTORY_CAPACITY, EventBus, EventBusConfig};

// Events
pub use crate::{EmitRequest, Event, EventReceiver};

// Subscriber system
pub use crate::{EventSubscriber, FnSubscriber, SubscriberId, Subscription, SubscriptionGuard};

// Topics
pub use crate::{KnownTopic, TypedEvent};

// Errors
pub use crate::{EventBusError, EventBusResult, SubscriberError, SubscriberResult};
