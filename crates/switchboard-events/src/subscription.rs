//! Handles returned by `subscribe`.

use std::sync::Weak;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::bus::Shared;
use crate::subscriber::SubscriberId;

/// Revocation handle for one registration.
///
/// The handle does not keep the bus alive, and dropping it does **not**
/// unsubscribe: a registration lives until [`Subscription::unsubscribe`] is
/// called or the bus is cleared. Use [`Subscription::into_guard`] for
/// scope-bound registrations.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriberId,
    event_type: String,
    bus: Weak<Shared>,
    active: AtomicBool,
}

impl Subscription {
    pub(crate) fn new(id: SubscriberId, event_type: String, bus: Weak<Shared>) -> Self {
        Self {
            id,
            event_type,
            bus,
            active: AtomicBool::new(true),
        }
    }

    /// Registration identifier.
    #[must_use]
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Event type this registration listens to.
    #[must_use]
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// Remove exactly this registration.
    ///
    /// Takes effect for future emissions; an emission already delivering
    /// still reaches this subscriber. Returns `true` only on the call that
    /// actually removed it; later calls (or calls after the bus was cleared
    /// or dropped) are no-ops returning `false`.
    pub fn unsubscribe(&self) -> bool {
        if !self.active.swap(false, Ordering::AcqRel) {
            return false;
        }
        self.bus
            .upgrade()
            .is_some_and(|shared| shared.unregister(self.id))
    }

    /// Whether the registration is still present on the bus.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
            && self
                .bus
                .upgrade()
                .is_some_and(|shared| shared.is_registered(self.id))
    }

    /// Convert into a guard that unsubscribes when dropped.
    #[must_use]
    pub fn into_guard(self) -> SubscriptionGuard {
        SubscriptionGuard(self)
    }
}

/// Unsubscribes its registration on drop.
#[derive(Debug)]
pub struct SubscriptionGuard(Subscription);

impl SubscriptionGuard {
    /// The wrapped handle.
    #[must_use]
    pub fn subscription(&self) -> &Subscription {
        &self.0
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.0.unsubscribe();
    }
}
