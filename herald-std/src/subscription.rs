//! RAII registrations.
//!
//! A [`Subscription`] pairs a registration with its unregistration: the
//! listener stays registered for as long as the guard lives. This is the
//! usual way for a component with an enable/disable lifecycle to join a
//! channel without having to remember the matching `unregister` call.

use crate::hub::{DispatchHub, RegisterOutcome};
use herald_core::{DispatchKey, Listener, Payload, TypedKey, TypedListener};
use std::{
    fmt,
    sync::{Arc, Weak},
};

type Detach = Box<dyn FnOnce(&DispatchHub) + Send + Sync>;

/// Guard that unregisters its listener when dropped.
///
/// The guard holds the hub weakly; if the hub is gone first, dropping the
/// guard does nothing.
#[must_use = "dropping a Subscription unregisters its listener"]
pub struct Subscription {
    hub: Weak<DispatchHub>,
    key: DispatchKey,
    detach: Option<Detach>,
}

impl Subscription {
    fn new(hub: &Arc<DispatchHub>, key: &DispatchKey, outcome: RegisterOutcome, detach: Detach) -> Self {
        // Only a fresh registration is owned by the guard.
        let detach = (outcome == RegisterOutcome::Added).then_some(detach);
        Self {
            hub: Arc::downgrade(hub),
            key: key.clone(),
            detach,
        }
    }

    /// Whether this guard owns a live registration.
    pub fn is_active(&self) -> bool {
        self.detach.is_some() && self.hub.strong_count() > 0
    }

    /// The key this subscription listens on.
    pub fn key(&self) -> &DispatchKey {
        &self.key
    }

    /// Unregister now.
    pub fn cancel(self) {}

    /// Give up ownership: the listener stays registered after the guard is gone.
    pub fn forget(mut self) {
        self.detach = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let (Some(detach), Some(hub)) = (self.detach.take(), self.hub.upgrade()) {
            detach(&hub);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("key", &self.key)
            .field("active", &self.is_active())
            .finish()
    }
}

impl DispatchHub {
    /// Register `listener` under `key` for as long as the returned guard lives.
    ///
    /// A rejected or duplicate registration yields an inactive guard.
    pub fn subscribe(self: &Arc<Self>, key: &DispatchKey, listener: &Listener) -> Subscription {
        let outcome = self.register(key, listener);
        let (detach_key, detach_listener) = (key.clone(), listener.clone());
        Subscription::new(
            self,
            key,
            outcome,
            Box::new(move |hub: &DispatchHub| {
                hub.unregister(&detach_key, &detach_listener);
            }),
        )
    }

    /// Typed form of [`subscribe`](Self::subscribe).
    pub fn subscribe_typed<T: Payload>(
        self: &Arc<Self>,
        key: &DispatchKey,
        listener: &TypedListener<T>,
    ) -> Subscription {
        let outcome = self.register_typed(key, listener);
        let (detach_key, detach_listener) = (key.clone(), listener.clone());
        Subscription::new(
            self,
            key,
            outcome,
            Box::new(move |hub: &DispatchHub| {
                hub.unregister_typed(&detach_key, &detach_listener);
            }),
        )
    }

    /// Subscribe to a typed key.
    pub fn subscribe_to<T: Payload>(
        self: &Arc<Self>,
        key: &TypedKey<T>,
        listener: &TypedListener<T>,
    ) -> Subscription {
        self.subscribe_typed(key.key(), listener)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sinks::NullSink;

    fn hub() -> Arc<DispatchHub> {
        DispatchHub::builder().sink(NullSink).build_shared()
    }

    #[test]
    fn test_drop_unregisters() {
        let hub = hub();
        let key = DispatchKey::new("Score");
        let listener = Listener::new(|| ());

        let subscription = hub.subscribe(&key, &listener);
        assert!(subscription.is_active());
        assert!(hub.is_registered(&key, &listener));

        drop(subscription);
        assert!(!hub.is_registered(&key, &listener));
        assert!(hub.is_empty());
    }

    #[test]
    fn test_duplicate_subscription_is_inert() {
        let hub = hub();
        let key = DispatchKey::new("Score");
        let listener = Listener::new(|| ());

        hub.register(&key, &listener);
        let subscription = hub.subscribe(&key, &listener);
        assert!(!subscription.is_active());
        subscription.cancel();
        assert!(hub.is_registered(&key, &listener));
    }

    #[test]
    fn test_forget_keeps_registration() {
        let hub = hub();
        let key = TypedKey::<u32>::new("Level");
        let listener = TypedListener::new(|_: &u32| ());

        hub.subscribe_to(&key, &listener).forget();
        assert!(hub.is_registered_typed(&key, &listener));
    }

    #[test]
    fn test_drop_after_hub_is_gone() {
        let hub = hub();
        let key = DispatchKey::new("Score");
        let subscription = hub.subscribe(&key, &Listener::new(|| ()));
        drop(hub);
        assert!(!subscription.is_active());
        drop(subscription);
    }
}
