//! Collision listeners and the registry that broadcasts to them.

use std::sync::{Arc, Mutex, PoisonError};

use crate::pair::{BodyHandle, BodyPair};

// ---------------------------------------------------------------------------
// CollisionListener
// ---------------------------------------------------------------------------

/// Consumer of collision transitions.
///
/// Both callbacks are required. They are invoked synchronously from
/// [`PhysicsWorld::simulate`](crate::world::PhysicsWorld::simulate) with the
/// pair in canonical order (lower handle first).
pub trait CollisionListener {
    /// `a` and `b` started touching this step.
    fn on_collision(&mut self, a: BodyHandle, b: BodyHandle);

    /// `a` and `b` stopped touching this step.
    fn on_separation(&mut self, a: BodyHandle, b: BodyHandle);
}

/// Listener registration shared between the caller and the world.
///
/// The caller keeps its own clone (typed, e.g. `Arc<Mutex<MyListener>>`) to
/// read results and to unsubscribe.
pub type SharedListener = Arc<Mutex<dyn CollisionListener + Send>>;

/// Wrap a listener for subscription.
pub fn shared<L: CollisionListener + Send>(listener: L) -> Arc<Mutex<L>> {
    Arc::new(Mutex::new(listener))
}

// ---------------------------------------------------------------------------
// CollisionEvent
// ---------------------------------------------------------------------------

/// Edge of a contact between two bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContactKind {
    Began,
    Ended,
}

/// A single transition produced by one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CollisionEvent {
    pub pair: BodyPair,
    pub kind: ContactKind,
}

impl CollisionEvent {
    /// Deliver this event to `listener`.
    pub fn deliver(&self, listener: &mut (impl CollisionListener + ?Sized)) {
        let (a, b) = self.pair.handles();
        match self.kind {
            ContactKind::Began => listener.on_collision(a, b),
            ContactKind::Ended => listener.on_separation(a, b),
        }
    }
}

// ---------------------------------------------------------------------------
// ListenerRegistry
// ---------------------------------------------------------------------------

/// Ordered list of subscribed listeners.
///
/// Identity is the address of the shared allocation. Subscribing the same
/// listener twice delivers every event to it twice.
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: Vec<SharedListener>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `listener`; it receives events after every earlier subscriber.
    pub fn subscribe(&mut self, listener: SharedListener) {
        self.listeners.push(listener);
    }

    /// Remove the first registration of `listener`. No-op if absent.
    ///
    /// Returns whether a registration was removed.
    pub fn unsubscribe<L>(&mut self, listener: &Arc<Mutex<L>>) -> bool
    where
        L: CollisionListener + Send + ?Sized,
    {
        let target = Arc::as_ptr(listener);
        let Some(index) = self
            .listeners
            .iter()
            .position(|l| std::ptr::addr_eq(Arc::as_ptr(l), target))
        else {
            return false;
        };
        self.listeners.remove(index);
        true
    }

    /// Number of registrations.
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Broadcast `events` in order, each to every listener in subscription
    /// order.
    pub fn dispatch(&self, events: &[CollisionEvent]) {
        if self.listeners.is_empty() {
            return;
        }
        for event in events {
            for listener in &self.listeners {
                // A listener that panicked earlier still gets events.
                let mut guard = listener.lock().unwrap_or_else(PoisonError::into_inner);
                event.deliver(&mut *guard);
            }
        }
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Tally {
        began: Vec<(BodyHandle, BodyHandle)>,
        ended: Vec<(BodyHandle, BodyHandle)>,
    }

    impl CollisionListener for Tally {
        fn on_collision(&mut self, a: BodyHandle, b: BodyHandle) {
            self.began.push((a, b));
        }
        fn on_separation(&mut self, a: BodyHandle, b: BodyHandle) {
            self.ended.push((a, b));
        }
    }

    fn pair(a: u32, b: u32) -> BodyPair {
        BodyPair::new(BodyHandle::from_parts(a, 0), BodyHandle::from_parts(b, 0))
    }

    fn began(a: u32, b: u32) -> CollisionEvent {
        CollisionEvent {
            pair: pair(a, b),
            kind: ContactKind::Began,
        }
    }

    fn ended(a: u32, b: u32) -> CollisionEvent {
        CollisionEvent {
            pair: pair(a, b),
            kind: ContactKind::Ended,
        }
    }

    #[test]
    fn registry_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ListenerRegistry>();
    }

    #[test]
    fn dispatch_routes_by_kind() {
        let tally = shared(Tally::default());
        let mut registry = ListenerRegistry::new();
        registry.subscribe(tally.clone());

        registry.dispatch(&[began(2, 1), ended(3, 4)]);

        let tally = tally.lock().unwrap();
        assert_eq!(tally.began, vec![pair(1, 2).handles()]);
        assert_eq!(tally.ended, vec![pair(3, 4).handles()]);
    }

    #[test]
    fn listeners_called_in_subscription_order() {
        struct Ordered {
            id: u8,
            log: Arc<Mutex<Vec<u8>>>,
        }
        impl CollisionListener for Ordered {
            fn on_collision(&mut self, _: BodyHandle, _: BodyHandle) {
                self.log.lock().unwrap().push(self.id);
            }
            fn on_separation(&mut self, _: BodyHandle, _: BodyHandle) {}
        }

        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = ListenerRegistry::new();
        for id in [3, 1, 2] {
            registry.subscribe(shared(Ordered {
                id,
                log: log.clone(),
            }));
        }
        registry.dispatch(&[began(0, 1)]);
        assert_eq!(*log.lock().unwrap(), vec![3, 1, 2]);
    }

    #[test]
    fn unsubscribe_stops_delivery_to_that_listener_only() {
        let a = shared(Tally::default());
        let b = shared(Tally::default());
        let mut registry = ListenerRegistry::new();
        registry.subscribe(a.clone());
        registry.subscribe(b.clone());

        registry.dispatch(&[began(0, 1)]);
        assert!(registry.unsubscribe(&a));
        registry.dispatch(&[began(1, 2)]);

        assert_eq!(a.lock().unwrap().began.len(), 1);
        assert_eq!(b.lock().unwrap().began.len(), 2);
    }

    #[test]
    fn unsubscribe_absent_is_noop() {
        let a = shared(Tally::default());
        let stranger = shared(Tally::default());
        let mut registry = ListenerRegistry::new();
        registry.subscribe(a.clone());

        assert!(!registry.unsubscribe(&stranger));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn unsubscribe_accepts_type_erased_handle() {
        let erased: SharedListener = shared(Tally::default());
        let mut registry = ListenerRegistry::new();
        registry.subscribe(erased.clone());
        assert!(registry.unsubscribe(&erased));
        assert!(registry.is_empty());
    }

    #[test]
    fn double_subscription_delivers_twice() {
        let a = shared(Tally::default());
        let mut registry = ListenerRegistry::new();
        registry.subscribe(a.clone());
        registry.subscribe(a.clone());

        registry.dispatch(&[ended(5, 6)]);
        assert_eq!(a.lock().unwrap().ended.len(), 2);

        // One unsubscribe removes one registration.
        registry.unsubscribe(&a);
        registry.dispatch(&[ended(5, 6)]);
        assert_eq!(a.lock().unwrap().ended.len(), 3);
    }

    #[test]
    fn poisoned_listener_still_receives_events() {
        let a = shared(Tally::default());
        let poisoner = a.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.lock().unwrap();
            panic!("poison the lock");
        })
        .join();
        assert!(a.is_poisoned());

        let mut registry = ListenerRegistry::new();
        registry.subscribe(a.clone());
        registry.dispatch(&[began(0, 1)]);

        let tally = a.lock().unwrap_or_else(PoisonError::into_inner);
        assert_eq!(tally.began.len(), 1);
    }
}
