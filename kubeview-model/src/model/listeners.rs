use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, PoisonError},
};

/// Handle returned when registering a listener, used to unregister it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Subscription(u64);

#[derive(Debug)]
struct Slots<L: ?Sized> {
    next: u64,
    entries: BTreeMap<u64, Arc<L>>,
}

/// Registered listeners of a view-model, notified in registration order.
#[derive(Debug)]
pub struct Listeners<L: ?Sized> {
    slots: Mutex<Slots<L>>,
}

impl<L: ?Sized> Default for Listeners<L> {
    fn default() -> Self {
        Self {
            slots: Mutex::new(Slots {
                next: 0,
                entries: BTreeMap::new(),
            }),
        }
    }
}

impl<L: ?Sized> Listeners<L> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, listener: Arc<L>) -> Subscription {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let id = slots.next;
        slots.next += 1;
        slots.entries.insert(id, listener);

        Subscription(id)
    }

    /// Unregisters a listener. Returns false if it was already gone.
    pub fn remove(&self, sub: Subscription) -> bool {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .remove(&sub.0)
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Calls `f` on every listener. The registry is not locked while
    /// listeners run, so they may add or remove listeners.
    pub fn notify(&self, mut f: impl FnMut(&L)) {
        let snapshot: Vec<Arc<L>> = self
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .values()
            .cloned()
            .collect();
        for l in snapshot {
            f(&l);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    trait Counter: Send + Sync {
        fn hit(&self);
    }

    #[derive(Default)]
    struct Hits(AtomicUsize);

    impl Counter for Hits {
        fn hit(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_add_remove() {
        let ll: Listeners<dyn Counter> = Listeners::new();
        let h1 = Arc::new(Hits::default());
        let h2 = Arc::new(Hits::default());
        let s1 = ll.add(h1.clone());
        let s2 = ll.add(h2.clone());
        assert_ne!(s1, s2);

        ll.notify(|l| l.hit());
        assert!(ll.remove(s1));
        assert!(!ll.remove(s1));
        ll.notify(|l| l.hit());

        assert_eq!(h1.0.load(Ordering::SeqCst), 1);
        assert_eq!(h2.0.load(Ordering::SeqCst), 2);
        assert_eq!(ll.len(), 1);
    }

    #[test]
    fn test_same_listener_twice_gets_two_handles() {
        let ll: Listeners<dyn Counter> = Listeners::new();
        let h = Arc::new(Hits::default());
        let s1 = ll.add(h.clone());
        let _s2 = ll.add(h.clone());
        ll.remove(s1);
        ll.notify(|l| l.hit());

        assert_eq!(h.0.load(Ordering::SeqCst), 1);
    }
}
