//! Multi-subscriber change notification with per-listener failure isolation

use parking_lot::RwLock;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{trace, warn};

/// Callback invoked when the observed state changes
///
/// Listeners take no arguments: they re-read the state through its getters.
pub type Listener = Arc<dyn Fn() + Send + Sync>;

/// Opaque token returned by [`ListenerRegistry::add_listener`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// Ordered, append-only collection of listeners
///
/// Dispatch invokes every listener in registration order. A listener that
/// panics is logged and skipped; the remaining listeners still run.
pub struct ListenerRegistry {
    label: &'static str,
    listeners: RwLock<Vec<(ListenerId, Listener)>>,
    next_id: AtomicU64,
}

impl ListenerRegistry {
    /// Create an empty registry; `label` only appears in logs
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            listeners: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }

    pub fn add_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.write().push((id, Arc::new(listener)));
        id
    }

    pub fn len(&self) -> usize {
        self.listeners.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.read().is_empty()
    }

    /// Invoke all listeners, returning how many completed without panicking
    pub fn call_listeners(&self) -> usize {
        // Snapshot so listeners may register further listeners during dispatch
        let snapshot: Vec<(ListenerId, Listener)> = self.listeners.read().clone();
        trace!("Dispatching '{}' to {} listeners", self.label, snapshot.len());

        let mut completed = 0;
        for (id, listener) in snapshot {
            match catch_unwind(AssertUnwindSafe(|| listener())) {
                Ok(()) => completed += 1,
                Err(_) => warn!("⚠️  Listener {:?} on '{}' panicked, skipping", id, self.label),
            }
        }
        completed
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("label", &self.label)
            .field("listeners", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_dispatch_in_registration_order() {
        let registry = ListenerRegistry::new("order");
        let seen = Arc::new(Mutex::new(Vec::new()));

        for i in 0..3 {
            let seen = Arc::clone(&seen);
            registry.add_listener(move || seen.lock().push(i));
        }

        assert_eq!(registry.call_listeners(), 3);
        assert_eq!(*seen.lock(), vec![0, 1, 2]);
    }

    #[test]
    fn test_ids_are_unique() {
        let registry = ListenerRegistry::new("ids");
        let a = registry.add_listener(|| {});
        let b = registry.add_listener(|| {});
        assert_ne!(a, b);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_panicking_listener_is_isolated() {
        let registry = ListenerRegistry::new("isolation");
        let hits = Arc::new(AtomicU64::new(0));

        registry.add_listener(|| panic!("consumer bug"));
        let counter = Arc::clone(&hits);
        registry.add_listener(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(registry.call_listeners(), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        // A second dispatch behaves the same way
        assert_eq!(registry.call_listeners(), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_listener_may_register_during_dispatch() {
        let registry = Arc::new(ListenerRegistry::new("reentrant"));
        let inner = Arc::clone(&registry);
        registry.add_listener(move || {
            inner.add_listener(|| {});
        });

        registry.call_listeners();
        assert_eq!(registry.len(), 2);
    }
}
