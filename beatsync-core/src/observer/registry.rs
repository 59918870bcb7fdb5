//! Ordered registry of beat/bar listeners

use crate::types::BeatType;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

/// Something that reacts to beat and bar boundaries
///
/// Both methods default to doing nothing so listeners only implement what
/// they care about. Returning an error affects only this listener.
pub trait BeatObserver: Send + Sync {
    fn on_beat(&self, _beat_type: BeatType) -> anyhow::Result<()> {
        Ok(())
    }

    fn on_bar(&self, _beat_type: BeatType) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Shared handle to a listener
pub type ObserverHandle = Arc<dyn BeatObserver>;

/// Listener handles in registration order
///
/// Only weak references are kept: a listener stays registered while someone
/// else holds its handle, and dropped listeners are pruned. Safe to mutate
/// from any thread, including from inside a listener callback, since
/// dispatch works on a [`snapshot`](ObserverRegistry::snapshot).
#[derive(Default)]
pub struct ObserverRegistry {
    observers: RwLock<Vec<Weak<dyn BeatObserver>>>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a listener. Registering the same handle twice is ignored.
    pub fn register(&self, handle: ObserverHandle) {
        let mut observers = self.write();
        observers.retain(is_alive);
        if !observers.iter().any(|existing| same_observer(existing, &handle)) {
            observers.push(Arc::downgrade(&handle));
        }
    }

    /// Remove a listener; no-op if it is not registered
    pub fn unregister(&self, handle: &ObserverHandle) {
        self.write()
            .retain(|existing| is_alive(existing) && !same_observer(existing, handle));
    }

    pub fn contains(&self, handle: &ObserverHandle) -> bool {
        self.read()
            .iter()
            .any(|existing| is_alive(existing) && same_observer(existing, handle))
    }

    /// Number of live listeners
    pub fn len(&self) -> usize {
        self.read().iter().filter(|existing| is_alive(existing)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Consistent copy of the live listeners, in delivery order
    pub fn snapshot(&self) -> Vec<ObserverHandle> {
        self.read().iter().filter_map(Weak::upgrade).collect()
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Weak<dyn BeatObserver>>> {
        self.observers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Weak<dyn BeatObserver>>> {
        self.observers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn is_alive(observer: &Weak<dyn BeatObserver>) -> bool {
    observer.strong_count() > 0
}

/// Identity comparison on the data pointer only (vtable pointers may differ
/// across codegen units for the same object)
fn same_observer(registered: &Weak<dyn BeatObserver>, handle: &ObserverHandle) -> bool {
    std::ptr::eq(
        registered.as_ptr() as *const (),
        Arc::as_ptr(handle) as *const (),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Silent;
    impl BeatObserver for Silent {}

    fn silent() -> ObserverHandle {
        Arc::new(Silent)
    }

    fn same(a: &ObserverHandle, b: &ObserverHandle) -> bool {
        same_observer(&Arc::downgrade(a), b)
    }

    #[test]
    fn test_register_preserves_order() {
        let registry = ObserverRegistry::new();
        let (a, b, c) = (silent(), silent(), silent());

        registry.register(a.clone());
        registry.register(b.clone());
        registry.register(c.clone());

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.len(), 3);
        assert!(same(&snapshot[0], &a));
        assert!(same(&snapshot[1], &b));
        assert!(same(&snapshot[2], &c));
    }

    #[test]
    fn test_duplicate_registration_ignored() {
        let registry = ObserverRegistry::new();
        let a = silent();
        registry.register(a.clone());
        registry.register(a.clone());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unregister() {
        let registry = ObserverRegistry::new();
        let (a, b) = (silent(), silent());
        registry.register(a.clone());
        registry.register(b.clone());

        registry.unregister(&a);
        assert!(!registry.contains(&a));
        assert!(registry.contains(&b));

        // Absent handle: no-op
        registry.unregister(&a);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_dropped_listener_disappears() {
        let registry = ObserverRegistry::new();
        let a = silent();
        let b = silent();
        registry.register(a.clone());
        registry.register(b.clone());

        drop(a);
        assert_eq!(registry.len(), 1);
        let snapshot = registry.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert!(same(&snapshot[0], &b));
    }

    #[test]
    fn test_snapshot_keeps_listeners_alive_during_dispatch() {
        let registry = ObserverRegistry::new();
        let a = silent();
        registry.register(a.clone());

        let snapshot = registry.snapshot();
        registry.unregister(&a);
        drop(a);
        assert_eq!(snapshot.len(), 1);
        assert!(registry.is_empty());
    }
}
