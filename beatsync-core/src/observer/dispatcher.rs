//! Fan-out of beat and bar boundaries to registered listeners

use crate::observer::registry::{BeatObserver, ObserverHandle, ObserverRegistry};
use crate::types::BeatType;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, RwLock};

/// Hook run immediately before every boundary dispatch, letting an external
/// timeline re-anchor itself before dependents react
pub type SyncHook = Arc<dyn Fn() + Send + Sync>;

/// Which boundary is being delivered
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Boundary {
    Beat,
    Bar,
}

/// Delivers boundaries to an [`ObserverRegistry`]
pub struct NotificationDispatcher {
    registry: Arc<ObserverRegistry>,
    sync_hook: RwLock<Option<SyncHook>>,
}

impl NotificationDispatcher {
    pub fn new(registry: Arc<ObserverRegistry>) -> Self {
        Self {
            registry,
            sync_hook: RwLock::new(None),
        }
    }

    pub fn registry(&self) -> &Arc<ObserverRegistry> {
        &self.registry
    }

    /// Install (or clear with `None`) the sync-grounding hook
    pub fn set_sync_hook(&self, hook: Option<SyncHook>) {
        *self
            .sync_hook
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = hook;
    }

    /// Deliver a beat. Returns how many listeners handled it successfully.
    pub fn fire_beat(&self, beat_type: BeatType) -> usize {
        self.fire(Boundary::Beat, beat_type)
    }

    /// Deliver a bar. Returns how many listeners handled it successfully.
    pub fn fire_bar(&self, beat_type: BeatType) -> usize {
        self.fire(Boundary::Bar, beat_type)
    }

    /// Run the hook once, then every listener in registration order.
    ///
    /// A failing or panicking listener is logged and skipped; the rest still
    /// receive the boundary.
    pub fn fire(&self, boundary: Boundary, beat_type: BeatType) -> usize {
        let hook = self
            .sync_hook
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        if let Some(hook) = hook {
            if panic::catch_unwind(AssertUnwindSafe(|| hook())).is_err() {
                log::warn!("Sync hook panicked before {:?} dispatch", boundary);
            }
        }

        let mut delivered = 0;
        for (index, observer) in self.registry.snapshot().iter().enumerate() {
            match notify(observer, boundary, beat_type) {
                Ok(()) => delivered += 1,
                Err(e) => log::warn!("Listener #{} failed on {:?}: {}", index, boundary, e),
            }
        }
        delivered
    }
}

fn notify(
    observer: &ObserverHandle,
    boundary: Boundary,
    beat_type: BeatType,
) -> anyhow::Result<()> {
    let observer: &dyn BeatObserver = observer.as_ref();
    match panic::catch_unwind(AssertUnwindSafe(|| match boundary {
        Boundary::Beat => observer.on_beat(beat_type),
        Boundary::Bar => observer.on_bar(beat_type),
    })) {
        Ok(result) => result,
        Err(_) => Err(anyhow::anyhow!("listener panicked")),
    }
}
