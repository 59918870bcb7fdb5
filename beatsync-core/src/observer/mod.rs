//! Listener registration and boundary fan-out

pub mod dispatcher;
pub mod registry;

pub use dispatcher::{Boundary, NotificationDispatcher, SyncHook};
pub use registry::{BeatObserver, ObserverHandle, ObserverRegistry};
