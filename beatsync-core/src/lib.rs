//! # Beatsync Core
//!
//! Derives beats and bars from an advancing audio sample clock and
//! dispatches them to registered listeners. No threads and no audio I/O:
//! hosts drive [`SyncScheduler::on_poll_tick`] themselves, or use the
//! threaded poll loop in the `beatsync` crate.
//!
//! ## Features
//!
//! - **serde**: derive `Serialize`/`Deserialize` for the configuration types
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use beatsync_core::clock::{ClockSource, ManualClock};
//! use beatsync_core::observer::{NotificationDispatcher, ObserverRegistry};
//! use beatsync_core::{SyncConfig, SyncScheduler};
//!
//! let clock = ManualClock::new(44100.0);
//! let dispatcher = NotificationDispatcher::new(Arc::new(ObserverRegistry::new()));
//! let mut scheduler = SyncScheduler::new(&SyncConfig::new(120.0), clock.sample_rate())?;
//!
//! clock.play_from(0.0);
//! scheduler.on_playback_start(0.0);
//! clock.set_position(50_000.0);
//! let report = scheduler.on_poll_tick(&clock, &dispatcher);
//! assert_eq!(report.beats, 3);
//! # Ok::<(), beatsync_core::SyncError>(())
//! ```

pub mod clock;
pub mod error;
pub mod observer;
pub mod timing;
pub mod types;

// Re-export commonly used types
pub use clock::{ClockSource, ManualClock, PlaybackEvents};
pub use error::SyncError;
pub use observer::{BeatObserver, NotificationDispatcher, ObserverRegistry};
pub use timing::{SamplePeriod, SchedulerState, SyncScheduler, TickReport};
pub use types::{BeatType, BoundarySpec, NoteValue, SyncConfig};
