//! # Beatsync
//!
//! Beat and bar notifications locked to an audio sample clock.
//!
//! The scheduling engine lives in `beatsync-core`; this crate adds the
//! pieces that need threads or audio hardware.
//!
//! ## Modules
//!
//! - `audio`: a cpal output stream whose rendered frame count serves as the
//!   sample clock.
//! - `sync`: the poll loop thread and the `BeatSynchronizer` that ties a
//!   clock, a scheduler and a set of listeners together.
//! - `monitor`: the terminal beat monitor behind the `beatsync` binary.

pub mod audio;
pub mod monitor;
pub mod sync;

// Re-export commonly used types for convenience
pub use beatsync_core::{
    BeatObserver, BeatType, BoundarySpec, ClockSource, ManualClock, NoteValue, SyncConfig,
    SyncError,
};
pub use crate::audio::{AudioClockStream, CpalClock};
pub use crate::sync::BeatSynchronizer;
