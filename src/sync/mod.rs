//! Threaded driving of the beat/bar scheduler

pub mod poll_loop;
pub mod synchronizer;

pub use poll_loop::{PollCommand, PollLoop};
pub use synchronizer::{BeatSynchronizer, STALL_TIMEOUT};
