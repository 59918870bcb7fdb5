//! Sample-domain timing: period derivation and the beat/bar state machine

pub mod period;
pub mod scheduler;

pub use period::{compute_period, SamplePeriod};
pub use scheduler::{SchedulerState, SyncScheduler, TickReport};
