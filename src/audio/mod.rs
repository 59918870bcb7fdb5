pub mod clock;

pub use clock::{AudioClockStream, CpalClock};
