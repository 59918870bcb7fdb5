//! Beat/bar scheduling state machine
//!
//! Holds the next expected beat and bar thresholds and advances them as the
//! clock moves. Beats and bars are tracked independently but share the same
//! playback-start anchor, so a bar whose period is a whole multiple of the
//! beat period always lands on a beat.

use crate::clock::ClockSource;
use crate::error::SyncError;
use crate::observer::NotificationDispatcher;
use crate::timing::period::SamplePeriod;
use crate::types::{BeatType, BoundarySpec, SyncConfig};

/// Lifecycle of a scheduler
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerState {
    /// No active playback session; ticks are ignored
    Idle,
    /// Thresholds anchored to a playback start, waiting for the first tick
    Armed,
    /// Clock active, ticks check for boundary crossings
    Running,
}

/// What a single poll tick did
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Beat boundaries crossed (and dispatched) during this tick
    pub beats: u32,
    /// Bar boundaries crossed (and dispatched) during this tick
    pub bars: u32,
    /// The clock was found inactive and the scheduler went idle
    pub stopped: bool,
}

impl TickReport {
    pub fn fired_anything(&self) -> bool {
        self.beats > 0 || self.bars > 0
    }
}

/// One recurring boundary: its period and the next threshold to cross
#[derive(Clone, Copy, Debug)]
struct BoundaryTracker {
    period: SamplePeriod,
    next_sample: f64,
}

impl BoundaryTracker {
    fn new(period: SamplePeriod) -> Self {
        Self {
            period,
            next_sample: 0.0,
        }
    }

    /// Fire once for every threshold at or before `current`.
    ///
    /// Loops rather than checking once so a coarse poll still reports every
    /// elapsed boundary and the threshold never trails the clock.
    fn catch_up(&mut self, current: f64, mut fire: impl FnMut()) -> u32 {
        let mut crossed = 0;
        while current >= self.next_sample + self.period.offset_samples {
            fire();
            self.next_sample += self.period.period_samples;
            crossed += 1;
        }
        crossed
    }
}

/// Tracks beat and bar thresholds against a [`ClockSource`]
#[derive(Debug)]
pub struct SyncScheduler {
    beat: BoundaryTracker,
    bar: BoundaryTracker,
    beat_type: BeatType,
    state: SchedulerState,
    /// Set once a playback start has anchored the thresholds
    anchored: bool,
}

impl SyncScheduler {
    /// Arm a scheduler: validate `config` and derive both periods at `sample_rate`.
    ///
    /// All configuration errors surface here, before any polling.
    pub fn new(config: &SyncConfig, sample_rate: f64) -> Result<Self, SyncError> {
        config.validate()?;
        Self::from_specs(
            config.tempo_bpm,
            &config.beat,
            &config.bar,
            config.beat_type,
            sample_rate,
        )
    }

    pub fn from_specs(
        tempo_bpm: f64,
        beat: &BoundarySpec,
        bar: &BoundarySpec,
        beat_type: BeatType,
        sample_rate: f64,
    ) -> Result<Self, SyncError> {
        let beat_period = SamplePeriod::for_spec(beat, tempo_bpm, sample_rate)?;
        let bar_period = SamplePeriod::for_spec(bar, tempo_bpm, sample_rate)?;
        log::debug!(
            "Armed at {} BPM / {} Hz: beat {:?}, bar {:?}",
            tempo_bpm,
            sample_rate,
            beat_period,
            bar_period
        );

        Ok(Self {
            beat: BoundaryTracker::new(beat_period),
            bar: BoundaryTracker::new(bar_period),
            beat_type,
            state: SchedulerState::Idle,
            anchored: false,
        })
    }

    /// Anchor both thresholds to the frame where playback starts
    pub fn on_playback_start(&mut self, start_sample_frame: f64) {
        self.beat.next_sample = start_sample_frame;
        self.bar.next_sample = start_sample_frame;
        self.anchored = true;
        self.state = SchedulerState::Armed;
        log::debug!("Scheduler armed at frame {}", start_sample_frame);
    }

    /// Check the clock and dispatch every boundary crossed since the last tick.
    ///
    /// A tick while idle does nothing. If the clock has stopped the
    /// scheduler goes idle and the report says so.
    pub fn on_poll_tick(
        &mut self,
        clock: &dyn ClockSource,
        dispatcher: &NotificationDispatcher,
    ) -> TickReport {
        if self.state == SchedulerState::Idle {
            return TickReport::default();
        }
        if !clock.is_active() {
            self.stop();
            return TickReport {
                stopped: true,
                ..TickReport::default()
            };
        }
        self.state = SchedulerState::Running;

        let current = clock.current_sample_frame();
        let beat_type = self.beat_type;
        let beats = self.beat.catch_up(current, || {
            dispatcher.fire_beat(beat_type);
        });
        let bars = self.bar.catch_up(current, || {
            dispatcher.fire_bar(beat_type);
        });

        if beats > 1 || bars > 1 {
            log::debug!(
                "Poll at frame {} caught up {} beats and {} bars",
                current,
                beats,
                bars
            );
        }

        TickReport {
            beats,
            bars,
            stopped: false,
        }
    }

    /// Continue checking from the current thresholds without re-anchoring.
    ///
    /// Returns false if no playback start has ever anchored this scheduler.
    pub fn resume(&mut self) -> bool {
        if !self.anchored {
            return false;
        }
        if self.state == SchedulerState::Idle {
            self.state = SchedulerState::Running;
        }
        true
    }

    /// Go idle; later ticks are ignored until the next start or resume
    pub fn stop(&mut self) {
        if self.state != SchedulerState::Idle {
            log::debug!("Scheduler idle");
        }
        self.state = SchedulerState::Idle;
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn beat_type(&self) -> BeatType {
        self.beat_type
    }

    pub fn beat_period(&self) -> SamplePeriod {
        self.beat.period
    }

    pub fn bar_period(&self) -> SamplePeriod {
        self.bar.period
    }

    /// Next beat threshold, before the offset is applied
    pub fn next_beat_sample(&self) -> f64 {
        self.beat.next_sample
    }

    /// Next bar threshold, before the offset is applied
    pub fn next_bar_sample(&self) -> f64 {
        self.bar.next_sample
    }
}
