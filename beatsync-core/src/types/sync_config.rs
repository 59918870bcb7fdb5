//! Setup-time configuration for a beat synchroniser
//!
//! Pure data: nothing here touches a clock. Hosts build a [`SyncConfig`]
//! (or deserialize one with the `serde` feature) and hand it to the
//! scheduler when the tempo becomes known.

use crate::error::SyncError;
use crate::types::beat_type::BeatType;
use crate::types::note_value::NoteValue;

/// Default poll interval in milliseconds
pub const DEFAULT_LOOP_TIME_MS: f64 = 30.0;

/// How one boundary (beat or bar) recurs
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoundarySpec {
    /// Base note length of one period
    pub value: NoteValue,
    /// Period multiplier (1 = one `value` per period)
    pub scalar: u32,
    /// Syncopation shift, `None` for no shift
    pub offset: Option<NoteValue>,
    /// Shift behind the boundary instead of ahead of it
    pub negative_offset: bool,
}

impl BoundarySpec {
    /// One `value` per period, no offset
    pub fn new(value: NoteValue) -> Self {
        Self {
            value,
            scalar: 1,
            offset: None,
            negative_offset: false,
        }
    }

    /// Quarter-note beats
    pub fn beat() -> Self {
        Self::new(NoteValue::Quarter)
    }

    /// Whole-note bars (four quarter beats)
    pub fn bar() -> Self {
        Self::new(NoteValue::Whole)
    }

    pub fn with_scalar(mut self, scalar: u32) -> Self {
        self.scalar = scalar;
        self
    }

    /// Shift ahead of the boundary by `offset`
    pub fn with_offset(mut self, offset: NoteValue) -> Self {
        self.offset = Some(offset);
        self.negative_offset = false;
        self
    }

    /// Shift behind the boundary by `offset`
    pub fn with_negative_offset(mut self, offset: NoteValue) -> Self {
        self.offset = Some(offset);
        self.negative_offset = true;
        self
    }

    pub fn validate(&self) -> Result<(), SyncError> {
        if self.scalar < 1 {
            return Err(SyncError::InvalidScalar(self.scalar));
        }
        Ok(())
    }
}

/// Full synchroniser configuration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SyncConfig {
    /// Tempo of the audio source in quarter-note beats per minute
    pub tempo_bpm: f64,
    pub beat: BoundarySpec,
    pub bar: BoundarySpec,
    /// Wait between scheduler checks. Zero polls continuously.
    pub loop_time_ms: f64,
    /// Accent carried with every notification
    pub beat_type: BeatType,
}

impl SyncConfig {
    pub fn new(tempo_bpm: f64) -> Self {
        Self {
            tempo_bpm,
            ..Self::default()
        }
    }

    pub fn with_beat(mut self, beat: BoundarySpec) -> Self {
        self.beat = beat;
        self
    }

    pub fn with_bar(mut self, bar: BoundarySpec) -> Self {
        self.bar = bar;
        self
    }

    pub fn with_loop_time_ms(mut self, loop_time_ms: f64) -> Self {
        self.loop_time_ms = loop_time_ms;
        self
    }

    pub fn with_beat_type(mut self, beat_type: BeatType) -> Self {
        self.beat_type = beat_type;
        self
    }

    /// Check everything that can be checked without a clock
    pub fn validate(&self) -> Result<(), SyncError> {
        validate_tempo(self.tempo_bpm)?;
        validate_loop_time(self.loop_time_ms)?;
        self.beat.validate()?;
        self.bar.validate()
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            tempo_bpm: 120.0,
            beat: BoundarySpec::beat(),
            bar: BoundarySpec::bar(),
            loop_time_ms: DEFAULT_LOOP_TIME_MS,
            beat_type: BeatType::OnBeat,
        }
    }
}

pub fn validate_tempo(tempo_bpm: f64) -> Result<(), SyncError> {
    if tempo_bpm.is_finite() && tempo_bpm > 0.0 {
        Ok(())
    } else {
        Err(SyncError::InvalidTempo(tempo_bpm))
    }
}

pub fn validate_loop_time(loop_time_ms: f64) -> Result<(), SyncError> {
    if loop_time_ms.is_finite() && loop_time_ms >= 0.0 {
        Ok(())
    } else {
        Err(SyncError::InvalidLoopTime(loop_time_ms))
    }
}
