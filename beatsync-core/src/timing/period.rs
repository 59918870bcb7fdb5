//! Tempo + note value → sample-domain period and offset

use crate::error::SyncError;
use crate::types::note_value::NoteValue;
use crate::types::sync_config::{validate_tempo, BoundarySpec};
use num_rational::Ratio;
use num_traits::ToPrimitive;

/// Period and phase offset of one recurring boundary, in samples
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplePeriod {
    /// Samples between consecutive boundaries, always > 0
    pub period_samples: f64,
    /// Phase shift applied to every threshold, always >= 0
    pub offset_samples: f64,
}

impl SamplePeriod {
    /// Compute the period for a [`BoundarySpec`] at the given tempo and rate
    pub fn for_spec(
        spec: &BoundarySpec,
        tempo_bpm: f64,
        samples_per_second: f64,
    ) -> Result<Self, SyncError> {
        compute_period(
            tempo_bpm,
            spec.value,
            spec.scalar,
            spec.offset,
            spec.negative_offset,
            samples_per_second,
        )
    }

    /// Period expressed in seconds
    pub fn period_secs(&self, samples_per_second: f64) -> f64 {
        self.period_samples / samples_per_second
    }
}

/// Derive `(period, offset)` in samples.
///
/// `period = 60 / (tempo * fraction(value)) * rate * scalar`. A negative
/// offset is wrapped forward to `period - offset`, kept inside `[0, period)`.
pub fn compute_period(
    tempo_bpm: f64,
    value: NoteValue,
    scalar: u32,
    offset: Option<NoteValue>,
    offset_is_negative: bool,
    samples_per_second: f64,
) -> Result<SamplePeriod, SyncError> {
    validate_tempo(tempo_bpm)?;
    if !(samples_per_second.is_finite() && samples_per_second > 0.0) {
        return Err(SyncError::InvalidSampleRate(samples_per_second));
    }
    if scalar < 1 {
        return Err(SyncError::InvalidScalar(scalar));
    }

    let period_samples =
        samples_for(tempo_bpm, value.fraction_of_whole(), samples_per_second) * scalar as f64;

    let offset_samples = match offset {
        None => 0.0,
        Some(offset_value) => {
            let raw = samples_for(tempo_bpm, offset_value.fraction_of_whole(), samples_per_second)
                * scalar as f64;
            if offset_is_negative {
                (period_samples - raw).rem_euclid(period_samples)
            } else {
                raw
            }
        }
    };

    // Extreme but valid inputs can still overflow or underflow
    if !(period_samples.is_finite() && period_samples > 0.0) {
        return Err(SyncError::InvalidPeriod(period_samples));
    }
    if !(offset_samples.is_finite() && offset_samples >= 0.0) {
        return Err(SyncError::InvalidPeriod(offset_samples));
    }

    Ok(SamplePeriod {
        period_samples,
        offset_samples,
    })
}

/// Samples spanned by one note of ratio `fraction` (quarter = 1).
///
/// Multiplies by the denominator before dividing so whole-number results
/// (e.g. 22050 at 120 BPM / 44.1 kHz) stay exact.
fn samples_for(tempo_bpm: f64, fraction: Ratio<i64>, samples_per_second: f64) -> f64 {
    let numer = fraction.numer().to_f64().unwrap_or(1.0);
    let denom = fraction.denom().to_f64().unwrap_or(1.0);
    (60.0 * samples_per_second * denom) / (tempo_bpm * numer)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: f64 = 44100.0;

    #[test]
    fn test_quarter_and_eighth_at_120() {
        let quarter = compute_period(120.0, NoteValue::Quarter, 1, None, false, RATE).unwrap();
        assert_eq!(quarter.period_samples, 22050.0);
        assert_eq!(quarter.offset_samples, 0.0);

        let eighth = compute_period(120.0, NoteValue::Eighth, 1, None, false, RATE).unwrap();
        assert_eq!(eighth.period_samples, 11025.0);
    }

    #[test]
    fn test_whole_bar_is_four_quarters_at_90() {
        let beat = compute_period(90.0, NoteValue::Quarter, 1, None, false, RATE).unwrap();
        let bar = compute_period(90.0, NoteValue::Whole, 1, None, false, RATE).unwrap();
        assert_eq!(bar.period_samples, beat.period_samples * 4.0);
    }

    #[test]
    fn test_scalar_multiplies_period_and_offset() {
        let single =
            compute_period(120.0, NoteValue::Quarter, 1, Some(NoteValue::Sixteenth), false, RATE)
                .unwrap();
        let triple =
            compute_period(120.0, NoteValue::Quarter, 3, Some(NoteValue::Sixteenth), false, RATE)
                .unwrap();
        assert_eq!(triple.period_samples, single.period_samples * 3.0);
        assert_eq!(triple.offset_samples, single.offset_samples * 3.0);
    }

    #[test]
    fn test_positive_offset() {
        let p = compute_period(120.0, NoteValue::Quarter, 1, Some(NoteValue::Eighth), false, RATE)
            .unwrap();
        assert_eq!(p.offset_samples, 11025.0);
    }

    #[test]
    fn test_negative_offset_wraps_forward() {
        let p = compute_period(120.0, NoteValue::Quarter, 1, Some(NoteValue::Sixteenth), true, RATE)
            .unwrap();
        // 22050 - 5512.5
        assert_eq!(p.offset_samples, 16537.5);

        let p = compute_period(120.0, NoteValue::Quarter, 1, Some(NoteValue::Eighth), true, RATE)
            .unwrap();
        assert_eq!(p.offset_samples, 22050.0 - 11025.0);
    }

    #[test]
    fn test_negative_offset_longer_than_period_stays_in_range() {
        // A half-note shift behind a quarter beat lands back on the beat
        let p = compute_period(120.0, NoteValue::Quarter, 1, Some(NoteValue::Half), true, RATE)
            .unwrap();
        assert!(p.offset_samples >= 0.0 && p.offset_samples < p.period_samples);
        assert_eq!(p.offset_samples, 0.0);
    }

    #[test]
    fn test_precondition_violations() {
        assert_eq!(
            compute_period(0.0, NoteValue::Quarter, 1, None, false, RATE),
            Err(SyncError::InvalidTempo(0.0))
        );
        assert_eq!(
            compute_period(120.0, NoteValue::Quarter, 1, None, false, 0.0),
            Err(SyncError::InvalidSampleRate(0.0))
        );
        assert_eq!(
            compute_period(120.0, NoteValue::Quarter, 0, None, false, RATE),
            Err(SyncError::InvalidScalar(0))
        );
    }

    #[test]
    fn test_degenerate_results_rejected() {
        // Subnormal tempo: accepted as positive, but the period overflows
        let result = compute_period(
            1e-310,
            NoteValue::Quarter,
            1,
            Some(NoteValue::Eighth),
            true,
            RATE,
        );
        assert_eq!(result, Err(SyncError::InvalidPeriod(f64::INFINITY)));

        // Huge tempo at a tiny rate: the period underflows to zero
        let result = compute_period(1e308, NoteValue::Quarter, 1, None, false, 1e-300);
        assert_eq!(result, Err(SyncError::InvalidPeriod(0.0)));
    }

    #[test]
    fn test_recomputation_is_identical() {
        let spec = BoundarySpec::beat().with_negative_offset(NoteValue::SixteenthDotted);
        let first = SamplePeriod::for_spec(&spec, 133.0, 48000.0).unwrap();
        let second = SamplePeriod::for_spec(&spec, 133.0, 48000.0).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_period_secs() {
        let p = SamplePeriod::for_spec(&BoundarySpec::beat(), 60.0, 48000.0).unwrap();
        assert_eq!(p.period_secs(48000.0), 1.0);
    }
}
