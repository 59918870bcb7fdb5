use std::fmt;

/// Configuration errors, reported when a scheduler is armed and never while polling.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncError {
    /// Tempo must be finite and greater than zero
    InvalidTempo(f64),
    /// Sample rate must be finite and greater than zero
    InvalidSampleRate(f64),
    /// Period scalar must be at least 1
    InvalidScalar(u32),
    /// Poll interval in milliseconds must be finite and non-negative
    InvalidLoopTime(f64),
    /// A note value string that does not name a known denomination
    UnknownNoteValue(String),
    /// Tempo and rate combine into a period that is not a positive finite
    /// number of samples
    InvalidPeriod(f64),
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncError::InvalidTempo(bpm) => {
                write!(f, "Invalid tempo {} BPM: tempo must be positive", bpm)
            }
            SyncError::InvalidSampleRate(rate) => {
                write!(f, "Invalid sample rate {} Hz: must be positive", rate)
            }
            SyncError::InvalidScalar(scalar) => {
                write!(f, "Invalid scalar {}: must be at least 1", scalar)
            }
            SyncError::InvalidLoopTime(ms) => {
                write!(f, "Invalid loop time {} ms: must be zero or positive", ms)
            }
            SyncError::UnknownNoteValue(s) => write!(f, "Unknown note value '{}'", s),
            SyncError::InvalidPeriod(samples) => {
                write!(f, "Invalid period {} samples: must be finite and positive", samples)
            }
        }
    }
}

impl std::error::Error for SyncError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            SyncError::InvalidTempo(0.0).to_string(),
            "Invalid tempo 0 BPM: tempo must be positive"
        );
        assert_eq!(
            SyncError::UnknownNoteValue("1/5".to_string()).to_string(),
            "Unknown note value '1/5'"
        );
        assert_eq!(
            SyncError::InvalidPeriod(f64::INFINITY).to_string(),
            "Invalid period inf samples: must be finite and positive"
        );
    }

    #[test]
    fn test_converts_into_anyhow() {
        let err: anyhow::Error = SyncError::InvalidScalar(0).into();
        assert!(err.to_string().contains("at least 1"));
    }
}
