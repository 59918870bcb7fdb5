//! Note value (denomination) lookup table
//!
//! Maps a symbolic note length to an exact ratio used to derive sample
//! periods from tempo. Ratios are normalised so that one tempo beat
//! (a quarter note) is `1`: an eighth is `2`, a whole note `1/4`.

use crate::error::SyncError;
use num_rational::Ratio;
use std::fmt;
use std::str::FromStr;

/// Symbolic note denomination
///
/// The "no denomination" case (e.g. no offset) is expressed as
/// `Option<NoteValue>::None` rather than a variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum NoteValue {
    SixtyFourth,
    SixtyFourthDotted,
    ThirtySecond,
    ThirtySecondDotted,
    Sixteenth,
    SixteenthDotted,
    Eighth,
    EighthDotted,
    Quarter,
    QuarterDotted,
    Half,
    HalfDotted,
    Whole,
    WholeDotted,
}

impl NoteValue {
    /// Every denomination, shortest first
    pub const ALL: [NoteValue; 14] = [
        NoteValue::SixtyFourth,
        NoteValue::SixtyFourthDotted,
        NoteValue::ThirtySecond,
        NoteValue::ThirtySecondDotted,
        NoteValue::Sixteenth,
        NoteValue::SixteenthDotted,
        NoteValue::Eighth,
        NoteValue::EighthDotted,
        NoteValue::Quarter,
        NoteValue::QuarterDotted,
        NoteValue::Half,
        NoteValue::HalfDotted,
        NoteValue::Whole,
        NoteValue::WholeDotted,
    ];

    /// How many of this note fit into one quarter-note beat.
    ///
    /// A dotted note lasts 3/2 as long as its plain value, so its ratio is 2/3
    /// of the plain one.
    pub fn fraction_of_whole(self) -> Ratio<i64> {
        match self {
            NoteValue::SixtyFourth => Ratio::from_integer(16),
            NoteValue::SixtyFourthDotted => Ratio::new(32, 3),
            NoteValue::ThirtySecond => Ratio::from_integer(8),
            NoteValue::ThirtySecondDotted => Ratio::new(16, 3),
            NoteValue::Sixteenth => Ratio::from_integer(4),
            NoteValue::SixteenthDotted => Ratio::new(8, 3),
            NoteValue::Eighth => Ratio::from_integer(2),
            NoteValue::EighthDotted => Ratio::new(4, 3),
            NoteValue::Quarter => Ratio::from_integer(1),
            NoteValue::QuarterDotted => Ratio::new(2, 3),
            NoteValue::Half => Ratio::new(1, 2),
            NoteValue::HalfDotted => Ratio::new(1, 3),
            NoteValue::Whole => Ratio::new(1, 4),
            NoteValue::WholeDotted => Ratio::new(1, 6),
        }
    }

    /// Length of this note measured in quarter-note beats
    pub fn length_in_beats(self) -> Ratio<i64> {
        self.fraction_of_whole().recip()
    }

    /// Whether this is a dotted value
    pub fn is_dotted(self) -> bool {
        matches!(
            self,
            NoteValue::SixtyFourthDotted
                | NoteValue::ThirtySecondDotted
                | NoteValue::SixteenthDotted
                | NoteValue::EighthDotted
                | NoteValue::QuarterDotted
                | NoteValue::HalfDotted
                | NoteValue::WholeDotted
        )
    }

    /// Parse a note value from a name (`quarter`, `dotted-eighth`) or a
    /// fraction (`1/4`, `1/8.`). Case-insensitive.
    pub fn from_name(s: &str) -> Option<Self> {
        let lower = s.trim().to_lowercase();
        let (base, dotted) = if let Some(rest) = lower.strip_prefix("dotted-") {
            (rest, true)
        } else if let Some(rest) = lower.strip_prefix("dotted ") {
            (rest, true)
        } else if let Some(rest) = lower.strip_suffix('.') {
            (rest, true)
        } else {
            (lower.as_str(), false)
        };

        let plain = match base {
            "64th" | "sixty-fourth" | "sixtyfourth" | "1/64" => NoteValue::SixtyFourth,
            "32nd" | "thirty-second" | "thirtysecond" | "1/32" => NoteValue::ThirtySecond,
            "16th" | "sixteenth" | "1/16" => NoteValue::Sixteenth,
            "8th" | "eighth" | "1/8" => NoteValue::Eighth,
            "quarter" | "crotchet" | "1/4" => NoteValue::Quarter,
            "half" | "minim" | "1/2" => NoteValue::Half,
            "whole" | "semibreve" | "1/1" | "1" => NoteValue::Whole,
            _ => return None,
        };

        Some(if dotted { plain.dotted() } else { plain })
    }

    /// The dotted form of a plain value; dotted values map to themselves
    pub fn dotted(self) -> Self {
        match self {
            NoteValue::SixtyFourth => NoteValue::SixtyFourthDotted,
            NoteValue::ThirtySecond => NoteValue::ThirtySecondDotted,
            NoteValue::Sixteenth => NoteValue::SixteenthDotted,
            NoteValue::Eighth => NoteValue::EighthDotted,
            NoteValue::Quarter => NoteValue::QuarterDotted,
            NoteValue::Half => NoteValue::HalfDotted,
            NoteValue::Whole => NoteValue::WholeDotted,
            dotted => dotted,
        }
    }

    /// Short display name
    pub fn name(&self) -> &'static str {
        match self {
            NoteValue::SixtyFourth => "1/64",
            NoteValue::SixtyFourthDotted => "1/64.",
            NoteValue::ThirtySecond => "1/32",
            NoteValue::ThirtySecondDotted => "1/32.",
            NoteValue::Sixteenth => "1/16",
            NoteValue::SixteenthDotted => "1/16.",
            NoteValue::Eighth => "1/8",
            NoteValue::EighthDotted => "1/8.",
            NoteValue::Quarter => "1/4",
            NoteValue::QuarterDotted => "1/4.",
            NoteValue::Half => "1/2",
            NoteValue::HalfDotted => "1/2.",
            NoteValue::Whole => "1/1",
            NoteValue::WholeDotted => "1/1.",
        }
    }
}

impl fmt::Display for NoteValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for NoteValue {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NoteValue::from_name(s).ok_or_else(|| SyncError::UnknownNoteValue(s.to_string()))
    }
}

/// Parse an optional denomination where `none` (or an empty string) means no value
pub fn parse_optional(s: &str) -> Result<Option<NoteValue>, SyncError> {
    match s.trim().to_lowercase().as_str() {
        "" | "none" | "-" => Ok(None),
        _ => s.parse().map(Some),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_values() {
        assert_eq!(NoteValue::Quarter.fraction_of_whole(), Ratio::from_integer(1));
        assert_eq!(NoteValue::Eighth.fraction_of_whole(), Ratio::from_integer(2));
        assert_eq!(NoteValue::Whole.fraction_of_whole(), Ratio::new(1, 4));
    }

    #[test]
    fn test_dotted_is_one_and_a_half_times_longer() {
        for value in NoteValue::ALL.iter().filter(|v| !v.is_dotted()) {
            let plain = value.length_in_beats();
            let dotted = value.dotted().length_in_beats();
            assert_eq!(dotted, plain * Ratio::new(3, 2), "{}", value);
        }
    }

    #[test]
    fn test_all_is_sorted_shortest_first() {
        for pair in NoteValue::ALL.windows(2) {
            assert!(pair[0].length_in_beats() < pair[1].length_in_beats());
        }
    }

    #[test]
    fn test_parsing() {
        assert_eq!(NoteValue::from_name("quarter"), Some(NoteValue::Quarter));
        assert_eq!(NoteValue::from_name("1/8"), Some(NoteValue::Eighth));
        assert_eq!(NoteValue::from_name("1/8."), Some(NoteValue::EighthDotted));
        assert_eq!(NoteValue::from_name("Dotted-Half"), Some(NoteValue::HalfDotted));
        assert_eq!(NoteValue::from_name("1/5"), None);
        assert!("triplet".parse::<NoteValue>().is_err());
    }

    #[test]
    fn test_display_round_trips_through_parser() {
        for value in NoteValue::ALL {
            assert_eq!(value.to_string().parse::<NoteValue>(), Ok(value));
        }
    }

    #[test]
    fn test_parse_optional() {
        assert_eq!(parse_optional("none"), Ok(None));
        assert_eq!(parse_optional(""), Ok(None));
        assert_eq!(parse_optional("16th"), Ok(Some(NoteValue::Sixteenth)));
        assert!(parse_optional("bogus").is_err());
    }
}
