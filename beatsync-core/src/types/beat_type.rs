//! Accent markers carried with every beat and bar notification

/// Accent type attached to each notification, fixed per scheduler
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum BeatType {
    /// Lands on the pulse
    #[default]
    OnBeat,
    /// Lands between pulses (syncopated)
    OffBeat,
    /// First beat of a bar
    DownBeat,
    /// Last beat leading into a bar
    UpBeat,
}

impl BeatType {
    /// Parse beat type from string (case-insensitive)
    pub fn from_name(s: &str) -> Option<BeatType> {
        match s.to_lowercase().as_str() {
            "on" | "onbeat" | "on-beat" => Some(BeatType::OnBeat),
            "off" | "offbeat" | "off-beat" => Some(BeatType::OffBeat),
            "down" | "downbeat" | "down-beat" => Some(BeatType::DownBeat),
            "up" | "upbeat" | "up-beat" => Some(BeatType::UpBeat),
            _ => None,
        }
    }

    /// Get display name
    pub fn name(&self) -> &'static str {
        match self {
            BeatType::OnBeat => "on-beat",
            BeatType::OffBeat => "off-beat",
            BeatType::DownBeat => "down-beat",
            BeatType::UpBeat => "up-beat",
        }
    }
}
