use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::core::players::PlayerError;

/// The playback rate of a player, limited to the supported rate multipliers.
#[derive(Debug, Display, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlaybackRate {
    /// The normal playback rate of the media.
    #[default]
    #[display("1.0x")]
    Normal,
    #[display("1.5x")]
    OneAndHalf,
    #[display("2.0x")]
    Double,
}

impl PlaybackRate {
    /// The rate multiplier which is applied to the underlying media playback.
    pub fn multiplier(&self) -> f32 {
        match self {
            PlaybackRate::Normal => 1.0,
            PlaybackRate::OneAndHalf => 1.5,
            PlaybackRate::Double => 2.0,
        }
    }

    /// The supported playback rates in ascending order.
    pub fn all() -> [PlaybackRate; 3] {
        [
            PlaybackRate::Normal,
            PlaybackRate::OneAndHalf,
            PlaybackRate::Double,
        ]
    }
}

impl TryFrom<f32> for PlaybackRate {
    type Error = PlayerError;

    fn try_from(value: f32) -> Result<Self, Self::Error> {
        Self::all()
            .into_iter()
            .find(|e| e.multiplier() == value)
            .ok_or(PlayerError::InvalidPlaybackRate(value))
    }
}

/// The volume affordance band of a volume level.
///
/// The band determines which volume icon is shown next to the volume control.
#[derive(Debug, Display, Copy, Clone, PartialEq)]
pub enum VolumeBand {
    /// The volume is muted.
    Muted,
    /// The volume is within `(0, 0.5)`.
    Low,
    /// The volume is within `[0.5, 1]`.
    High,
}

impl From<f32> for VolumeBand {
    fn from(value: f32) -> Self {
        if value <= 0.0 {
            VolumeBand::Muted
        } else if value < 0.5 {
            VolumeBand::Low
        } else {
            VolumeBand::High
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playback_rate_multiplier() {
        assert_eq!(1.0, PlaybackRate::Normal.multiplier());
        assert_eq!(1.5, PlaybackRate::OneAndHalf.multiplier());
        assert_eq!(2.0, PlaybackRate::Double.multiplier());
    }

    #[test]
    fn test_playback_rate_default() {
        assert_eq!(PlaybackRate::Normal, PlaybackRate::default())
    }

    #[test]
    fn test_playback_rate_try_from() {
        assert_eq!(Ok(PlaybackRate::Normal), PlaybackRate::try_from(1.0));
        assert_eq!(Ok(PlaybackRate::OneAndHalf), PlaybackRate::try_from(1.5));
        assert_eq!(Ok(PlaybackRate::Double), PlaybackRate::try_from(2.0));
        assert_eq!(
            Err(PlayerError::InvalidPlaybackRate(0.75)),
            PlaybackRate::try_from(0.75)
        );
    }

    #[test]
    fn test_volume_band_from_level() {
        assert_eq!(VolumeBand::Muted, VolumeBand::from(0.0));
        assert_eq!(VolumeBand::Low, VolumeBand::from(0.1));
        assert_eq!(VolumeBand::Low, VolumeBand::from(0.4));
        assert_eq!(VolumeBand::High, VolumeBand::from(0.5));
        assert_eq!(VolumeBand::High, VolumeBand::from(1.0));
    }

    #[test]
    fn test_volume_band_full_control_range() {
        let expected_bands = [
            VolumeBand::Muted,
            VolumeBand::Low,
            VolumeBand::Low,
            VolumeBand::Low,
            VolumeBand::Low,
            VolumeBand::High,
            VolumeBand::High,
            VolumeBand::High,
            VolumeBand::High,
            VolumeBand::High,
            VolumeBand::High,
        ];

        for (step, expected) in expected_bands.iter().enumerate() {
            let level = step as f32 * 0.1;
            assert_eq!(
                *expected,
                VolumeBand::from(level),
                "expected volume level {} to match band {}",
                level,
                expected
            );
        }
    }
}
