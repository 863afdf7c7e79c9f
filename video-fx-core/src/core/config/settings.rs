use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::core::players::PlaybackRate;

const DEFAULT_FULLSCREEN: fn() -> bool = || false;
const DEFAULT_PLAYBACK_RATE: fn() -> PlaybackRate = PlaybackRate::default;

/// The user settings of the video player.
#[derive(Debug, Default, Display, Clone, Serialize, Deserialize, PartialEq)]
#[display("playback: {}", playback)]
pub struct PlayerSettings {
    /// The playback settings of the player
    #[serde(default)]
    pub playback: PlaybackSettings,
}

/// The preferences for the video playbacks.
#[derive(Debug, Display, Clone, Serialize, Deserialize, PartialEq)]
#[display("fullscreen: {}, playback_rate: {}", fullscreen, playback_rate)]
pub struct PlaybackSettings {
    /// Indicates if the playback should always start in fullscreen mode
    #[serde(default = "DEFAULT_FULLSCREEN")]
    pub fullscreen: bool,
    /// The playback rate which is applied at the start of each playback
    #[serde(default = "DEFAULT_PLAYBACK_RATE")]
    pub playback_rate: PlaybackRate,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            fullscreen: DEFAULT_FULLSCREEN(),
            playback_rate: DEFAULT_PLAYBACK_RATE(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playback_settings_default() {
        let expected_result = PlaybackSettings {
            fullscreen: false,
            playback_rate: PlaybackRate::Normal,
        };

        let result = PlaybackSettings::default();

        assert_eq!(expected_result, result)
    }

    #[test]
    fn test_player_settings_deserialize_missing_fields() {
        let result: PlayerSettings =
            serde_json::from_str("{}").expect("expected the settings to have been parsed");

        assert_eq!(PlayerSettings::default(), result)
    }
}
