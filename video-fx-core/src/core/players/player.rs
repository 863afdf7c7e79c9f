use std::fmt::{Debug, Display};

use async_trait::async_trait;
use derive_more::Display;
use fx_callback::Callback;

use crate::core::players::{PlayRequest, PlaybackRate};

/// A trait representing a player for media playback.
///
/// A player is bound to at most one [PlayRequest] at a time and mirrors the state of the
/// underlying playback into [PlayerEvent]s for its subscribers.
#[async_trait]
pub trait Player: Debug + Display + Callback<PlayerEvent> + Send + Sync {
    /// Get the unique identifier of the player.
    fn id(&self) -> &str;

    /// Get the name of the player.
    fn name(&self) -> &str;

    /// Get the description of the player.
    fn description(&self) -> &str;

    /// Get the current state of the player.
    async fn state(&self) -> PlayerState;

    /// Get the current play request of the player, if one is bound.
    async fn request(&self) -> Option<PlayRequest>;

    /// Start the playback of the given request.
    /// Any previously bound request is superseded by the new one.
    async fn play(&self, request: PlayRequest);

    /// Pause the current playback.
    async fn pause(&self);

    /// Resume the current playback.
    async fn resume(&self);

    /// Toggle between playing and paused based on the actual playback state of the
    /// underlying media, not the last known mirrored state.
    async fn toggle_playback(&self);

    /// Seek the playback to the given time in milliseconds.
    async fn seek(&self, time: u64);

    /// Stop the current playback.
    async fn stop(&self);

    /// Get the current volume of the player as a level within `[0, 1]`.
    async fn volume(&self) -> f32;

    /// Set the volume of the player to the given level within `[0, 1]`.
    async fn set_volume(&self, volume: f32);

    /// Get the current playback rate of the player.
    async fn playback_rate(&self) -> PlaybackRate;

    /// Set the playback rate of the player.
    async fn set_playback_rate(&self, rate: PlaybackRate);
}

impl PartialEq for dyn Player {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

/// An enumeration representing the possible states of a player.
#[repr(i32)]
#[derive(Debug, Display, Clone, PartialEq)]
pub enum PlayerState {
    Unknown = -1,
    Ready = 0,
    Loading = 1,
    Buffering = 2,
    Playing = 3,
    Paused = 4,
    /// The playback has been stopped on request.
    Stopped = 5,
    /// The playback reached the natural end of the media.
    Completed = 6,
    Error = 7,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self::Unknown
    }
}

/// The events of an individual [Player].
#[derive(Debug, Display, Clone, PartialEq)]
pub enum PlayerEvent {
    /// Invoked when the duration of the playback is changed
    #[display("Player duration changed to {}", _0)]
    DurationChanged(u64),
    /// Invoked when the time of the playback is changed
    #[display("Player time changed to {}", _0)]
    TimeChanged(u64),
    /// Invoked when the state of the player is changed
    #[display("Player state changed to {}", _0)]
    StateChanged(PlayerState),
    /// Invoked when the volume of the player is changed
    #[display("Player volume changed to {}", _0)]
    VolumeChanged(f32),
    /// Invoked when the playback rate of the player is changed
    #[display("Player playback rate changed to {}", _0)]
    RateChanged(PlaybackRate),
    /// Invoked when the fullscreen presentation of the player is changed
    #[display("Player fullscreen state changed to {}", _0)]
    FullscreenChanged(bool),
}
