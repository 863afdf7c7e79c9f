use std::fmt::Debug;

use async_trait::async_trait;
use derive_more::Display;
use fx_callback::Subscription;
#[cfg(test)]
use mockall::automock;

use crate::embedded;

/// The contract of the platform provided media element.
///
/// The element owns the actual decoding, rendering and buffering of the media.
/// This trait only exposes the control surface and the playback events of the element,
/// allowing the player to drive it without knowing the platform it runs on.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait MediaElement: Debug + Send + Sync {
    /// The current playback time of the element in milliseconds.
    async fn time(&self) -> u64;

    /// The duration of the loaded media in milliseconds.
    ///
    /// The duration is only known once the metadata of the media has been loaded.
    async fn duration(&self) -> Option<u64>;

    /// Check if the playback of the element is currently paused.
    async fn paused(&self) -> bool;

    /// The current volume of the element as a level within `[0, 1]`.
    async fn volume(&self) -> f32;

    /// The current playback rate multiplier of the element.
    async fn playback_rate(&self) -> f32;

    /// Load the media of the given url into the element.
    async fn load(&self, url: &str);

    /// Request the element to start its playback.
    ///
    /// The request is asynchronous and may be refused by the platform.
    async fn play(&self) -> embedded::Result<()>;

    /// Pause the playback of the element.
    async fn pause(&self);

    /// Seek the playback of the element to the given time in milliseconds.
    /// The time is clamped by the element to the duration of the media.
    async fn seek(&self, time: u64);

    /// Set the volume of the element to the given level within `[0, 1]`.
    async fn set_volume(&self, volume: f32);

    /// Set the playback rate multiplier of the element.
    async fn set_playback_rate(&self, rate: f32);

    /// Subscribe to the playback events of the element.
    fn subscribe(&self) -> Subscription<MediaElementEvent>;
}

/// The playback events of a [MediaElement].
///
/// These events are fired by the platform regardless of the trigger source, making them
/// the single source of truth for the mirrored playback state.
#[derive(Debug, Display, Clone, PartialEq)]
pub enum MediaElementEvent {
    /// Invoked when the playback of the element has started
    #[display("Media element playback has started")]
    Play,
    /// Invoked when the playback of the element has been paused
    #[display("Media element playback has been paused")]
    Pause,
    /// Invoked when the playback time of the element is changed
    #[display("Media element time changed to {}", _0)]
    TimeUpdated(u64),
    /// Invoked when the metadata of the media has been loaded
    #[display("Media element metadata loaded with duration {}", _0)]
    MetadataLoaded(u64),
    /// Invoked when the playback reached the natural end of the media
    #[display("Media element playback has ended")]
    Ended,
}
