use derive_more::Display;

/// The application events of the video player library.
///
/// The `Event` enum represents the events that occur during the lifecycle of a playback
/// session. It provides a mechanism for decoupled components to react to playback changes,
/// such as a new item being started, the active playback being stopped, or the player
/// being closed altogether.
#[derive(Debug, Clone, Display, PartialEq)]
pub enum Event {
    /// Invoked when the player playback has started for a new media item
    #[display("Player has started playback of {}", _0.title)]
    PlayerStarted(PlayerStartedEvent),
    /// Invoked when the player playback has stopped
    #[display("Player has been stopped with last known timestamp {:?}", _0.time)]
    PlayerStopped(PlayerStoppedEvent),
    /// Invoked when the player should be closed
    #[display("Closing player")]
    ClosePlayer,
}

/// The event information of a playback that has been started.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerStartedEvent {
    /// The url of the media item that is being played.
    pub url: String,
    /// The title of the media item that is being played.
    pub title: String,
    /// The thumbnail of the media item, if available.
    pub thumbnail: Option<String>,
}

/// The event information of a playback that has been stopped.
/// It contains the last known playback information of the player before it stopped.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerStoppedEvent {
    /// The url of the media item that was being played.
    pub url: String,
    /// The title of the media item that was being played, if known.
    pub title: Option<String>,
    /// The last known time of the playback in milliseconds, if known.
    pub time: Option<u64>,
    /// The known duration of the playback in milliseconds, if known.
    pub duration: Option<u64>,
}

impl PlayerStoppedEvent {
    /// The video playback url that was being played.
    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// The last known video time of the player.
    pub fn time(&self) -> Option<&u64> {
        self.time.as_ref()
    }

    /// The known video duration of the played item.
    pub fn duration(&self) -> Option<&u64> {
        self.duration.as_ref()
    }
}
