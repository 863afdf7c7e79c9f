use thiserror::Error;

/// The result type for player actions.
pub type Result<T> = std::result::Result<T, PlayerError>;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum PlayerError {
    /// The given playback rate is not one of the supported rates.
    #[error("playback rate {0} is not supported")]
    InvalidPlaybackRate(f32),
    /// The given player id is unknown to the manager.
    #[error("player {0} is unknown")]
    UnknownPlayer(String),
    /// A player with the same id has already been registered.
    #[error("player {0} has already been registered")]
    DuplicatePlayer(String),
}
