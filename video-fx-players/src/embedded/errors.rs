use thiserror::Error;

/// The result type for media element actions.
pub type Result<T> = std::result::Result<T, ElementError>;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ElementError {
    /// The platform refused to start the playback, e.g. due to an autoplay policy.
    #[error("the platform blocked the playback, {0}")]
    PlaybackBlocked(String),
}
