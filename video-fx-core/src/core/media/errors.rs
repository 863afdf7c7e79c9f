use thiserror::Error;

/// The result type for media actions.
pub type Result<T> = std::result::Result<T, MediaError>;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum MediaError {
    /// The auto-resume data couldn't be loaded from the storage.
    #[error("failed to load auto-resume data, {0}")]
    AutoResumeLoadingFailed(String),
}
