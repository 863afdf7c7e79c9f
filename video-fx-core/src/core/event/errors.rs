use thiserror::Error;

/// The result type for event publisher actions.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum Error {
    /// The event publisher has been closed and no longer accepts subscriptions or events.
    #[error("the event publisher has been closed")]
    Closed,
}
