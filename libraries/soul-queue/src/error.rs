//! Error types for the playback-queue engine

use thiserror::Error;

/// Playback errors surfaced to callers of the engine
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// The backend refused audible playback (autoplay policy)
    ///
    /// Recoverable: the engine has already reverted its play intent.
    #[error("Playback blocked: {0}")]
    PlaybackBlocked(String),

    /// The backend cannot decode the media behind a handle
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Queue is empty
    #[error("Queue is empty")]
    QueueEmpty,

    /// Index out of bounds
    #[error("Index out of bounds: {0}")]
    IndexOutOfBounds(usize),

    /// Any other backend failure
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Errors reported by a [`PlaybackBackend`](crate::PlaybackBackend) or one of its handles
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// Playback not allowed without user interaction
    #[error("autoplay blocked: {0}")]
    Blocked(String),

    /// Media cannot be decoded
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The play request was interrupted by a pause or teardown
    #[error("play request aborted")]
    Aborted,

    /// Generic failure
    #[error("{0}")]
    Failed(String),
}

impl From<BackendError> for PlaybackError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Blocked(msg) => PlaybackError::PlaybackBlocked(msg),
            BackendError::UnsupportedFormat(msg) => PlaybackError::UnsupportedFormat(msg),
            other => PlaybackError::Backend(other.to_string()),
        }
    }
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
