//! Error types for tempo-player
//!
//! Module-specific error types using thiserror for clear error propagation.

use thiserror::Error;

/// Main error type for tempo-player
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// The engine rejected a track (missing file, unsupported format)
    #[error("Failed to load {uri}: {reason}")]
    Load { uri: String, reason: String },

    /// HTTP server errors
    #[error("HTTP server error: {0}")]
    Http(String),

    /// Coordinator task is gone (shut down or panicked)
    #[error("Playback coordinator unavailable: {0}")]
    CoordinatorClosed(String),

    /// Media library scan errors
    #[error("Library error: {0}")]
    Library(String),

    /// Errors from tempo-common
    #[error(transparent)]
    Common(#[from] tempo_common::Error),
}

impl Error {
    /// Shorthand for a load rejection
    pub fn load(uri: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Load {
            uri: uri.into(),
            reason: reason.into(),
        }
    }
}

/// Convenience Result type using tempo-player Error
pub type Result<T> = std::result::Result<T, Error>;
