//! Error types for Playdeck Core

use thiserror::Error;

/// Result type alias for player operations
pub type Result<T> = std::result::Result<T, Error>;

/// Player error types
#[derive(Error, Debug)]
pub enum Error {
    // Playlist errors
    #[error("Playlist is empty")]
    EmptyPlaylist,

    #[error("Unknown video: {id}")]
    UnknownVideo { id: String },

    #[error("Duplicate video id in playlist: {id}")]
    DuplicateVideo { id: String },

    // Transport errors
    #[error("Invalid playback rate: {rate}")]
    InvalidPlaybackRate { rate: f64 },

    #[error("Playback rate {rate} is not one of the offered rates")]
    UnsupportedPlaybackRate { rate: f64 },

    #[error("Bookmark {index} out of range ({len} bookmarks)")]
    BookmarkOutOfRange { index: usize, len: usize },

    // Host capability errors
    #[error("Not supported by this host: {0}")]
    Unsupported(&'static str),

    #[error("Media element error: {0}")]
    Media(String),

    #[error("Streaming session failed: {0}")]
    Streaming(String),

    // Artifact errors
    #[error("Invalid video frame: {width}x{height} with {len} bytes")]
    InvalidFrame { width: u32, height: u32, len: usize },

    #[error("Image encoding failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("Recording failed: {0}")]
    Recording(String),

    // Persistence errors
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Error::Storage(msg.into())
    }

    /// Returns true if the host lacks the capability a command needed.
    ///
    /// Commands hitting this degrade to a no-op instead of failing.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Error::Unsupported(_))
    }

    /// Returns a stable error code for hosts
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::EmptyPlaylist => "EMPTY_PLAYLIST",
            Error::UnknownVideo { .. } => "UNKNOWN_VIDEO",
            Error::DuplicateVideo { .. } => "DUPLICATE_VIDEO",
            Error::InvalidPlaybackRate { .. } => "INVALID_RATE",
            Error::UnsupportedPlaybackRate { .. } => "UNSUPPORTED_RATE",
            Error::BookmarkOutOfRange { .. } => "BOOKMARK_RANGE",
            Error::Unsupported(_) => "UNSUPPORTED",
            Error::Media(_) => "MEDIA",
            Error::Streaming(_) => "STREAMING",
            Error::InvalidFrame { .. } => "INVALID_FRAME",
            Error::Image(_) => "IMAGE",
            Error::Recording(_) => "RECORDING",
            Error::Storage(_) => "STORAGE",
            Error::Serialization(_) => "SERIALIZATION",
            Error::InvalidConfig(_) => "INVALID_CONFIG",
            Error::Io(_) => "IO",
        }
    }
}
