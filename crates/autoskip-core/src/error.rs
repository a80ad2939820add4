//! Error types for Autoskip.

use thiserror::Error;

/// Result type alias using Autoskip's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Autoskip.
#[derive(Error, Debug)]
pub enum Error {
    // Player errors
    #[error("Player error: {0}")]
    Player(String),

    #[error("No track loaded")]
    NoTrackLoaded,

    #[error("Playback engine has shut down")]
    EngineClosed,

    // Configuration errors
    #[error("Invalid skip policy: {0}")]
    InvalidPolicy(String),

    #[error("Configuration error: {0}")]
    Config(String),

    // Serialization errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Returns true if this error came from the player and a later attempt may succeed.
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Player(_) | Self::NoTrackLoaded | Self::EngineClosed
        )
    }
}
