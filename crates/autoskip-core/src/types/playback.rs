//! Playback state reported by the player.

use serde::{Deserialize, Serialize};

/// Snapshot of what the player is doing right now.
///
/// Always queried fresh from the player; it can change between position ticks.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    /// Nothing loaded, or the queue was reset.
    #[default]
    Stopped,
    /// A track is loaded and ready to start.
    Ready,
    Playing,
    Paused,
    Buffering,
    /// The loaded track played to its end.
    Ended,
}

impl PlaybackState {
    pub const fn is_playing(self) -> bool {
        matches!(self, Self::Playing)
    }
}
