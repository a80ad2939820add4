//! Notifications delivered by the player.

use super::{PlaybackState, TrackInfo};

/// Remote-control intents (lock screen, headset buttons, car controls).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RemoteCommand {
    Play,
    Pause,
    Stop,
    /// Seek to an absolute position in seconds.
    Seek(f64),
    JumpForward,
    JumpBackward,
}

/// Events emitted by the player, in the order they happened.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    /// Periodic playhead report (in seconds).
    Position(f64),
    /// Playback state changed.
    StateChanged(PlaybackState),
    /// A new track became current, or the queue was cleared.
    TrackChanged(Option<TrackInfo>),
    /// Playback failed.
    Error(String),
    /// A remote-control intent arrived.
    Remote(RemoteCommand),
}

