//! Remote-control and lifecycle passthrough.
//!
//! Remote intents map one-to-one onto player transport calls. Lifecycle
//! notifications are only logged.

pub use autoskip_core::config::DEFAULT_REMOTE_JUMP_SECONDS;
use autoskip_core::{PlaybackState, Player, RemoteCommand, Result, TrackInfo};
use tracing::{error, info, warn};

/// Forwards remote-control intents to the player.
pub struct RemotePassthrough<P> {
    player: P,
    remote_jump: f64,
}

impl<P: Player> RemotePassthrough<P> {
    pub const fn new(player: P, remote_jump: f64) -> Self {
        Self {
            player,
            remote_jump,
        }
    }

    pub const fn remote_jump(&self) -> f64 {
        self.remote_jump
    }

    /// Forward one intent. Failures are logged and reported as `false`.
    pub async fn forward(&self, command: RemoteCommand) -> bool {
        match self.dispatch(command).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Remote {command:?} failed: {e}");
                false
            }
        }
    }

    async fn dispatch(&self, command: RemoteCommand) -> Result<()> {
        info!("Remote {command:?}");
        match command {
            RemoteCommand::Play => self.player.play().await,
            RemoteCommand::Pause => self.player.pause().await,
            RemoteCommand::Stop => self.player.reset().await,
            RemoteCommand::Seek(position) => self.player.seek_to(position).await,
            RemoteCommand::JumpForward => self.player.seek_by(self.remote_jump).await,
            RemoteCommand::JumpBackward => self.player.seek_by(-self.remote_jump).await,
        }
    }
}

pub fn log_state_changed(state: PlaybackState) {
    info!("Playback state changed: {state:?}");
}

pub fn log_track_changed(track: Option<&TrackInfo>) {
    match track {
        Some(track) => info!("Track changed: {track}"),
        None => info!("Track changed: none"),
    }
}

pub fn log_playback_error(message: &str) {
    error!("Playback error: {message}");
}
