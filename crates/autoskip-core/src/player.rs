//! The playback engine collaborator.

use async_trait::async_trait;

use crate::{PlaybackState, Result};

/// Transport operations of a playback engine.
///
/// Notifications travel separately as a stream of [`crate::PlayerEvent`]s so
/// that one consumer can process them strictly in order.
#[async_trait]
pub trait Player: Send + Sync {
    /// Current playback state.
    async fn state(&self) -> Result<PlaybackState>;
    /// Relative seek in seconds; negative values seek backward.
    async fn seek_by(&self, delta_seconds: f64) -> Result<()>;
    /// Absolute seek in seconds.
    async fn seek_to(&self, position_seconds: f64) -> Result<()>;
    async fn play(&self) -> Result<()>;
    async fn pause(&self) -> Result<()>;
    /// Stop playback and clear the loaded track.
    async fn reset(&self) -> Result<()>;
}

#[async_trait]
impl<P: Player + ?Sized> Player for std::sync::Arc<P> {
    async fn state(&self) -> Result<PlaybackState> {
        (**self).state().await
    }

    async fn seek_by(&self, delta_seconds: f64) -> Result<()> {
        (**self).seek_by(delta_seconds).await
    }

    async fn seek_to(&self, position_seconds: f64) -> Result<()> {
        (**self).seek_to(position_seconds).await
    }

    async fn play(&self) -> Result<()> {
        (**self).play().await
    }

    async fn pause(&self) -> Result<()> {
        (**self).pause().await
    }

    async fn reset(&self) -> Result<()> {
        (**self).reset().await
    }
}
