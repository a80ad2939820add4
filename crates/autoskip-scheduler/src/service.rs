//! Auto-skip service connecting the player's event stream to the scheduler.
//!
//! Events are handled strictly one at a time: a position tick is evaluated to
//! completion before the next event is taken off the stream.

#![allow(clippy::unwrap_used)] // Tests use unwrap for brevity

use std::future::Future;
use std::sync::Arc;

use autoskip_core::{
    AutoSkipConfig, PlaybackState, Player, PlayerEvent, RemoteCommand, Result, SkipPolicy,
};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::observer::{ObserverStats, ProgressObserver};
use crate::passthrough::{self, RemotePassthrough};
use crate::scheduler::Scheduler;

/// Event loop owning the auto-skip session for one player.
pub struct AutoSkipService<P> {
    observer: ProgressObserver<Arc<P>>,
    passthrough: RemotePassthrough<Arc<P>>,
    stop_when_ended: bool,
    finished: bool,
}

impl<P: Player + 'static> AutoSkipService<P> {
    pub fn new(player: Arc<P>, policy: SkipPolicy, remote_jump: f64) -> Self {
        info!(
            "Auto-skip enabled: {}s forward every {}s of playback",
            policy.jump_seconds(),
            policy.interval_seconds()
        );
        Self {
            observer: ProgressObserver::new(Arc::clone(&player), policy),
            passthrough: RemotePassthrough::new(player, remote_jump),
            stop_when_ended: false,
            finished: false,
        }
    }

    /// Stop the event loop once the player reports the track has ended.
    #[must_use]
    pub fn stop_when_ended(mut self) -> Self {
        self.stop_when_ended = true;
        self
    }

    /// Build a service from validated configuration.
    pub fn from_config(player: Arc<P>, config: &AutoSkipConfig) -> Result<Self> {
        let policy = config.policy()?;
        let remote_jump = config.remote_jump()?;
        Ok(Self::new(player, policy, remote_jump))
    }

    /// Scheduler of the current session.
    pub fn scheduler(&self) -> Arc<Scheduler<Arc<P>>> {
        self.observer.scheduler()
    }

    pub const fn stats(&self) -> ObserverStats {
        self.observer.stats()
    }

    /// Handle one player event.
    pub async fn handle_event(&mut self, event: PlayerEvent) {
        match event {
            PlayerEvent::Position(position) => {
                self.observer.on_position(position).await;
            }
            PlayerEvent::StateChanged(state) => {
                passthrough::log_state_changed(state);
                if state == PlaybackState::Ended {
                    // A replay starts over at 0 and gets a fresh window
                    self.observer.renew();
                    self.finished = self.stop_when_ended;
                }
            }
            PlayerEvent::TrackChanged(track) => {
                passthrough::log_track_changed(track.as_ref());
                self.observer.renew();
            }
            PlayerEvent::Error(message) => passthrough::log_playback_error(&message),
            PlayerEvent::Remote(command) => self.handle_remote(command).await,
        }
    }

    async fn handle_remote(&mut self, command: RemoteCommand) {
        let jump = self.passthrough.remote_jump();
        let target = match command {
            RemoteCommand::Seek(position) => Some(position),
            RemoteCommand::JumpForward => self.observer.last_position().map(|p| p + jump),
            RemoteCommand::JumpBackward => {
                self.observer.last_position().map(|p| (p - jump).max(0.0))
            }
            RemoteCommand::Play | RemoteCommand::Pause | RemoteCommand::Stop => None,
        };

        if !self.passthrough.forward(command).await {
            return;
        }

        if matches!(command, RemoteCommand::Stop) {
            self.observer.renew();
        } else if let Some(target) = target {
            self.observer.scheduler().note_manual_seek(target).await;
        }
    }

    /// Process events until the stream closes.
    pub async fn run(self, events: UnboundedReceiver<PlayerEvent>) -> ObserverStats {
        self.run_until(events, std::future::pending()).await
    }

    /// Process events until the stream closes or `shutdown` completes, or the
    /// track ends when [`Self::stop_when_ended`] was set.
    ///
    /// An event already being handled is finished before shutdown takes effect.
    pub async fn run_until<F>(
        mut self,
        mut events: UnboundedReceiver<PlayerEvent>,
        shutdown: F,
    ) -> ObserverStats
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        info!("Auto-skip service started");

        loop {
            tokio::select! {
                biased;
                () = &mut shutdown => {
                    info!("Shutdown requested");
                    break;
                }
                event = events.recv() => match event {
                    Some(event) => self.handle_event(event).await,
                    None => {
                        debug!("Player event stream closed");
                        break;
                    }
                },
            }

            if self.finished {
                info!("Track ended");
                break;
            }
        }

        self.observer.close();
        let stats = self.observer.stats();
        info!(
            "Auto-skip service stopped: {} tick(s), {} skip(s), {} failed, {} session(s)",
            stats.ticks, stats.skips, stats.failed_skips, stats.sessions
        );
        stats
    }

    /// Run the service on its own task.
    pub fn spawn(self, events: UnboundedReceiver<PlayerEvent>) -> JoinHandle<ObserverStats> {
        tokio::spawn(self.run(events))
    }
}
