//! Clock-driven playback engine.
//!
//! Nothing is decoded: the playhead is a number that advances with the tokio
//! clock while the engine is playing.

#![allow(clippy::unwrap_used)] // Tests use unwrap for brevity

use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use autoskip_core::{Error, PlaybackState, Player, PlayerEvent, RemoteCommand, Result, TrackInfo};
use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace, warn};

/// Default interval between position notifications.
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_millis(500);

/// Engine settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// How often a position notification is emitted while playing.
    pub progress_interval: Duration,
    /// Playback seconds per wall-clock second.
    pub speed: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            speed: 1.0,
        }
    }
}

/// Mutable engine state shared with the ticker task.
#[derive(Debug)]
struct EngineState {
    state: PlaybackState,
    position: f64,
    track: Option<TrackInfo>,
    /// Dropped on shutdown so subscribers see the stream end.
    events: Option<UnboundedSender<PlayerEvent>>,
    /// Number of upcoming seek requests to reject.
    failing_seeks: u32,
    closed: bool,
}

impl EngineState {
    fn emit(&self, event: PlayerEvent) {
        if let Some(tx) = &self.events {
            // Receiver gone means nobody is listening any more
            let _ = tx.send(event);
        }
    }

    fn set_state(&mut self, new_state: PlaybackState) {
        let old_state = std::mem::replace(&mut self.state, new_state);
        if old_state != new_state {
            debug!("State changed: {:?} -> {:?}", old_state, new_state);
            self.emit(PlayerEvent::StateChanged(new_state));
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            Err(Error::EngineClosed)
        } else {
            Ok(())
        }
    }

    fn duration(&self) -> Result<f64> {
        self.ensure_open()?;
        self.track
            .as_ref()
            .map(|track| track.duration_seconds)
            .ok_or(Error::NoTrackLoaded)
    }

    fn advance(&mut self, seconds: f64) {
        if self.state != PlaybackState::Playing {
            return;
        }
        let Some(duration) = self.track.as_ref().map(|t| t.duration_seconds) else {
            return;
        };

        self.position = (self.position + seconds).min(duration);
        trace!("Position advanced to {:.2}", self.position);
        self.emit(PlayerEvent::Position(self.position));

        if self.position >= duration {
            info!("Playback finished");
            self.set_state(PlaybackState::Ended);
        }
    }
}

/// In-process playback engine driven by the tokio clock.
pub struct SimulatedPlayer {
    shared: Arc<RwLock<EngineState>>,
    event_rx: Mutex<Option<UnboundedReceiver<PlayerEvent>>>,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

impl SimulatedPlayer {
    /// Create a new engine and start its ticker.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(config: EngineConfig) -> Result<Self> {
        if config.progress_interval.is_zero() {
            return Err(Error::Config(
                "progress interval must be greater than zero".to_string(),
            ));
        }
        if !config.speed.is_finite() || config.speed <= 0.0 {
            return Err(Error::Config(format!(
                "playback speed must be a positive number, got {}",
                config.speed
            )));
        }
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| Error::Player(format!("Failed to start engine ticker: {e}")))?;

        let (event_tx, event_rx) = unbounded_channel();
        let shared = Arc::new(RwLock::new(EngineState {
            state: PlaybackState::Stopped,
            position: 0.0,
            track: None,
            events: Some(event_tx),
            failing_seeks: 0,
            closed: false,
        }));

        let ticker = runtime.spawn(run_ticker(Arc::downgrade(&shared), config));

        info!(
            "Simulated engine started: progress every {:?}, speed {}x",
            config.progress_interval, config.speed
        );

        Ok(Self {
            shared,
            event_rx: Mutex::new(Some(event_rx)),
            ticker: Mutex::new(Some(ticker)),
        })
    }

    /// Take the event stream. Only the first caller gets it.
    pub fn take_events(&self) -> Option<UnboundedReceiver<PlayerEvent>> {
        self.event_rx.lock().take()
    }

    /// Load a track, replacing the current one. The engine is left ready but not playing.
    pub fn load(&self, track: TrackInfo) -> Result<()> {
        let mut shared = self.shared.write();
        shared.ensure_open()?;

        info!("Loading track: {track} ({})", track.format_duration());
        shared.position = 0.0;
        shared.track = Some(track.clone());
        shared.emit(PlayerEvent::TrackChanged(Some(track)));
        shared.set_state(PlaybackState::Ready);
        Ok(())
    }

    /// Get the current position in seconds.
    pub fn position(&self) -> f64 {
        self.shared.read().position
    }

    /// Get the loaded track.
    pub fn track(&self) -> Option<TrackInfo> {
        self.shared.read().track.clone()
    }

    /// Get the current playback state without going through the async trait.
    pub fn current_state(&self) -> PlaybackState {
        self.shared.read().state
    }

    /// Deliver a remote-control intent as if it came from the platform.
    pub fn inject_remote(&self, command: RemoteCommand) {
        debug!("Remote intent: {command:?}");
        self.shared.read().emit(PlayerEvent::Remote(command));
    }

    /// Report a playback error to subscribers.
    pub fn inject_error(&self, message: impl Into<String>) {
        self.shared.read().emit(PlayerEvent::Error(message.into()));
    }

    /// Reject the next `count` seek requests.
    pub fn fail_next_seeks(&self, count: u32) {
        self.shared.write().failing_seeks = count;
    }

    /// Shut the engine down. Further commands fail and the event stream ends.
    pub fn shutdown(&self) {
        {
            let mut shared = self.shared.write();
            if shared.closed {
                return;
            }
            shared.closed = true;
            shared.events = None;
        }
        if let Some(ticker) = self.ticker.lock().take() {
            ticker.abort();
        }
        info!("Simulated engine shut down");
    }
}

impl Drop for SimulatedPlayer {
    fn drop(&mut self) {
        if let Some(ticker) = self.ticker.lock().take() {
            ticker.abort();
        }
    }
}

async fn run_ticker(shared: Weak<RwLock<EngineState>>, config: EngineConfig) {
    let mut interval = tokio::time::interval(config.progress_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let step = config.progress_interval.as_secs_f64() * config.speed;

    // First tick completes immediately
    interval.tick().await;

    loop {
        interval.tick().await;

        let Some(engine) = shared.upgrade() else {
            debug!("Engine dropped, ticker exiting");
            break;
        };
        let mut engine = engine.write();
        if engine.closed {
            break;
        }
        engine.advance(step);
    }
}

#[async_trait]
impl Player for SimulatedPlayer {
    async fn state(&self) -> Result<PlaybackState> {
        let shared = self.shared.read();
        shared.ensure_open()?;
        Ok(shared.state)
    }

    async fn seek_by(&self, delta_seconds: f64) -> Result<()> {
        let target = {
            let mut shared = self.shared.write();
            shared.duration()?;
            if shared.failing_seeks > 0 {
                shared.failing_seeks -= 1;
                warn!("Rejecting seek by {delta_seconds:+.1}s");
                return Err(Error::Player("seek rejected by engine".to_string()));
            }
            shared.position + delta_seconds
        };
        self.seek_to(target).await
    }

    async fn seek_to(&self, position_seconds: f64) -> Result<()> {
        if !position_seconds.is_finite() {
            return Err(Error::Player(format!(
                "invalid seek target: {position_seconds}"
            )));
        }

        let mut shared = self.shared.write();
        let duration = shared.duration()?;
        let target = position_seconds.clamp(0.0, duration);
        debug!("Seeking to {:.2} seconds", target);
        shared.position = target;

        if shared.state == PlaybackState::Ended && target < duration {
            shared.set_state(PlaybackState::Paused);
        }
        Ok(())
    }

    async fn play(&self) -> Result<()> {
        let mut shared = self.shared.write();
        let duration = shared.duration()?;
        if shared.state == PlaybackState::Ended || shared.position >= duration {
            shared.position = 0.0;
        }
        shared.set_state(PlaybackState::Playing);
        Ok(())
    }

    async fn pause(&self) -> Result<()> {
        let mut shared = self.shared.write();
        shared.duration()?;
        if shared.state != PlaybackState::Ended {
            shared.set_state(PlaybackState::Paused);
        }
        Ok(())
    }

    async fn reset(&self) -> Result<()> {
        let mut shared = self.shared.write();
        shared.ensure_open()?;
        shared.position = 0.0;
        if shared.track.take().is_some() {
            shared.emit(PlayerEvent::TrackChanged(None));
        }
        shared.set_state(PlaybackState::Stopped);
        Ok(())
    }
}
