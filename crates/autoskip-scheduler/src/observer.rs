//! Progress observer: feeds position ticks to the current session's scheduler.

#![allow(clippy::unwrap_used)] // Tests use unwrap for brevity

use std::sync::Arc;

use autoskip_core::{Player, SkipPolicy};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::debug;

use crate::scheduler::{Outcome, Scheduler};

/// Running totals across all sessions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObserverStats {
    pub ticks: u64,
    pub skips: u64,
    pub failed_skips: u64,
    pub sessions: u64,
}

/// Calls [`Scheduler::evaluate`] once per position tick, one at a time.
pub struct ProgressObserver<P> {
    player: P,
    policy: SkipPolicy,
    scheduler: Arc<Scheduler<P>>,
    last_position: Option<f64>,
    stats: ObserverStats,
}

impl<P: Player + Clone> ProgressObserver<P> {
    pub fn new(player: P, policy: SkipPolicy) -> Self {
        let scheduler = Arc::new(Scheduler::new(player.clone(), policy));
        Self {
            player,
            policy,
            scheduler,
            last_position: None,
            stats: ObserverStats {
                sessions: 1,
                ..ObserverStats::default()
            },
        }
    }

    /// Scheduler of the current session.
    pub fn scheduler(&self) -> Arc<Scheduler<P>> {
        Arc::clone(&self.scheduler)
    }

    /// Most recent position reported by the player in this session.
    pub const fn last_position(&self) -> Option<f64> {
        self.last_position
    }

    pub const fn stats(&self) -> ObserverStats {
        self.stats
    }

    /// Forward one tick and wait for the evaluation to finish.
    pub async fn on_position(&mut self, position: f64) -> Outcome {
        self.stats.ticks += 1;
        if position.is_finite() {
            self.last_position = Some(position);
        }

        let outcome = self.scheduler.evaluate(position).await;
        match outcome {
            Outcome::Skipped { from, by } => {
                self.stats.skips += 1;
                self.last_position = Some(from + by);
            }
            Outcome::Failed => self.stats.failed_skips += 1,
            Outcome::Waiting | Outcome::NotPlaying(_) | Outcome::Closed => {}
        }
        outcome
    }

    /// End the current session and start a new one with a fresh reference point.
    pub fn renew(&mut self) {
        self.scheduler.close();
        self.scheduler = Arc::new(Scheduler::new(self.player.clone(), self.policy));
        self.last_position = None;
        self.stats.sessions += 1;
        debug!(session = %self.scheduler.session(), "New auto-skip session");
    }

    /// Close the current session without starting another.
    pub fn close(&self) {
        self.scheduler.close();
    }

    /// Consume a stream of bare position readings until it closes.
    pub async fn run(mut self, mut positions: UnboundedReceiver<f64>) -> ObserverStats {
        while let Some(position) = positions.recv().await {
            self.on_position(position).await;
        }
        self.close();
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use autoskip_core::PlaybackState;
    use tokio::sync::mpsc::unbounded_channel;

    use super::*;
    use crate::mock::MockPlayer;

    #[tokio::test]
    async fn test_ticks_in_order() {
        let player = Arc::new(MockPlayer::with_state(PlaybackState::Playing));
        let mut observer = ProgressObserver::new(player.clone(), SkipPolicy::short());

        for tick in 0..=45 {
            observer.on_position(f64::from(tick)).await;
        }

        // Skips decided at 20 and 40
        assert_eq!(player.seeks(), vec![10.0, 10.0]);
        assert_eq!(observer.scheduler().last_skip_position(), 40.0);
        assert_eq!(
            observer.stats(),
            ObserverStats {
                ticks: 46,
                skips: 2,
                failed_skips: 0,
                sessions: 1,
            }
        );
    }

    #[tokio::test]
    async fn test_failed_skip_retried_on_next_tick() {
        let player = Arc::new(MockPlayer::with_state(PlaybackState::Playing));
        player.fail_next_seeks(1);
        let mut observer = ProgressObserver::new(player.clone(), SkipPolicy::short());

        assert_eq!(observer.on_position(20.0).await, Outcome::Failed);
        assert!(observer.on_position(20.5).await.is_skip());
        assert_eq!(observer.scheduler().last_skip_position(), 20.5);
        assert_eq!(observer.stats().failed_skips, 1);
    }

    #[tokio::test]
    async fn test_renew_closes_previous_session() {
        let player = Arc::new(MockPlayer::with_state(PlaybackState::Playing));
        let mut observer = ProgressObserver::new(player.clone(), SkipPolicy::short());
        observer.on_position(30.0).await;
        let old = observer.scheduler();

        observer.renew();

        assert!(old.is_closed());
        assert_eq!(old.evaluate(90.0).await, Outcome::Closed);
        assert_ne!(old.session(), observer.scheduler().session());
        assert_eq!(observer.scheduler().last_skip_position(), 0.0);
        assert_eq!(observer.last_position(), None);
        assert_eq!(observer.stats().sessions, 2);
    }

    #[tokio::test]
    async fn test_run_until_stream_closes() {
        let player = Arc::new(MockPlayer::with_state(PlaybackState::Playing));
        let observer = ProgressObserver::new(player.clone(), SkipPolicy::long());
        let (tx, rx) = unbounded_channel();

        for position in [0.0, 60.0, 119.0, 120.0, 121.0] {
            tx.send(position).unwrap();
        }
        drop(tx);

        let stats = observer.run(rx).await;
        assert_eq!(stats.ticks, 5);
        assert_eq!(stats.skips, 1);
        assert_eq!(player.seeks(), vec![30.0]);
    }
}
