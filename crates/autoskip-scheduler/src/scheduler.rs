//! Auto-skip scheduler.
//!
//! Decides on each position sample whether a forward skip is due and, if the
//! player is actually playing, issues it. The reference point only moves after
//! the player accepts the seek, so a failed skip is retried on the next
//! qualifying sample.
//!
//! Evaluations are single-flight: an async mutex is held across the state query
//! and the seek, so a sample arriving while another is suspended waits its turn
//! and then sees the updated reference point.

#![allow(clippy::unwrap_used)] // Tests use unwrap for brevity

use std::sync::atomic::{AtomicBool, Ordering};

use autoskip_core::{Error, ManualSeekBehavior, PlaybackState, Player, Result, SkipPolicy};
use parking_lot::RwLock;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, error, info, trace, warn};
use uuid::Uuid;

/// Result of the threshold check for one position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gate {
    /// Not enough playback since the last skip.
    Wait { remaining: f64 },
    /// A skip is due.
    Due { elapsed: f64 },
    /// The position is not a finite number.
    Invalid,
}

/// What one call to [`Scheduler::evaluate`] did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    /// Below the threshold (or an unusable position); nothing asked of the player.
    Waiting,
    /// Due, but the player was not playing.
    NotPlaying(PlaybackState),
    /// Seek issued; the reference point moved to `from`.
    Skipped { from: f64, by: f64 },
    /// The player failed; the reference point is unchanged.
    Failed,
    /// The session has ended.
    Closed,
}

impl Outcome {
    pub const fn is_skip(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct SchedulerState {
    last_skip_position: f64,
    skips: u64,
}

/// Periodic auto-skip decision logic for one playback session.
pub struct Scheduler<P> {
    player: P,
    policy: SkipPolicy,
    session: Uuid,
    state: RwLock<SchedulerState>,
    /// Held for the whole of an evaluation.
    in_flight: AsyncMutex<()>,
    closed: AtomicBool,
}

impl<P: Player> Scheduler<P> {
    /// Create a scheduler whose first window starts at position 0.
    pub fn new(player: P, policy: SkipPolicy) -> Self {
        let session = Uuid::new_v4();
        debug!(
            %session,
            "Scheduler created: skip {}s every {}s",
            policy.jump_seconds(),
            policy.interval_seconds()
        );

        Self {
            player,
            policy,
            session,
            state: RwLock::new(SchedulerState::default()),
            in_flight: AsyncMutex::new(()),
            closed: AtomicBool::new(false),
        }
    }

    /// Create a scheduler with an explicit starting reference point.
    ///
    /// The reference must be a finite, non-negative position.
    pub fn with_reference(player: P, policy: SkipPolicy, last_skip_position: f64) -> Result<Self> {
        if !last_skip_position.is_finite() || last_skip_position < 0.0 {
            return Err(Error::InvalidPolicy(format!(
                "starting reference must be a finite position, got {last_skip_position}"
            )));
        }

        let scheduler = Self::new(player, policy);
        scheduler.state.write().last_skip_position = last_skip_position;
        Ok(scheduler)
    }

    pub const fn policy(&self) -> &SkipPolicy {
        &self.policy
    }

    pub const fn player(&self) -> &P {
        &self.player
    }

    /// Identifier of the session this scheduler belongs to.
    pub const fn session(&self) -> Uuid {
        self.session
    }

    /// Position at which the last auto-skip was decided.
    pub fn last_skip_position(&self) -> f64 {
        self.state.read().last_skip_position
    }

    /// Number of skips issued so far.
    pub fn skips(&self) -> u64 {
        self.state.read().skips
    }

    /// Threshold check against the current reference point. Does not touch the player.
    pub fn check(&self, position: f64) -> Gate {
        gate(&self.policy, self.last_skip_position(), position)
    }

    /// Handle one position sample.
    ///
    /// Never fails: player errors are logged and reported as [`Outcome::Failed`].
    pub async fn evaluate(&self, position: f64) -> Outcome {
        if self.is_closed() {
            return Outcome::Closed;
        }
        let _in_flight = self.in_flight.lock().await;
        if self.is_closed() {
            return Outcome::Closed;
        }

        let elapsed = match self.check(position) {
            Gate::Wait { remaining } => {
                trace!(session = %self.session, "At {position:.1}s, next skip in {remaining:.1}s");
                return Outcome::Waiting;
            }
            Gate::Invalid => {
                warn!(session = %self.session, "Ignoring unusable position {position}");
                return Outcome::Waiting;
            }
            Gate::Due { elapsed } => elapsed,
        };

        let state = match self.player.state().await {
            Ok(state) => state,
            Err(e) => {
                self.log_failure(position, "Failed to query playback state", &e);
                return Outcome::Failed;
            }
        };
        if !state.is_playing() {
            debug!(
                session = %self.session,
                "Skip due at {position:.1}s but player is {state:?}"
            );
            return Outcome::NotPlaying(state);
        }

        // The session may have ended while the state query was suspended
        if self.is_closed() {
            debug!(session = %self.session, "Session closed, dropping skip at {position:.1}s");
            return Outcome::Closed;
        }

        let jump = self.policy.jump_seconds();
        if let Err(e) = self.player.seek_by(jump).await {
            self.log_failure(position, "Auto-skip failed", &e);
            return Outcome::Failed;
        }

        {
            let mut state = self.state.write();
            state.last_skip_position = position;
            state.skips += 1;
        }
        info!(
            session = %self.session,
            "Auto-skipped {jump}s at {position:.1}s ({elapsed:.1}s since last skip)"
        );
        Outcome::Skipped { from: position, by: jump }
    }

    /// Transient player failures are retried on the next tick; anything else
    /// will keep failing until someone intervenes.
    fn log_failure(&self, position: f64, what: &str, e: &Error) {
        if e.is_transient() {
            warn!(session = %self.session, "{what} at {position:.1}s: {e}");
        } else {
            error!(session = %self.session, "{what} at {position:.1}s: {e}");
        }
    }

    /// Tell the scheduler the listener seeked to `target`.
    ///
    /// With [`ManualSeekBehavior::Rebase`] the reference point moves forward to
    /// the target; it never moves backward. Returns whether it moved.
    pub async fn note_manual_seek(&self, target: f64) -> bool {
        if self.policy.manual_seek() != ManualSeekBehavior::Rebase
            || !target.is_finite()
            || self.is_closed()
        {
            return false;
        }

        let _in_flight = self.in_flight.lock().await;
        let mut state = self.state.write();
        if target > state.last_skip_position {
            debug!(
                session = %self.session,
                "Reference moved {:.1}s -> {target:.1}s after manual seek",
                state.last_skip_position
            );
            state.last_skip_position = target;
            true
        } else {
            false
        }
    }

    /// End the session. Later evaluations do nothing, and an evaluation that is
    /// suspended right now will not issue its seek.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            debug!(
                session = %self.session,
                "Scheduler closed after {} skip(s)",
                self.skips()
            );
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Threshold decision for `position` given the last reference point.
pub fn gate(policy: &SkipPolicy, last_skip_position: f64, position: f64) -> Gate {
    if !position.is_finite() {
        return Gate::Invalid;
    }

    let elapsed = position - last_skip_position;
    if elapsed < policy.interval_seconds() {
        Gate::Wait {
            remaining: policy.interval_seconds() - elapsed,
        }
    } else {
        Gate::Due { elapsed }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use proptest::prelude::*;

    use super::*;
    use crate::mock::{Call, MockPlayer};

    fn scheduler(state: PlaybackState, policy: SkipPolicy) -> Scheduler<Arc<MockPlayer>> {
        Scheduler::new(Arc::new(MockPlayer::with_state(state)), policy)
    }

    #[tokio::test]
    async fn test_below_threshold_is_noop() {
        let scheduler = scheduler(PlaybackState::Playing, SkipPolicy::short());

        assert_eq!(scheduler.evaluate(19.0).await, Outcome::Waiting);
        assert_eq!(scheduler.evaluate(19.99).await, Outcome::Waiting);
        assert!(scheduler.player().calls().is_empty());
        assert_eq!(scheduler.last_skip_position(), 0.0);
    }

    #[tokio::test]
    async fn test_fires_exactly_at_threshold() {
        let scheduler = Scheduler::with_reference(
            Arc::new(MockPlayer::with_state(PlaybackState::Playing)),
            SkipPolicy::short(),
            40.0,
        )
        .unwrap();

        assert_eq!(
            scheduler.evaluate(60.0).await,
            Outcome::Skipped { from: 60.0, by: 10.0 }
        );
        assert_eq!(scheduler.player().calls(), vec![Call::SeekBy(10.0)]);
        assert_eq!(scheduler.last_skip_position(), 60.0);
        assert_eq!(scheduler.skips(), 1);
    }

    #[tokio::test]
    async fn test_suppressed_while_not_playing() {
        for state in [
            PlaybackState::Paused,
            PlaybackState::Stopped,
            PlaybackState::Buffering,
            PlaybackState::Ready,
        ] {
            let scheduler = scheduler(state, SkipPolicy::short());
            assert_eq!(scheduler.evaluate(35.0).await, Outcome::NotPlaying(state));
            assert!(scheduler.player().seeks().is_empty());
            assert_eq!(scheduler.last_skip_position(), 0.0);
        }
    }

    #[tokio::test]
    async fn test_seek_failure_leaves_reference() {
        let scheduler = scheduler(PlaybackState::Playing, SkipPolicy::short());
        scheduler.player().fail_next_seeks(1);

        assert_eq!(scheduler.evaluate(25.0).await, Outcome::Failed);
        assert_eq!(scheduler.last_skip_position(), 0.0);
        assert_eq!(scheduler.skips(), 0);
    }

    #[tokio::test]
    async fn test_state_query_failure_leaves_reference() {
        let scheduler = scheduler(PlaybackState::Playing, SkipPolicy::short());
        scheduler.player().fail_state_queries(true);

        assert_eq!(scheduler.evaluate(25.0).await, Outcome::Failed);
        assert_eq!(scheduler.last_skip_position(), 0.0);
        assert!(scheduler.player().calls().is_empty());

        scheduler.player().fail_state_queries(false);
        assert!(scheduler.evaluate(25.0).await.is_skip());
    }

    #[tokio::test]
    async fn test_overlapping_evaluations_skip_once() {
        let player = Arc::new(MockPlayer::with_state(PlaybackState::Playing));
        player.slow_state_queries();
        let scheduler = Arc::new(Scheduler::new(player.clone(), SkipPolicy::short()));

        let (first, second) = tokio::join!(scheduler.evaluate(20.0), scheduler.evaluate(25.0));

        assert_eq!(first, Outcome::Skipped { from: 20.0, by: 10.0 });
        assert_eq!(second, Outcome::Waiting);
        assert_eq!(player.seeks(), vec![10.0]);
        assert_eq!(scheduler.last_skip_position(), 20.0);
    }

    #[tokio::test]
    async fn test_overlapping_evaluations_across_tasks() {
        let player = Arc::new(MockPlayer::with_state(PlaybackState::Playing));
        player.slow_state_queries();
        let scheduler = Arc::new(Scheduler::new(player.clone(), SkipPolicy::short()));

        let handles: Vec<_> = [21.0, 22.0, 23.0, 24.0]
            .into_iter()
            .map(|position| {
                let scheduler = scheduler.clone();
                tokio::spawn(async move { scheduler.evaluate(position).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(player.seeks().len(), 1);
        assert_eq!(scheduler.skips(), 1);
    }

    #[tokio::test]
    async fn test_repeated_ticks_do_not_repeat_skip() {
        let scheduler = scheduler(PlaybackState::Playing, SkipPolicy::short());

        assert!(scheduler.evaluate(20.0).await.is_skip());
        for _ in 0..5 {
            assert_eq!(scheduler.evaluate(20.0).await, Outcome::Waiting);
        }
        assert_eq!(scheduler.player().seeks(), vec![10.0]);
    }

    #[tokio::test]
    async fn test_backward_position_waits_for_old_reference() {
        let scheduler = Scheduler::with_reference(
            Arc::new(MockPlayer::with_state(PlaybackState::Playing)),
            SkipPolicy::short(),
            100.0,
        )
        .unwrap();

        assert_eq!(scheduler.evaluate(5.0).await, Outcome::Waiting);
        assert_eq!(scheduler.evaluate(119.0).await, Outcome::Waiting);
        assert!(scheduler.evaluate(120.0).await.is_skip());
    }

    #[tokio::test]
    async fn test_non_finite_position_ignored() {
        let scheduler = scheduler(PlaybackState::Playing, SkipPolicy::short());

        assert_eq!(scheduler.evaluate(f64::NAN).await, Outcome::Waiting);
        assert_eq!(scheduler.evaluate(f64::INFINITY).await, Outcome::Waiting);
        assert!(scheduler.player().calls().is_empty());
    }

    #[tokio::test]
    async fn test_closed_scheduler_does_nothing() {
        let scheduler = scheduler(PlaybackState::Playing, SkipPolicy::short());
        scheduler.close();

        assert_eq!(scheduler.evaluate(500.0).await, Outcome::Closed);
        assert!(scheduler.player().calls().is_empty());
        assert!(!scheduler.note_manual_seek(600.0).await);
    }

    #[tokio::test]
    async fn test_close_during_state_query_drops_skip() {
        let player = Arc::new(MockPlayer::with_state(PlaybackState::Playing));
        player.slow_state_queries();
        let scheduler = Arc::new(Scheduler::new(player.clone(), SkipPolicy::short()));

        let closer = {
            let scheduler = scheduler.clone();
            async move {
                tokio::task::yield_now().await;
                scheduler.close();
            }
        };
        let (outcome, ()) = tokio::join!(scheduler.evaluate(30.0), closer);

        assert_eq!(outcome, Outcome::Closed);
        assert!(player.seeks().is_empty());
        assert_eq!(scheduler.last_skip_position(), 0.0);
    }

    #[tokio::test]
    async fn test_manual_seek_keep_ignores_target() {
        let scheduler = scheduler(PlaybackState::Playing, SkipPolicy::short());

        assert!(!scheduler.note_manual_seek(90.0).await);
        assert_eq!(scheduler.last_skip_position(), 0.0);
        assert!(scheduler.evaluate(90.0).await.is_skip());
    }

    #[tokio::test]
    async fn test_manual_seek_rebase_moves_forward_only() {
        let policy = SkipPolicy::short().with_manual_seek(ManualSeekBehavior::Rebase);
        let scheduler = Scheduler::with_reference(
            Arc::new(MockPlayer::with_state(PlaybackState::Playing)),
            policy,
            50.0,
        )
        .unwrap();

        assert!(scheduler.note_manual_seek(90.0).await);
        assert_eq!(scheduler.last_skip_position(), 90.0);
        assert_eq!(scheduler.evaluate(95.0).await, Outcome::Waiting);

        assert!(!scheduler.note_manual_seek(10.0).await);
        assert_eq!(scheduler.last_skip_position(), 90.0);
    }

    #[test]
    fn test_unusable_starting_reference_rejected() {
        for reference in [f64::NAN, f64::INFINITY, -5.0] {
            let result = Scheduler::with_reference(
                Arc::new(MockPlayer::default()),
                SkipPolicy::short(),
                reference,
            );
            assert!(matches!(result, Err(Error::InvalidPolicy(_))), "{reference}");
        }
    }

    #[test]
    fn test_gate_reports_remaining() {
        let policy = SkipPolicy::long();
        assert_eq!(gate(&policy, 100.0, 200.0), Gate::Wait { remaining: 20.0 });
        assert_eq!(gate(&policy, 100.0, 220.0), Gate::Due { elapsed: 120.0 });
        assert_eq!(gate(&policy, 0.0, f64::NAN), Gate::Invalid);
    }

    proptest! {
        #[test]
        fn prop_gate_waits_below_interval(
            interval in 0.5f64..500.0,
            last in 0.0f64..10_000.0,
            fraction in 0.0f64..0.999,
        ) {
            let policy = SkipPolicy::new(interval, 10.0).unwrap();
            let position = last + interval * fraction;
            prop_assume!(position - last < interval);
            let is_wait = matches!(gate(&policy, last, position), Gate::Wait { .. });
            prop_assert!(is_wait);
        }

        #[test]
        fn prop_gate_due_at_or_above_interval(
            interval in 0.5f64..500.0,
            last in 0.0f64..10_000.0,
            extra in 0.0f64..1_000.0,
        ) {
            let policy = SkipPolicy::new(interval, 10.0).unwrap();
            let position = last + interval + extra;
            prop_assume!(position - last >= interval);
            let is_due = matches!(gate(&policy, last, position), Gate::Due { .. });
            prop_assert!(is_due);
        }

        #[test]
        fn prop_reference_never_decreases(positions in proptest::collection::vec(0.0f64..2_000.0, 1..40)) {
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let scheduler = scheduler(PlaybackState::Playing, SkipPolicy::short());

            runtime.block_on(async {
                let mut previous = scheduler.last_skip_position();
                for position in positions {
                    let outcome = scheduler.evaluate(position).await;
                    let current = scheduler.last_skip_position();
                    prop_assert!(current >= previous);
                    if !outcome.is_skip() {
                        prop_assert_eq!(current, previous);
                    }
                    previous = current;
                }
                Ok(())
            })?;
        }
    }
}
