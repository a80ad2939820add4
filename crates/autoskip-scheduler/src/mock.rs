//! Recording player for unit tests.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use async_trait::async_trait;
use autoskip_core::{Error, PlaybackState, Player, Result};
use parking_lot::Mutex;

/// A transport call observed by [`MockPlayer`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Call {
    SeekBy(f64),
    SeekTo(f64),
    Play,
    Pause,
    Reset,
}

/// Player that records every transport call and can be told to fail.
#[derive(Debug, Default)]
pub struct MockPlayer {
    state: Mutex<PlaybackState>,
    calls: Mutex<Vec<Call>>,
    failing_seeks: AtomicU32,
    fail_state: AtomicBool,
    /// Suspend inside `state()` so concurrent callers interleave.
    slow_state: AtomicBool,
}

impl MockPlayer {
    pub fn with_state(state: PlaybackState) -> Self {
        let player = Self::default();
        player.set_state(state);
        player
    }

    pub fn set_state(&self, state: PlaybackState) {
        *self.state.lock() = state;
    }

    pub fn fail_next_seeks(&self, count: u32) {
        self.failing_seeks.store(count, Ordering::SeqCst);
    }

    pub fn fail_state_queries(&self, fail: bool) {
        self.fail_state.store(fail, Ordering::SeqCst);
    }

    pub fn slow_state_queries(&self) {
        self.slow_state.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn seeks(&self) -> Vec<f64> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                Call::SeekBy(delta) => Some(*delta),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().push(call);
    }
}

#[async_trait]
impl Player for MockPlayer {
    async fn state(&self) -> Result<PlaybackState> {
        if self.slow_state.load(Ordering::SeqCst) {
            for _ in 0..4 {
                tokio::task::yield_now().await;
            }
        }
        if self.fail_state.load(Ordering::SeqCst) {
            return Err(Error::Player("state query timed out".to_string()));
        }
        Ok(*self.state.lock())
    }

    async fn seek_by(&self, delta_seconds: f64) -> Result<()> {
        let failed = self
            .failing_seeks
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(Error::Player("seek rejected".to_string()));
        }
        self.record(Call::SeekBy(delta_seconds));
        Ok(())
    }

    async fn seek_to(&self, position_seconds: f64) -> Result<()> {
        self.record(Call::SeekTo(position_seconds));
        Ok(())
    }

    async fn play(&self) -> Result<()> {
        self.record(Call::Play);
        self.set_state(PlaybackState::Playing);
        Ok(())
    }

    async fn pause(&self) -> Result<()> {
        self.record(Call::Pause);
        self.set_state(PlaybackState::Paused);
        Ok(())
    }

    async fn reset(&self) -> Result<()> {
        self.record(Call::Reset);
        self.set_state(PlaybackState::Stopped);
        Ok(())
    }
}
