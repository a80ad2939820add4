//! Auto-skip policy types.

#![allow(clippy::unwrap_used)] // Tests use unwrap for brevity

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// How the scheduler reacts when the listener seeks manually.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ManualSeekBehavior {
    /// Leave the reference point where the last auto-skip put it.
    #[default]
    Keep,
    /// Move the reference point forward to the seek target.
    Rebase,
}

/// Cadence of automatic forward skips.
///
/// Construct through [`SkipPolicy::new`], which rejects values that would make
/// the scheduler fire on every tick or never at all.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkipPolicy {
    interval_seconds: f64,
    jump_seconds: f64,
    manual_seek: ManualSeekBehavior,
}

impl SkipPolicy {
    /// Create a policy, validating both values.
    pub fn new(interval_seconds: f64, jump_seconds: f64) -> Result<Self> {
        if !interval_seconds.is_finite() || interval_seconds <= 0.0 {
            return Err(Error::InvalidPolicy(format!(
                "interval_seconds must be a positive number, got {interval_seconds}"
            )));
        }
        if !jump_seconds.is_finite() || jump_seconds <= 0.0 {
            return Err(Error::InvalidPolicy(format!(
                "jump_seconds must be a positive number, got {jump_seconds}"
            )));
        }

        Ok(Self {
            interval_seconds,
            jump_seconds,
            manual_seek: ManualSeekBehavior::Keep,
        })
    }

    /// Skip 10 seconds after every 20 seconds of playback.
    pub const fn short() -> Self {
        Self {
            interval_seconds: 20.0,
            jump_seconds: 10.0,
            manual_seek: ManualSeekBehavior::Keep,
        }
    }

    /// Skip 30 seconds after every 2 minutes of playback.
    pub const fn long() -> Self {
        Self {
            interval_seconds: 120.0,
            jump_seconds: 30.0,
            manual_seek: ManualSeekBehavior::Keep,
        }
    }

    /// Set how manual seeks affect the reference point.
    #[must_use]
    pub const fn with_manual_seek(mut self, manual_seek: ManualSeekBehavior) -> Self {
        self.manual_seek = manual_seek;
        self
    }

    /// Playback seconds that must elapse before a skip may fire.
    pub const fn interval_seconds(&self) -> f64 {
        self.interval_seconds
    }

    /// Magnitude of each auto-skip in seconds.
    pub const fn jump_seconds(&self) -> f64 {
        self.jump_seconds
    }

    pub const fn manual_seek(&self) -> ManualSeekBehavior {
        self.manual_seek
    }
}

impl Default for SkipPolicy {
    fn default() -> Self {
        Self::short()
    }
}
