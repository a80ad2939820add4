//! Configuration loading.
//!
//! Values come from a TOML file; anything the file leaves out falls back to the
//! defaults below. Validation happens when the policy is derived so that bad
//! values fail at startup rather than on the first tick.

#![allow(clippy::unwrap_used)] // Tests use unwrap for brevity

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::{Error, ManualSeekBehavior, Result, SkipPolicy};

/// Name of the configuration file inside the platform config directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Default size of a remote jump-forward/jump-backward in seconds.
pub const DEFAULT_REMOTE_JUMP_SECONDS: f64 = 30.0;
const DEFAULT_PROGRESS_INTERVAL_MS: u64 = 500;

/// User-facing configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AutoSkipConfig {
    /// Seconds of playback before an auto-skip may fire.
    pub interval_seconds: f64,
    /// Seconds skipped by each auto-skip.
    pub jump_seconds: f64,
    /// Seconds moved by remote jump-forward/jump-backward intents.
    pub remote_jump_seconds: f64,
    /// How often the player reports its position.
    pub progress_interval_ms: u64,
    pub manual_seek: ManualSeekBehavior,
}

impl Default for AutoSkipConfig {
    fn default() -> Self {
        let policy = SkipPolicy::default();
        Self {
            interval_seconds: policy.interval_seconds(),
            jump_seconds: policy.jump_seconds(),
            remote_jump_seconds: DEFAULT_REMOTE_JUMP_SECONDS,
            progress_interval_ms: DEFAULT_PROGRESS_INTERVAL_MS,
            manual_seek: ManualSeekBehavior::Keep,
        }
    }
}

impl AutoSkipConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml(&text)
    }

    /// Load from the platform config directory, or fall back to defaults when
    /// no file exists there.
    pub fn load_or_default() -> Result<Self> {
        match default_config_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Derive and validate the skip policy.
    pub fn policy(&self) -> Result<SkipPolicy> {
        Ok(SkipPolicy::new(self.interval_seconds, self.jump_seconds)?
            .with_manual_seek(self.manual_seek))
    }

    /// Validated jump size for remote jump intents.
    pub fn remote_jump(&self) -> Result<f64> {
        if !self.remote_jump_seconds.is_finite() || self.remote_jump_seconds <= 0.0 {
            return Err(Error::Config(format!(
                "remote_jump_seconds must be a positive number, got {}",
                self.remote_jump_seconds
            )));
        }
        Ok(self.remote_jump_seconds)
    }

    /// Validated progress notification interval.
    pub fn progress_interval(&self) -> Result<Duration> {
        if self.progress_interval_ms == 0 {
            return Err(Error::Config(
                "progress_interval_ms must be greater than zero".to_string(),
            ));
        }
        Ok(Duration::from_millis(self.progress_interval_ms))
    }

    /// Check every value at once.
    pub fn validate(&self) -> Result<()> {
        self.policy()?;
        self.remote_jump()?;
        self.progress_interval()?;
        Ok(())
    }
}

/// Platform-specific location of the configuration file.
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "autoskip").map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}
