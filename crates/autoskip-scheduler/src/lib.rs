//! # autoskip-scheduler
//!
//! Periodic auto-skip for a playback engine.
//!
//! - [`Scheduler`]: threshold logic and single-flight skip execution
//! - [`ProgressObserver`]: position ticks to scheduler, one at a time
//! - [`RemotePassthrough`]: remote intents to player transport calls
//! - [`AutoSkipService`]: the event loop tying them together per session

pub mod observer;
pub mod passthrough;
pub mod scheduler;
pub mod service;

#[cfg(test)]
pub(crate) mod mock;

pub use observer::{ObserverStats, ProgressObserver};
pub use passthrough::RemotePassthrough;
pub use scheduler::{Gate, Outcome, Scheduler};
pub use service::AutoSkipService;
