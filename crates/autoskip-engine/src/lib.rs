//! # autoskip-engine
//!
//! A playback engine without audio: the playhead advances with the tokio clock,
//! transport commands act on it immediately, and position ticks, state changes
//! and remote intents are delivered on an event stream. Used by the `autoskip`
//! binary and by integration tests of the scheduler.

pub mod engine;

pub use engine::{EngineConfig, SimulatedPlayer, DEFAULT_PROGRESS_INTERVAL};
