//! # autoskip-core
//!
//! Core types, the player collaborator trait, configuration and error handling
//! for Autoskip.

pub mod config;
pub mod error;
pub mod player;
pub mod types;

pub use config::AutoSkipConfig;
pub use error::{Error, Result};
pub use player::Player;
pub use types::*;
