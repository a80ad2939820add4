//! Core domain types for Autoskip.

pub mod event;
pub mod playback;
pub mod policy;
pub mod track;

pub use event::{PlayerEvent, RemoteCommand};
pub use playback::PlaybackState;
pub use policy::{ManualSeekBehavior, SkipPolicy};
pub use track::TrackInfo;
