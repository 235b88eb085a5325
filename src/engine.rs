//! Playback engine.
//!
//! An engine owns at most one decoded audio resource, bound to the session
//! that requested it. Loading is asynchronous; the engine reports progress
//! as [`EngineEvent`]s which the owner drains with [`PlaybackEngine::poll`].

mod fetch;
mod output;
mod sink;
mod slot;
mod types;

pub use fetch::FetchError;
pub use output::RodioEngine;
pub use types::{EngineEvent, LoadOptions, PlaybackEngine, SessionId, clamp_volume};
