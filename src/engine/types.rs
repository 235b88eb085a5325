//! Engine-facing types: session handles, lifecycle events and the engine trait.

use std::fmt;
use std::time::Duration;

/// Handle of one playback session. Every load gets a fresh id, so events
/// carrying an older id can be recognised as stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadOptions {
    /// Volume applied as soon as the resource becomes playable.
    pub volume: f32,
}

/// Lifecycle notifications emitted by an engine.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// The resource is decoded and ready; `duration` is `None` when the decoder cannot tell.
    Loaded {
        session: SessionId,
        duration: Option<Duration>,
    },
    LoadFailed {
        session: SessionId,
        reason: String,
    },
    Played {
        session: SessionId,
    },
    Paused {
        session: SessionId,
    },
    /// Playback ran off the end of the resource.
    Ended {
        session: SessionId,
    },
}

impl EngineEvent {
    pub fn session(&self) -> SessionId {
        match self {
            EngineEvent::Loaded { session, .. }
            | EngineEvent::LoadFailed { session, .. }
            | EngineEvent::Played { session }
            | EngineEvent::Paused { session }
            | EngineEvent::Ended { session } => *session,
        }
    }
}

/// Raw transport primitives over a single decoded-audio resource.
///
/// Commands naming a session other than the live one are ignored, as are
/// playback commands issued before the resource finished loading.
pub trait PlaybackEngine {
    /// Start acquiring the resource behind `locator`. Any previous resource is released first.
    fn load(&mut self, session: SessionId, locator: &str, options: LoadOptions);
    fn play(&mut self, session: SessionId);
    fn pause(&mut self, session: SessionId);
    fn seek(&mut self, session: SessionId, position: Duration);
    /// Current playback position, once the resource is loaded.
    fn position(&self, session: SessionId) -> Option<Duration>;
    /// Set the output level, clamped to `0.0..=1.0`. Remembered across loads.
    fn set_volume(&mut self, level: f32);
    /// Release the resource held for `session`, loaded or still in flight.
    fn unload(&mut self, session: SessionId);
    /// Drain the lifecycle events produced since the last call.
    fn poll(&mut self) -> Vec<EngineEvent>;
}

/// Clamp a volume level into `0.0..=1.0`; NaN becomes silence.
pub fn clamp_volume(level: f32) -> f32 {
    if level.is_nan() {
        0.0
    } else {
        level.clamp(0.0, 1.0)
    }
}
