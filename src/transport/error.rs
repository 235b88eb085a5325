use thiserror::Error;

use crate::engine::SessionId;

/// Everything that can go wrong inside the controller. None of it is fatal:
/// each variant is recovered where the event was dispatched.
#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("could not load `{track}`: {reason}")]
    ResourceLoad { track: String, reason: String },
    #[error("navigation requested on an empty queue")]
    InvalidQueueState,
    #[error("event for superseded session {0}")]
    StaleCallback(SessionId),
    #[error("track `{0}` is not in the catalog")]
    UnknownTrack(String),
    #[error("track `{0}` is not queued")]
    NotQueued(String),
}
