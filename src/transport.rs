//! Transport controller.
//!
//! Owns the single playback session, the queue, and the timers that drive
//! elapsed-time sampling and debounced navigation. User commands, engine
//! events and clock ticks all enter through
//! [`TransportController::dispatch`].

mod controller;
mod error;
mod state;

pub use controller::{ControllerOptions, REPEAT_BOUNDARY_TOLERANCE, TransportController};
pub use error::PlayerError;
pub use state::{Command, Event, PlayerSnapshot, TransportState};
