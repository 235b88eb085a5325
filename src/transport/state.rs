use std::time::Duration;

use crate::engine::EngineEvent;
use crate::library::Track;
use crate::timefmt::TimeParts;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransportState {
    /// No active track.
    #[default]
    Idle,
    /// Resource requested, not yet playable.
    Loading,
    Playing,
    Paused,
    /// The resource ran out; left immediately for `Playing` or the next track.
    Ended,
}

impl TransportState {
    pub fn name(self) -> &'static str {
        match self {
            TransportState::Idle => "Idle",
            TransportState::Loading => "Loading",
            TransportState::Playing => "Playing",
            TransportState::Paused => "Paused",
            TransportState::Ended => "Ended",
        }
    }
}

/// User intent.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Replace the queue with these ids, in play order.
    SetQueue(Vec<String>),
    /// Start playing a queued track.
    Select(String),
    TogglePlay,
    Play,
    Pause,
    /// Release the session and clear the active track.
    Stop,
    Next,
    Prev,
    /// Jump to an absolute position in seconds.
    SeekTo(f64),
    /// Move by a signed number of seconds.
    SeekBy(f64),
    SetVolume(f32),
    ToggleRepeat,
    ToggleMute,
}

/// Anything the controller reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Command(Command),
    Engine(EngineEvent),
    /// The clock moved; due timers fire.
    Tick,
}

impl From<Command> for Event {
    fn from(command: Command) -> Self {
        Event::Command(command)
    }
}

impl From<EngineEvent> for Event {
    fn from(event: EngineEvent) -> Self {
        Event::Engine(event)
    }
}

/// Read-only view of the controller for presentation layers.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSnapshot {
    pub state: TransportState,
    pub track: Option<Track>,
    pub active_id: Option<String>,
    pub elapsed: Duration,
    /// `None` until the resource has loaded.
    pub duration: Option<Duration>,
    pub elapsed_display: TimeParts,
    pub duration_display: TimeParts,
    pub playing: bool,
    pub volume: f32,
    pub repeat: bool,
    pub muted: bool,
    /// Last user-visible problem, cleared when a new session starts.
    pub notice: Option<String>,
}
