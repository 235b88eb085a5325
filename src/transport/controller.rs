use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};

use tracing::{debug, info, trace, warn};

use crate::config::Settings;
use crate::engine::{EngineEvent, LoadOptions, PlaybackEngine, SessionId, clamp_volume};
use crate::library::{Track, TrackCatalog};
use crate::queue::QueueStore;
use crate::timefmt::split_duration;

use super::error::PlayerError;
use super::state::{Command, Event, PlayerSnapshot, TransportState};

/// How close to the end a sampled position must be for repeat to restart the track.
///
/// Engine positions jitter by a fraction of a second, so the end is never hit exactly.
pub const REPEAT_BOUNDARY_TOLERANCE: Duration = Duration::from_millis(500);

/// Level restored by unmute when no non-zero volume was ever set.
const DEFAULT_UNMUTE_VOLUME: f32 = 1.0;

#[derive(Debug, Clone)]
pub struct ControllerOptions {
    /// Elapsed-time sampling cadence while playing.
    pub tick_interval: Duration,
    /// Quiet window that collapses bursts of next/prev.
    pub debounce: Duration,
    pub volume: f32,
    pub repeat: bool,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(1),
            debounce: Duration::from_millis(300),
            volume: 1.0,
            repeat: false,
        }
    }
}

impl ControllerOptions {
    /// Options from settings, preferring a previously saved volume.
    pub fn from_settings(settings: &Settings, saved_volume: Option<f32>) -> Self {
        Self {
            tick_interval: Duration::from_millis(settings.playback.tick_ms),
            debounce: Duration::from_millis(settings.controls.debounce_ms),
            volume: saved_volume.unwrap_or(settings.audio.initial_volume),
            repeat: settings.playback.repeat,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Next,
    Prev,
}

#[derive(Debug, Clone, Copy)]
struct PendingNav {
    direction: Direction,
    due: Instant,
}

struct Session {
    id: SessionId,
    track: Track,
    elapsed: Duration,
    duration: Option<Duration>,
}

/// State machine over one engine, one queue and at most one live session.
pub struct TransportController<E: PlaybackEngine> {
    engine: E,
    catalog: Arc<dyn TrackCatalog>,
    queue: QueueStore,
    options: ControllerOptions,

    state: TransportState,
    session: Option<Session>,
    last_session: u64,

    volume: f32,
    unmute_volume: f32,
    repeat: bool,
    notice: Option<String>,

    tick_due: Option<Instant>,
    nav_due: Option<PendingNav>,

    subscribers: Vec<Sender<PlayerSnapshot>>,
    published: Option<PlayerSnapshot>,
    shut_down: bool,
}

impl<E: PlaybackEngine> TransportController<E> {
    pub fn new(mut engine: E, catalog: Arc<dyn TrackCatalog>, options: ControllerOptions) -> Self {
        let volume = clamp_volume(options.volume);
        engine.set_volume(volume);

        Self {
            engine,
            catalog,
            queue: QueueStore::new(),
            state: TransportState::Idle,
            session: None,
            last_session: 0,
            volume,
            unmute_volume: if volume > 0.0 {
                volume
            } else {
                DEFAULT_UNMUTE_VOLUME
            },
            repeat: options.repeat,
            notice: None,
            tick_due: None,
            nav_due: None,
            subscribers: Vec::new(),
            published: None,
            shut_down: false,
            options,
        }
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn queue(&self) -> &QueueStore {
        &self.queue
    }

    pub fn active_track(&self) -> Option<&Track> {
        self.session.as_ref().map(|s| &s.track)
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.session.as_ref().map(|s| s.id)
    }

    pub fn elapsed(&self) -> Duration {
        self.session.as_ref().map_or(Duration::ZERO, |s| s.elapsed)
    }

    pub fn duration(&self) -> Option<Duration> {
        self.session.as_ref().and_then(|s| s.duration)
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn is_muted(&self) -> bool {
        self.volume == 0.0
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        let elapsed = self.elapsed();
        let duration = self.duration();
        PlayerSnapshot {
            state: self.state,
            track: self.active_track().cloned(),
            active_id: self.queue.active().map(str::to_string),
            elapsed,
            duration,
            elapsed_display: split_duration(Some(elapsed)),
            duration_display: split_duration(duration),
            playing: self.state == TransportState::Playing,
            volume: self.volume,
            repeat: self.repeat,
            muted: self.is_muted(),
            notice: self.notice.clone(),
        }
    }

    /// Receive a snapshot now and after every change of observable state.
    pub fn subscribe(&mut self) -> Receiver<PlayerSnapshot> {
        let (tx, rx) = mpsc::channel();
        let _ = tx.send(self.snapshot());
        self.subscribers.push(tx);
        rx
    }

    /// Earliest instant at which a timer wants a [`Event::Tick`].
    pub fn next_deadline(&self) -> Option<Instant> {
        let nav = self.nav_due.map(|n| n.due);
        match (self.tick_due, nav) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Feed engine events that arrived since the last call, then fire due timers.
    pub fn pump(&mut self, now: Instant) {
        if self.shut_down {
            return;
        }
        for event in self.engine.poll() {
            self.dispatch(Event::Engine(event), now);
        }
        self.dispatch(Event::Tick, now);
    }

    /// The single transition entry point.
    pub fn dispatch(&mut self, event: Event, now: Instant) {
        if self.shut_down {
            trace!(?event, "controller shut down; event ignored");
            return;
        }

        let result = match event {
            Event::Command(command) => self.on_command(command, now),
            Event::Engine(event) => self.on_engine(event, now),
            Event::Tick => self.on_tick(now),
        };
        if let Err(err) = result {
            self.recover(err);
        }
        self.publish();
    }

    /// Release the live resource, stop all timers and ignore further events.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.teardown();
        self.state = TransportState::Idle;
        self.publish();
        self.subscribers.clear();
        self.shut_down = true;
        info!("transport controller shut down");
    }

    fn recover(&mut self, err: PlayerError) {
        match err {
            PlayerError::StaleCallback(session) => {
                trace!(%session, "discarding stale engine event");
            }
            PlayerError::InvalidQueueState | PlayerError::NotQueued(_) => {
                debug!("ignored: {err}");
            }
            PlayerError::ResourceLoad { .. } | PlayerError::UnknownTrack(_) => {
                warn!("{err}");
                self.notice = Some(err.to_string());
            }
        }
    }

    fn publish(&mut self) {
        let snapshot = self.snapshot();
        if self.published.as_ref() == Some(&snapshot) {
            return;
        }
        self.subscribers
            .retain(|tx| tx.send(snapshot.clone()).is_ok());
        self.published = Some(snapshot);
    }

    fn on_command(&mut self, command: Command, now: Instant) -> Result<(), PlayerError> {
        debug!(?command, state = self.state.name(), "command");
        match command {
            Command::SetQueue(ids) => {
                self.queue.set_queue(ids);
                if self.queue.active().is_none() && self.session.is_some() {
                    self.teardown();
                    self.state = TransportState::Idle;
                }
                Ok(())
            }
            Command::Select(id) => {
                if !self.queue.contains(&id) {
                    return Err(PlayerError::NotQueued(id));
                }
                self.start_session(id)
            }
            Command::TogglePlay => match self.state {
                TransportState::Playing => {
                    self.pause();
                    Ok(())
                }
                TransportState::Paused => {
                    self.resume(now);
                    Ok(())
                }
                TransportState::Idle => self.start_from_idle(),
                TransportState::Loading | TransportState::Ended => Ok(()),
            },
            Command::Play => match self.state {
                TransportState::Paused => {
                    self.resume(now);
                    Ok(())
                }
                TransportState::Idle => self.start_from_idle(),
                _ => Ok(()),
            },
            Command::Pause => {
                if self.state == TransportState::Playing {
                    self.pause();
                }
                Ok(())
            }
            Command::Stop => {
                self.teardown();
                self.queue.set_active(None);
                self.state = TransportState::Idle;
                Ok(())
            }
            Command::Next => self.request_nav(Direction::Next, now),
            Command::Prev => self.request_nav(Direction::Prev, now),
            Command::SeekTo(seconds) => {
                self.seek_to(seconds);
                Ok(())
            }
            Command::SeekBy(delta) => {
                self.seek_to(self.elapsed().as_secs_f64() + delta);
                Ok(())
            }
            Command::SetVolume(level) => {
                self.set_volume(level);
                Ok(())
            }
            Command::ToggleRepeat => {
                self.repeat = !self.repeat;
                Ok(())
            }
            Command::ToggleMute => {
                self.toggle_mute();
                Ok(())
            }
        }
    }

    fn on_engine(&mut self, event: EngineEvent, now: Instant) -> Result<(), PlayerError> {
        if self.session_id() != Some(event.session()) {
            return Err(PlayerError::StaleCallback(event.session()));
        }

        match event {
            EngineEvent::Loaded { session, duration } => {
                if self.state != TransportState::Loading {
                    return Ok(());
                }
                if let Some(s) = self.session.as_mut() {
                    s.duration = duration.or(s.track.duration);
                    s.elapsed = Duration::ZERO;
                }
                self.engine.play(session);
                self.state = TransportState::Playing;
                self.tick_due = Some(now + self.options.tick_interval);
                debug!(%session, "loaded; playback started");
            }
            EngineEvent::LoadFailed { reason, .. } => {
                let track = self
                    .session
                    .as_ref()
                    .map(|s| s.track.id.clone())
                    .unwrap_or_default();
                self.teardown();
                self.state = TransportState::Idle;
                return Err(PlayerError::ResourceLoad { track, reason });
            }
            EngineEvent::Played { .. } => {
                if self.state == TransportState::Paused {
                    self.state = TransportState::Playing;
                    if self.tick_due.is_none() {
                        self.tick_due = Some(now + self.options.tick_interval);
                    }
                }
            }
            EngineEvent::Paused { .. } => {
                if self.state == TransportState::Playing {
                    self.state = TransportState::Paused;
                    self.tick_due = None;
                }
            }
            EngineEvent::Ended { .. } => return self.on_ended(now),
        }
        Ok(())
    }

    fn on_tick(&mut self, now: Instant) -> Result<(), PlayerError> {
        if let Some(nav) = self.nav_due.filter(|n| now >= n.due) {
            self.nav_due = None;
            self.navigate(nav.direction)?;
        }

        if self.tick_due.is_some_and(|due| now >= due) {
            self.sample_elapsed();
            self.tick_due = Some(now + self.options.tick_interval);
            self.check_repeat_boundary(now);
        }
        Ok(())
    }

    fn on_ended(&mut self, now: Instant) -> Result<(), PlayerError> {
        if !matches!(
            self.state,
            TransportState::Playing | TransportState::Paused
        ) {
            return Ok(());
        }
        self.state = TransportState::Ended;
        self.tick_due = None;
        if let Some(s) = self.session.as_mut() {
            if let Some(d) = s.duration {
                s.elapsed = d;
            }
        }

        if self.repeat {
            self.restart(now);
            return Ok(());
        }

        self.nav_due = None;
        if let Err(err) = self.navigate(Direction::Next) {
            self.teardown();
            self.state = TransportState::Idle;
            return Err(err);
        }
        Ok(())
    }

    fn start_from_idle(&mut self) -> Result<(), PlayerError> {
        let id = self
            .queue
            .active()
            .filter(|id| self.queue.contains(id))
            .or_else(|| self.queue.first())
            .map(str::to_string)
            .ok_or(PlayerError::InvalidQueueState)?;
        self.start_session(id)
    }

    /// Release the current session and request the resource for `id`.
    fn start_session(&mut self, id: String) -> Result<(), PlayerError> {
        self.teardown();
        self.queue.set_active(Some(id.clone()));

        let Some(track) = self.catalog.resolve(&id) else {
            self.state = TransportState::Idle;
            return Err(PlayerError::UnknownTrack(id));
        };

        self.last_session += 1;
        let session = SessionId(self.last_session);
        info!(%session, id = %track.id, "starting session");
        self.engine.load(
            session,
            &track.audio_url,
            LoadOptions {
                volume: self.volume,
            },
        );
        self.session = Some(Session {
            id: session,
            track,
            elapsed: Duration::ZERO,
            duration: None,
        });
        self.state = TransportState::Loading;
        self.notice = None;
        Ok(())
    }

    /// Unload the live resource and clear every timer bound to it.
    fn teardown(&mut self) {
        if let Some(session) = self.session.take() {
            self.engine.unload(session.id);
            info!(session = %session.id, "session torn down");
        }
        self.tick_due = None;
        self.nav_due = None;
    }

    fn pause(&mut self) {
        let Some(id) = self.session_id() else {
            return;
        };
        self.sample_elapsed();
        self.engine.pause(id);
        self.state = TransportState::Paused;
        self.tick_due = None;
    }

    fn resume(&mut self, now: Instant) {
        let Some(id) = self.session_id() else {
            return;
        };
        self.engine.play(id);
        self.state = TransportState::Playing;
        self.tick_due = Some(now + self.options.tick_interval);
    }

    fn restart(&mut self, now: Instant) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        self.engine.seek(session.id, Duration::ZERO);
        self.engine.play(session.id);
        session.elapsed = Duration::ZERO;
        self.state = TransportState::Playing;
        self.tick_due = Some(now + self.options.tick_interval);
        debug!(session = %session.id, "repeating track");
    }

    fn request_nav(&mut self, direction: Direction, now: Instant) -> Result<(), PlayerError> {
        if self.queue.is_empty() {
            return Err(PlayerError::InvalidQueueState);
        }
        if self.options.debounce.is_zero() {
            return self.navigate(direction);
        }
        // Each request restarts the window; only the last one in a burst fires.
        self.nav_due = Some(PendingNav {
            direction,
            due: now + self.options.debounce,
        });
        Ok(())
    }

    fn navigate(&mut self, direction: Direction) -> Result<(), PlayerError> {
        let current = self.queue.active();
        let target = match direction {
            Direction::Next => self.queue.next(current),
            Direction::Prev => self.queue.prev(current),
        }
        .map(str::to_string)
        .ok_or(PlayerError::InvalidQueueState)?;

        debug!(?direction, %target, "navigating");
        self.start_session(target)
    }

    fn sample_elapsed(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if let Some(position) = self.engine.position(session.id) {
            let position = session.duration.map_or(position, |d| position.min(d));
            // Never step backwards on timer jitter; seeks set `elapsed` directly.
            session.elapsed = session.elapsed.max(position);
        }
    }

    fn check_repeat_boundary(&mut self, now: Instant) {
        if !self.repeat || self.state != TransportState::Playing {
            return;
        }
        let near_end = self.session.as_ref().is_some_and(|s| {
            s.duration
                .is_some_and(|d| s.elapsed + REPEAT_BOUNDARY_TOLERANCE >= d)
        });
        if near_end {
            self.restart(now);
        }
    }

    fn seek_to(&mut self, seconds: f64) {
        if !matches!(
            self.state,
            TransportState::Playing | TransportState::Paused
        ) || seconds.is_nan()
        {
            return;
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };

        let mut target = Duration::try_from_secs_f64(seconds.max(0.0)).unwrap_or(Duration::MAX);
        if let Some(d) = session.duration {
            target = target.min(d);
        }
        self.engine.seek(session.id, target);
        session.elapsed = target;
    }

    fn set_volume(&mut self, level: f32) {
        if level.is_nan() {
            return;
        }
        let level = clamp_volume(level);
        self.apply_volume(level);
        if level > 0.0 {
            self.unmute_volume = level;
        }
    }

    fn toggle_mute(&mut self) {
        if self.volume > 0.0 {
            self.unmute_volume = self.volume;
            self.apply_volume(0.0);
        } else {
            self.apply_volume(self.unmute_volume);
        }
    }

    fn apply_volume(&mut self, level: f32) {
        self.volume = level;
        self.engine.set_volume(level);
    }
}

impl<E: PlaybackEngine> Drop for TransportController<E> {
    fn drop(&mut self) {
        self.teardown();
    }
}
