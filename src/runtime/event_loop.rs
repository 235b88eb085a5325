use std::sync::mpsc;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{debug, warn};

use crate::app::App;
use crate::config;
use crate::engine::PlaybackEngine;
use crate::mpris::{ControlCmd, MprisHandle};
use crate::prefs::PreferenceStore;
use crate::runtime::mpris_sync::update_mpris;
use crate::transport::{Command, PlayerSnapshot, TransportController};
use crate::ui;

/// Longest the loop blocks on terminal input before servicing timers again.
const INPUT_POLL: Duration = Duration::from_millis(50);

/// State tracked by the runtime event loop across iterations.
#[derive(Debug, Default)]
pub struct EventLoopState {
    /// Internal two-key prefix state used for `gg` handling.
    pub pending_gg: bool,
    /// Last volume written to the preference file.
    pub saved_volume: Option<f32>,
}

/// What a key press or bus request asks the loop to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    None,
    Quit,
    Dispatch(Command),
}

/// Everything the loop touches besides the terminal.
pub struct LoopContext<'a, E: PlaybackEngine> {
    pub settings: &'a config::Settings,
    pub app: &'a mut App,
    pub controller: &'a mut TransportController<E>,
    pub snapshots: &'a mpsc::Receiver<PlayerSnapshot>,
    pub mpris: &'a MprisHandle,
    pub control_rx: &'a mpsc::Receiver<ControlCmd>,
    pub prefs: Option<&'a PreferenceStore>,
    pub state: &'a mut EventLoopState,
}

/// Main terminal event loop: handles input, drives the controller's timers,
/// mirrors snapshots to the UI and MPRIS. Returns `Ok(())` when shutdown is requested.
pub fn run<E: PlaybackEngine>(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    cx: LoopContext<'_, E>,
) -> Result<(), Box<dyn std::error::Error>> {
    let LoopContext {
        settings,
        app,
        controller,
        snapshots,
        mpris,
        control_rx,
        prefs,
        state,
    } = cx;

    loop {
        controller.pump(Instant::now());

        while let Ok(snapshot) = snapshots.try_recv() {
            sync_snapshot(snapshot, app, mpris, prefs, state);
        }

        terminal.draw(|f| {
            ui::draw(
                f,
                app,
                &settings.ui,
                &settings.library,
                &settings.controls,
            )
        })?;

        while let Ok(cmd) = control_rx.try_recv() {
            match control_action(cmd, app.snapshot.as_ref()) {
                Action::Quit => return Ok(()),
                Action::Dispatch(command) => {
                    app.follow_playback_on();
                    controller.dispatch(command.into(), Instant::now());
                }
                Action::None => {}
            }
        }

        // Wake up early when a tick or a debounced navigation is due.
        let timeout = controller
            .next_deadline()
            .map(|due| due.saturating_duration_since(Instant::now()))
            .map_or(INPUT_POLL, |d| d.min(INPUT_POLL));

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match handle_key_event(key, settings, app, state) {
                    Action::Quit => break,
                    Action::Dispatch(command) => {
                        controller.dispatch(command.into(), Instant::now());
                    }
                    Action::None => {}
                }
            }
        }
    }

    Ok(())
}

/// Record a published snapshot and fan it out to MPRIS and the preference file.
fn sync_snapshot(
    snapshot: PlayerSnapshot,
    app: &mut App,
    mpris: &MprisHandle,
    prefs: Option<&PreferenceStore>,
    state: &mut EventLoopState,
) {
    let volume = snapshot.volume;
    app.apply_snapshot(snapshot);
    update_mpris(mpris, app);

    let Some(prefs) = prefs else {
        return;
    };
    if volume > 0.0 && state.saved_volume != Some(volume) {
        match prefs.save_volume(volume) {
            Ok(_) => state.saved_volume = Some(volume),
            Err(e) => warn!("could not save volume: {e}"),
        }
    }
}

/// Translate a bus request into a controller command.
pub fn control_action(cmd: ControlCmd, snapshot: Option<&PlayerSnapshot>) -> Action {
    let command = match cmd {
        ControlCmd::Quit => return Action::Quit,
        ControlCmd::Play => Command::Play,
        ControlCmd::Pause => Command::Pause,
        ControlCmd::PlayPause => Command::TogglePlay,
        ControlCmd::Stop => Command::Stop,
        ControlCmd::Next => Command::Next,
        ControlCmd::Prev => Command::Prev,
        ControlCmd::Seek(micros) => Command::SeekBy(micros as f64 / 1_000_000.0),
        ControlCmd::SetPosition(micros) => Command::SeekTo(micros as f64 / 1_000_000.0),
        ControlCmd::SetVolume(level) => Command::SetVolume(level as f32),
        ControlCmd::SetRepeat(on) => {
            if snapshot.is_some_and(|s| s.repeat == on) {
                return Action::None;
            }
            Command::ToggleRepeat
        }
    };
    debug!(?command, "bus request");
    Action::Dispatch(command)
}

/// Handle one key press: cursor keys act on `app`, the rest become commands.
pub fn handle_key_event(
    key: KeyEvent,
    settings: &config::Settings,
    app: &mut App,
    state: &mut EventLoopState,
) -> Action {
    if key.code != KeyCode::Char('g') {
        state.pending_gg = false;
    }

    let current_volume = app.snapshot.as_ref().map_or(1.0, |s| s.volume);
    let scrub = settings.controls.scrub_seconds as f64;

    let command = match key.code {
        KeyCode::Char('q') => return Action::Quit,
        KeyCode::Char('g') => {
            if state.pending_gg {
                state.pending_gg = false;
                app.first();
            } else {
                state.pending_gg = true;
            }
            return Action::None;
        }
        KeyCode::Char('G') => {
            app.last();
            return Action::None;
        }
        KeyCode::Char('j') | KeyCode::Down => {
            app.next();
            return Action::None;
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.prev();
            return Action::None;
        }
        KeyCode::Char('f') => {
            app.follow_playback_on();
            return Action::None;
        }
        KeyCode::Enter => {
            let Some(id) = app.selected_id().map(str::to_string) else {
                return Action::None;
            };
            app.follow_playback_on();
            Command::Select(id)
        }
        KeyCode::Char('p') | KeyCode::Char(' ') => Command::TogglePlay,
        KeyCode::Char('l') => Command::Next,
        KeyCode::Char('h') => Command::Prev,
        KeyCode::Char('L') => Command::SeekBy(scrub),
        KeyCode::Char('H') => Command::SeekBy(-scrub),
        KeyCode::Char('+') | KeyCode::Char('=') => {
            Command::SetVolume(current_volume + settings.audio.volume_step)
        }
        KeyCode::Char('-') => Command::SetVolume(current_volume - settings.audio.volume_step),
        KeyCode::Char('m') => Command::ToggleMute,
        KeyCode::Char('r') => Command::ToggleRepeat,
        KeyCode::Char('s') => Command::Stop,
        _ => return Action::None,
    };
    Action::Dispatch(command)
}
