use std::env;
use std::path::PathBuf;
use std::sync::{Arc, mpsc};
use std::time::Duration;

use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{debug, info, warn};

use crate::app::App;
use crate::engine::RodioEngine;
use crate::library::Library;
use crate::mpris::ControlCmd;
use crate::prefs::PreferenceStore;
use crate::transport::{ControllerOptions, TransportController};

mod event_loop;
mod logging;
mod mpris_sync;
mod settings;
mod startup;


pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let (settings, settings_problem) = settings::load_settings();
    let log_file = logging::init_logging(&settings.log);
    info!(log = ?log_file, "encore starting");
    if let Some(msg) = settings_problem {
        warn!("{msg}");
    }

    // A directory to scan or a `.toml` manifest; the working directory by default.
    let source = env::args()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("Music"));

    let library = Arc::new(Library::open(&source, &settings.library)?);
    info!(source = %source.display(), tracks = library.len(), "library ready");
    let mut app = App::new(library.tracks().to_vec());

    let prefs = PreferenceStore::at_default_location();
    if let Some(p) = &prefs {
        debug!(path = %p.path().display(), "preferences");
    }
    let saved_volume = prefs.as_ref().and_then(|p| match p.load() {
        Ok(prefs) => prefs.volume,
        Err(e) => {
            warn!("ignoring preferences: {e}");
            None
        }
    });

    let engine = RodioEngine::open(Duration::from_millis(settings.audio.fetch_timeout_ms))?;
    let mut controller = TransportController::new(
        engine,
        library.clone(),
        ControllerOptions::from_settings(&settings, saved_volume),
    );
    let snapshots = controller.subscribe();
    startup::apply_playback_defaults(&library, &mut controller, &settings);

    let (control_tx, control_rx) = mpsc::channel::<ControlCmd>();
    let mpris = crate::mpris::spawn_mpris(control_tx);

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut state = event_loop::EventLoopState {
        saved_volume,
        ..Default::default()
    };
    let run_result = event_loop::run(
        &mut terminal,
        event_loop::LoopContext {
            settings: &settings,
            app: &mut app,
            controller: &mut controller,
            snapshots: &snapshots,
            mpris: &mpris,
            control_rx: &control_rx,
            prefs: prefs.as_ref(),
            state: &mut state,
        },
    );

    info!(
        state = ?controller.state(),
        volume = controller.volume(),
        notice = controller.notice(),
        "shutting down"
    );
    controller.shutdown();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    info!("encore exiting");
    run_result
}
