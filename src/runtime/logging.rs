use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::config::{LogSettings, default_state_dir};

const LOG_ENV: &str = "ENCORE_LOG";
const LOG_FILE: &str = "encore.log";

/// Where log lines go: the configured file, else `encore.log` in the state dir.
pub fn log_path(settings: &LogSettings) -> Option<PathBuf> {
    settings
        .file
        .clone()
        .or_else(|| default_state_dir().map(|d| d.join(LOG_FILE)))
}

/// `ENCORE_LOG` wins over the configured level; a bad directive falls back to `info`.
pub fn env_filter(settings: &LogSettings) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber writing to a file.
///
/// The terminal belongs to the TUI, so nothing is ever written to stdout or
/// stderr. When the file cannot be opened the app simply runs without logs.
pub fn init_logging(settings: &LogSettings) -> Option<PathBuf> {
    let path = log_path(settings)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).ok()?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .ok()?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter(settings))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .ok()?;
    Some(path)
}
