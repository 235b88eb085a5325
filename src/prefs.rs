//! Small persisted user preferences (`prefs.toml` in the state directory).

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::default_state_dir;

const PREFS_FILE: &str = "prefs.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    /// Last non-zero output level.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<f32>,
}

#[derive(Debug, Error)]
pub enum PrefsError {
    #[error("preferences I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("invalid preferences file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("could not encode preferences: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Clone)]
pub struct PreferenceStore {
    path: PathBuf,
}

impl PreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store under the default state directory, if one can be determined.
    pub fn at_default_location() -> Option<Self> {
        default_state_dir().map(|dir| Self::new(dir.join(PREFS_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read preferences; a missing file means "nothing saved yet".
    pub fn load(&self) -> Result<Preferences, PrefsError> {
        match fs::read_to_string(&self.path) {
            Ok(text) => {
                let mut prefs: Preferences = toml::from_str(&text)?;
                prefs.volume = prefs
                    .volume
                    .filter(|v| v.is_finite() && *v > 0.0)
                    .map(|v| v.min(1.0));
                Ok(prefs)
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Preferences::default()),
            Err(err) => Err(err.into()),
        }
    }

    pub fn save(&self, prefs: &Preferences) -> Result<(), PrefsError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let text = toml::to_string(prefs)?;
        fs::write(&self.path, text)?;
        debug!(path = %self.path.display(), "preferences saved");
        Ok(())
    }

    /// Persist `volume` unless it is silence.
    pub fn save_volume(&self, volume: f32) -> Result<bool, PrefsError> {
        if volume.is_nan() || volume <= 0.0 {
            return Ok(false);
        }
        self.save(&Preferences {
            volume: Some(volume.min(1.0)),
        })?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = PreferenceStore::new(dir.path().join("prefs.toml"));
        assert_eq!(store.load().unwrap(), Preferences::default());
    }

    #[test]
    fn volume_survives_a_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = PreferenceStore::new(dir.path().join("nested").join("prefs.toml"));
        assert!(store.save_volume(0.4).unwrap());
        assert_eq!(store.load().unwrap().volume, Some(0.4));
    }

    #[test]
    fn silence_is_never_written() {
        let dir = tempfile::tempdir().unwrap();
        let store = PreferenceStore::new(dir.path().join("prefs.toml"));
        store.save_volume(0.7).unwrap();
        assert!(!store.save_volume(0.0).unwrap());
        assert!(!store.save_volume(f32::NAN).unwrap());
        assert_eq!(store.load().unwrap().volume, Some(0.7));
    }

    #[test]
    fn out_of_range_saved_levels_are_sanitized() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.toml");
        let store = PreferenceStore::new(&path);

        fs::write(&path, "volume = 3.5\n").unwrap();
        assert_eq!(store.load().unwrap().volume, Some(1.0));

        fs::write(&path, "volume = 0.0\n").unwrap();
        assert_eq!(store.load().unwrap().volume, None);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.toml");
        fs::write(&path, "volume = [").unwrap();
        assert!(matches!(
            PreferenceStore::new(&path).load(),
            Err(PrefsError::Parse(_))
        ));
    }
}
