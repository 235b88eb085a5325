use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use crate::config::LibrarySettings;

use super::manifest::load_manifest;
use super::model::Track;
use super::scan::scan;

/// Lookup side of the persistence layer, as seen by the transport.
pub trait TrackCatalog {
    /// Resolve a queued id to its track metadata and locator.
    fn resolve(&self, id: &str) -> Option<Track>;
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid manifest: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("duplicate track id `{0}`")]
    DuplicateId(String),
    #[error("track `{0}` has no audio locator")]
    MissingLocator(String),
}

/// Ordered, id-indexed set of tracks. Insertion order is the default play order.
#[derive(Debug, Default)]
pub struct Library {
    tracks: Vec<Track>,
    by_id: HashMap<String, usize>,
}

impl Library {
    pub fn new(tracks: Vec<Track>) -> Self {
        let mut library = Self::default();
        for track in tracks {
            if library.by_id.contains_key(&track.id) {
                warn!(id = %track.id, "dropping duplicate track id");
                continue;
            }
            library.by_id.insert(track.id.clone(), library.tracks.len());
            library.tracks.push(track);
        }
        library
    }

    /// Open a library from `source`: a `.toml` manifest file, or a directory to scan.
    /// Any other file scans the directory it lives in.
    pub fn open(source: &Path, settings: &LibrarySettings) -> Result<Self, CatalogError> {
        let tracks = if !source.is_file() {
            scan(source, settings)
        } else if is_manifest(source) {
            load_manifest(source)?
        } else {
            let dir = match source.parent() {
                Some(p) if !p.as_os_str().is_empty() => p,
                _ => Path::new("."),
            };
            debug!(file = %source.display(), "not a manifest, scanning its directory");
            scan(dir, settings)
        };
        debug!(source = %source.display(), count = tracks.len(), "library opened");
        Ok(Self::new(tracks))
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn ids(&self) -> Vec<String> {
        self.tracks.iter().map(|t| t.id.clone()).collect()
    }

    pub fn get(&self, id: &str) -> Option<&Track> {
        self.by_id.get(id).and_then(|&i| self.tracks.get(i))
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

fn is_manifest(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("toml"))
}

impl TrackCatalog for Library {
    fn resolve(&self, id: &str) -> Option<Track> {
        self.get(id).cloned()
    }
}
