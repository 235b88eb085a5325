//! TOML manifest of tracks served from remote storage.
//!
//! ```toml
//! [[track]]
//! id = "a1"
//! title = "Song"
//! author = "Artist"
//! url = "https://cdn.example.com/a1.mp3"
//! artwork = "https://cdn.example.com/a1.jpg"
//! duration_secs = 182.5
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use super::catalog::CatalogError;
use super::model::Track;

#[derive(Debug, Deserialize)]
struct Manifest {
    #[serde(default, rename = "track")]
    tracks: Vec<ManifestEntry>,
}

#[derive(Debug, Deserialize)]
struct ManifestEntry {
    id: String,
    title: String,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    artwork: Option<String>,
    #[serde(default)]
    duration_secs: Option<f64>,
}

pub fn load_manifest(path: &Path) -> Result<Vec<Track>, CatalogError> {
    let text = fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_manifest(&text)
}

/// Parse manifest text. Ids must be unique and every entry needs a non-empty `url`.
pub fn parse_manifest(text: &str) -> Result<Vec<Track>, CatalogError> {
    let manifest: Manifest = toml::from_str(text)?;

    let mut seen: HashSet<String> = HashSet::new();
    let mut tracks = Vec::with_capacity(manifest.tracks.len());
    for entry in manifest.tracks {
        if !seen.insert(entry.id.clone()) {
            return Err(CatalogError::DuplicateId(entry.id));
        }
        let url = match entry.url.map(|u| u.trim().to_string()) {
            Some(u) if !u.is_empty() => u,
            _ => return Err(CatalogError::MissingLocator(entry.id)),
        };
        // Negative, NaN and out-of-range hints are dropped rather than rejected.
        let duration = entry
            .duration_secs
            .and_then(|s| Duration::try_from_secs_f64(s).ok());

        tracks.push(Track {
            id: entry.id,
            title: entry.title,
            author: entry
                .author
                .filter(|a| !a.trim().is_empty())
                .unwrap_or_else(|| "Unknown artist".to_string()),
            audio_url: url,
            artwork_url: entry.artwork.filter(|a| !a.trim().is_empty()),
            duration,
        });
    }
    Ok(tracks)
}
