use std::time::Duration;

/// A playable track. Immutable once the catalog has produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub id: String,
    pub title: String,
    pub author: String,
    /// Locator handed to the engine: `file://`, `http(s)://` or a plain path.
    pub audio_url: String,
    pub artwork_url: Option<String>,
    /// Duration from tags or the manifest. The decoder's own figure wins when it has one.
    pub duration: Option<Duration>,
}
