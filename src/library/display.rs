use crate::config::TrackDisplayField;

use super::model::Track;

/// Build a display string for a track according to the provided `fields` and separator.
///
/// Empty fields are skipped; when nothing was produced the title is used.
pub fn display_from_fields(track: &Track, fields: &[TrackDisplayField], sep: &str) -> String {
    let mut parts: Vec<String> = Vec::new();

    for f in fields {
        match f {
            TrackDisplayField::Title => {
                if !track.title.trim().is_empty() {
                    parts.push(track.title.trim().to_string());
                }
            }
            TrackDisplayField::Author => {
                if !track.author.trim().is_empty() {
                    parts.push(track.author.trim().to_string());
                }
            }
            TrackDisplayField::Id => {
                parts.push(track.id.clone());
            }
            TrackDisplayField::Locator => {
                parts.push(track.audio_url.clone());
            }
        }
    }

    if parts.is_empty() {
        track.title.clone()
    } else {
        parts.join(sep)
    }
}
