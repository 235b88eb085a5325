//! Application model types: `App` and the cursor over the queue.
//!
//! The `App` struct holds the queued tracks in play order, the list cursor
//! and the last player snapshot the UI rendered.

use crate::library::Track;
use crate::transport::PlayerSnapshot;

/// The main application model.
pub struct App {
    pub tracks: Vec<Track>,
    pub selected: usize,
    /// When set, the cursor jumps to the active track whenever it changes.
    pub follow_playback: bool,
    pub snapshot: Option<PlayerSnapshot>,
}

impl App {
    /// Create a new `App` over `tracks`, listed in queue order.
    pub fn new(tracks: Vec<Track>) -> Self {
        Self {
            tracks,
            selected: 0,
            follow_playback: true,
            snapshot: None,
        }
    }

    /// Return true if the queue contains any tracks.
    pub fn has_tracks(&self) -> bool {
        !self.tracks.is_empty()
    }

    pub fn selected_track(&self) -> Option<&Track> {
        self.tracks.get(self.selected)
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected_track().map(|t| t.id.as_str())
    }

    /// Index of the track the player currently has active.
    pub fn active_index(&self) -> Option<usize> {
        let id = self.snapshot.as_ref()?.active_id.as_deref()?;
        self.tracks.iter().position(|t| t.id == id)
    }

    /// Record a new snapshot, moving the cursor along when the active track changed.
    pub fn apply_snapshot(&mut self, snapshot: PlayerSnapshot) {
        let changed = self.snapshot.as_ref().map(|s| &s.active_id) != Some(&snapshot.active_id);
        self.snapshot = Some(snapshot);
        if changed && self.follow_playback {
            if let Some(idx) = self.active_index() {
                self.selected = idx;
            }
        }
    }

    /// Move selection to the next track, wrapping to the first.
    pub fn next(&mut self) {
        if self.has_tracks() {
            self.selected = (self.selected + 1) % self.tracks.len();
            self.follow_playback = false;
        }
    }

    /// Move selection to the previous track, wrapping to the last.
    pub fn prev(&mut self) {
        if self.has_tracks() {
            self.selected = self
                .selected
                .checked_sub(1)
                .unwrap_or(self.tracks.len() - 1);
            self.follow_playback = false;
        }
    }

    /// Jump to the top of the list.
    pub fn first(&mut self) {
        self.selected = 0;
        self.follow_playback = false;
    }

    /// Jump to the bottom of the list.
    pub fn last(&mut self) {
        self.selected = self.tracks.len().saturating_sub(1);
        self.follow_playback = false;
    }

    /// Re-enable following playback and jump to the active track.
    pub fn follow_playback_on(&mut self) {
        self.follow_playback = true;
        if let Some(idx) = self.active_index() {
            self.selected = idx;
        }
    }
}
