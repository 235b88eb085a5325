//! Ordered queue of track ids and the currently active one.
//!
//! Insertion order is play order. The active id, when set, is normally a
//! member of the queue; the store never adds ids on its own, and it clears
//! the active id whenever the queue becomes empty.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueStore {
    ids: Vec<String>,
    active: Option<String>,
}

impl QueueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the queue. The active id is left alone unless the new queue is empty.
    pub fn set_queue(&mut self, ids: Vec<String>) {
        self.ids = ids;
        if self.ids.is_empty() {
            self.active = None;
        }
    }

    /// Set the active id. Membership is the caller's concern.
    pub fn set_active(&mut self, id: Option<String>) {
        self.active = id;
    }

    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    pub fn first(&self) -> Option<&str> {
        self.ids.first().map(String::as_str)
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.ids.iter().position(|x| x == id)
    }

    /// The id after `current`, wrapping to the first element.
    ///
    /// An unknown or absent `current` also yields the first element.
    /// Returns `None` only for an empty queue.
    pub fn next(&self, current: Option<&str>) -> Option<&str> {
        if self.ids.is_empty() {
            return None;
        }
        let pos = current.and_then(|c| self.position(c));
        let next = match pos {
            Some(p) => (p + 1) % self.ids.len(),
            None => 0,
        };
        Some(self.ids[next].as_str())
    }

    /// The id before `current`, wrapping to the last element.
    ///
    /// An unknown or absent `current` yields the last element.
    /// Returns `None` only for an empty queue.
    pub fn prev(&self, current: Option<&str>) -> Option<&str> {
        let last = self.ids.len().checked_sub(1)?;
        let pos = current.and_then(|c| self.position(c));
        let prev = match pos {
            Some(0) | None => last,
            Some(p) => p - 1,
        };
        Some(self.ids[prev].as_str())
    }
}
