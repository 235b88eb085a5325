//! Bookkeeping for the engine's single resource, independent of the output device.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::types::SessionId;

/// Flag shared with a loader thread, which checks it between its steps.
#[derive(Debug, Clone, Default)]
pub(super) struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// A loaded resource plus its transport flags.
pub(super) struct Active<T> {
    pub session: SessionId,
    pub playing: bool,
    pub ended: bool,
    pub media: T,
}

/// At most one resource: nothing, a load in flight, or something playable.
pub(super) enum Slot<T> {
    Empty,
    Loading {
        session: SessionId,
        cancel: CancelFlag,
    },
    Ready(Active<T>),
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Slot::Empty
    }
}

impl<T> Slot<T> {
    pub fn session(&self) -> Option<SessionId> {
        match self {
            Slot::Empty => None,
            Slot::Loading { session, .. } => Some(*session),
            Slot::Ready(active) => Some(active.session),
        }
    }

    /// True while a load for `session` is still wanted.
    pub fn awaits(&self, session: SessionId) -> bool {
        matches!(self, Slot::Loading { session: s, .. } if *s == session)
    }

    pub fn ready(&self, session: SessionId) -> Option<&Active<T>> {
        match self {
            Slot::Ready(active) if active.session == session => Some(active),
            _ => None,
        }
    }

    pub fn ready_mut(&mut self, session: SessionId) -> Option<&mut Active<T>> {
        match self {
            Slot::Ready(active) if active.session == session => Some(active),
            _ => None,
        }
    }

    /// Empty the slot. A load in flight is cancelled; loaded media is handed
    /// back so the caller can stop it.
    pub fn release(&mut self) -> Option<Active<T>> {
        match std::mem::take(self) {
            Slot::Ready(active) => Some(active),
            Slot::Loading { cancel, .. } => {
                cancel.cancel();
                None
            }
            Slot::Empty => None,
        }
    }

    /// Release whatever is held and wait for `session`. The returned flag
    /// goes to the loader.
    pub fn begin(&mut self, session: SessionId) -> CancelFlag {
        self.release();
        let cancel = CancelFlag::default();
        *self = Slot::Loading {
            session,
            cancel: cancel.clone(),
        };
        cancel
    }

    /// Install the media loaded for `session`. Returns false, leaving the
    /// slot alone, when that load is no longer awaited.
    pub fn fill(&mut self, session: SessionId, media: T) -> bool {
        if !self.awaits(session) {
            return false;
        }
        *self = Slot::Ready(Active {
            session,
            playing: false,
            ended: false,
            media,
        });
        true
    }

    /// Give up on the awaited load for `session`. Returns false when it was not awaited.
    pub fn fail(&mut self, session: SessionId) -> bool {
        if !self.awaits(session) {
            return false;
        }
        *self = Slot::Empty;
        true
    }

    /// Flag the playing resource as ended once `drained` says its output ran dry.
    /// Reports each end once.
    pub fn check_ended(&mut self, drained: impl FnOnce(&T) -> bool) -> Option<SessionId> {
        let Slot::Ready(active) = self else {
            return None;
        };
        if active.playing && !active.ended && drained(&active.media) {
            active.ended = true;
            active.playing = false;
            return Some(active.session);
        }
        None
    }
}
