use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use rodio::{OutputStream, OutputStreamBuilder, Sink, StreamError};
use tracing::{debug, trace, warn};

use super::fetch::{FetchError, Fetched, fetch_and_decode};
use super::sink::create_sink_at;
use super::slot::Slot;
use super::types::{EngineEvent, LoadOptions, PlaybackEngine, SessionId, clamp_volume};

struct LoadOutcome {
    session: SessionId,
    result: Result<Fetched, FetchError>,
}

struct Loaded {
    bytes: Arc<[u8]>,
    sink: Sink,
    /// Where the current sink started; `sink.get_pos()` counts from here.
    offset: Duration,
    duration: Option<Duration>,
}

/// Engine backed by the default `rodio` output device.
///
/// Fetching and probing run on a short-lived loader thread; the sink itself
/// is only ever touched from the thread that owns the engine.
pub struct RodioEngine {
    stream: OutputStream,
    volume: f32,
    fetch_timeout: Duration,
    outcomes_tx: Sender<LoadOutcome>,
    outcomes_rx: Receiver<LoadOutcome>,
    slot: Slot<Loaded>,
    events: Vec<EngineEvent>,
}

impl RodioEngine {
    pub fn open(fetch_timeout: Duration) -> Result<Self, StreamError> {
        let mut stream = OutputStreamBuilder::open_default_stream()?;
        // rodio logs to stderr when OutputStream is dropped, which would land on the TUI.
        stream.log_on_drop(false);

        let (outcomes_tx, outcomes_rx) = mpsc::channel();
        Ok(Self {
            stream,
            volume: 1.0,
            fetch_timeout,
            outcomes_tx,
            outcomes_rx,
            slot: Slot::Empty,
            events: Vec::new(),
        })
    }

    fn release(&mut self) {
        let session = self.slot.session();
        match self.slot.release() {
            Some(active) => {
                active.media.sink.stop();
                debug!(session = %active.session, "audio resource released");
            }
            None => {
                if let Some(session) = session {
                    debug!(%session, "in-flight load cancelled");
                }
            }
        }
    }

    fn finish_load(&mut self, outcome: LoadOutcome) {
        let session = outcome.session;
        if !self.slot.awaits(session) {
            // Superseded while in flight: the fetched bytes are simply dropped.
            trace!(%session, "dropping result of superseded load");
            return;
        }

        let loaded = outcome.result.and_then(|fetched| {
            let sink = create_sink_at(&self.stream, &fetched.bytes, Duration::ZERO, self.volume)?;
            Ok(Loaded {
                bytes: fetched.bytes,
                sink,
                offset: Duration::ZERO,
                duration: fetched.duration,
            })
        });

        match loaded {
            Ok(loaded) => {
                let duration = loaded.duration;
                self.slot.fill(session, loaded);
                self.events.push(EngineEvent::Loaded { session, duration });
            }
            Err(err) => {
                self.slot.fail(session);
                self.events.push(EngineEvent::LoadFailed {
                    session,
                    reason: err.to_string(),
                });
            }
        }
    }

    fn rebuild_at(&mut self, session: SessionId, position: Duration) {
        let Some(active) = self.slot.ready_mut(session) else {
            return;
        };

        let loaded = &mut active.media;
        let target = loaded.duration.map_or(position, |d| position.min(d));
        match create_sink_at(&self.stream, &loaded.bytes, target, self.volume) {
            Ok(sink) => {
                if active.playing {
                    sink.play();
                }
                loaded.sink.stop();
                loaded.sink = sink;
                loaded.offset = target;
                active.ended = false;
            }
            Err(err) => warn!(%session, "seek failed: {err}"),
        }
    }
}

impl PlaybackEngine for RodioEngine {
    fn load(&mut self, session: SessionId, locator: &str, options: LoadOptions) {
        self.release();
        self.volume = clamp_volume(options.volume);
        let cancel = self.slot.begin(session);

        let tx = self.outcomes_tx.clone();
        let locator = locator.to_string();
        let timeout = self.fetch_timeout;
        let spawned = thread::Builder::new()
            .name("encore-loader".into())
            .spawn(move || {
                let result = fetch_and_decode(&locator, timeout, &cancel);
                if matches!(result, Err(FetchError::Cancelled)) {
                    trace!(%session, "loader stopped early");
                    return;
                }
                // The engine may be gone by now; nothing to report to then.
                let _ = tx.send(LoadOutcome { session, result });
            });

        if let Err(err) = spawned {
            self.slot.fail(session);
            self.events.push(EngineEvent::LoadFailed {
                session,
                reason: err.to_string(),
            });
        }
    }

    fn play(&mut self, session: SessionId) {
        let needs_rewind = match self.slot.ready(session) {
            Some(active) => active.ended || active.media.sink.empty(),
            None => return,
        };
        if needs_rewind {
            self.rebuild_at(session, Duration::ZERO);
        }

        if let Some(active) = self.slot.ready_mut(session) {
            active.media.sink.play();
            active.playing = true;
            active.ended = false;
            self.events.push(EngineEvent::Played { session });
        }
    }

    fn pause(&mut self, session: SessionId) {
        let Some(active) = self.slot.ready_mut(session) else {
            return;
        };
        active.media.sink.pause();
        active.playing = false;
        self.events.push(EngineEvent::Paused { session });
    }

    fn seek(&mut self, session: SessionId, position: Duration) {
        self.rebuild_at(session, position);
    }

    fn position(&self, session: SessionId) -> Option<Duration> {
        self.slot
            .ready(session)
            .map(|active| active.media.offset + active.media.sink.get_pos())
    }

    fn set_volume(&mut self, level: f32) {
        self.volume = clamp_volume(level);
        if let Slot::Ready(active) = &self.slot {
            active.media.sink.set_volume(self.volume);
        }
    }

    fn unload(&mut self, session: SessionId) {
        if self.slot.session() == Some(session) {
            self.release();
        } else {
            trace!(%session, "unload for a session that holds no resource");
        }
    }

    fn poll(&mut self) -> Vec<EngineEvent> {
        while let Ok(outcome) = self.outcomes_rx.try_recv() {
            self.finish_load(outcome);
        }

        if let Some(session) = self.slot.check_ended(|loaded| loaded.sink.empty()) {
            self.events.push(EngineEvent::Ended { session });
        }

        std::mem::take(&mut self.events)
    }
}

impl Drop for RodioEngine {
    fn drop(&mut self) {
        self.release();
    }
}
