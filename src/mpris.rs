//! MPRIS bridge over the session D-Bus.
//!
//! The service runs on its own thread. Method calls are forwarded to the
//! runtime as [`ControlCmd`]s; properties are served from a shared copy of
//! the last player snapshot, and `PropertiesChanged` is emitted whenever
//! the runtime pushes a new one.

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_io::{Timer, block_on};
use tracing::{debug, warn};
use zbus::object_server::InterfaceRef;
use zbus::{Connection, interface};
use zvariant::{ObjectPath, OwnedObjectPath, OwnedValue, Value};

use crate::library::Track;
use crate::transport::{PlayerSnapshot, TransportState};

const OBJECT_PATH: &str = "/org/mpris/MediaPlayer2";
const BUS_NAME: &str = "org.mpris.MediaPlayer2.encore";
const NOTIFY_POLL: Duration = Duration::from_millis(100);

#[derive(Clone, Debug, PartialEq)]
pub enum ControlCmd {
    Quit,
    Play,
    Pause,
    PlayPause,
    Stop,
    Next,
    Prev,
    /// Relative seek in microseconds.
    Seek(i64),
    /// Absolute position in microseconds.
    SetPosition(i64),
    SetVolume(f64),
    SetRepeat(bool),
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
enum PlaybackStatus {
    #[default]
    Stopped,
    Playing,
    Paused,
}

impl From<TransportState> for PlaybackStatus {
    fn from(state: TransportState) -> Self {
        match state {
            TransportState::Playing => PlaybackStatus::Playing,
            // A loading track is about to play; players report it as paused.
            TransportState::Paused | TransportState::Loading => PlaybackStatus::Paused,
            TransportState::Idle | TransportState::Ended => PlaybackStatus::Stopped,
        }
    }
}

#[derive(Debug, Default)]
struct SharedState {
    playback: PlaybackStatus,
    repeat: bool,
    volume: f64,
    position_micros: i64,

    track_id: Option<OwnedObjectPath>,
    title: Option<String>,
    artist: Vec<String>,
    url: Option<String>,
    art_url: Option<String>,
    length_micros: Option<i64>,
}

fn micros(d: Duration) -> i64 {
    i64::try_from(d.as_micros()).unwrap_or(i64::MAX)
}

fn track_path(index: usize) -> Option<OwnedObjectPath> {
    ObjectPath::try_from(format!("{OBJECT_PATH}/track/{index}"))
        .ok()
        .map(OwnedObjectPath::from)
}

pub struct MprisHandle {
    state: Arc<Mutex<SharedState>>,
    notify: Sender<()>,
}

impl MprisHandle {
    /// Mirror a player snapshot. `queue_index` names the active track on the bus.
    pub fn update(&self, snapshot: &PlayerSnapshot, queue_index: Option<usize>) {
        let track = snapshot.track.as_ref();
        self.set_track_metadata(queue_index.filter(|_| track.is_some()), track, snapshot.duration);
        if let Ok(mut s) = self.state.lock() {
            s.playback = snapshot.state.into();
            s.repeat = snapshot.repeat;
            s.volume = f64::from(snapshot.volume);
            s.position_micros = micros(snapshot.elapsed);
        }
        let _ = self.notify.send(());
    }

    fn set_track_metadata(
        &self,
        index: Option<usize>,
        track: Option<&Track>,
        duration: Option<Duration>,
    ) {
        let Ok(mut s) = self.state.lock() else {
            return;
        };
        match track {
            Some(t) => {
                s.track_id = index.and_then(track_path);
                s.title = Some(t.title.clone());
                s.artist = vec![t.author.clone()];
                s.url = Some(t.audio_url.clone());
                s.art_url = t.artwork_url.clone();
                s.length_micros = duration.or(t.duration).map(micros);
            }
            None => {
                s.track_id = None;
                s.title = None;
                s.artist.clear();
                s.url = None;
                s.art_url = None;
                s.length_micros = None;
            }
        }
    }
}

struct RootIface {
    tx: Sender<ControlCmd>,
}

#[interface(name = "org.mpris.MediaPlayer2")]
impl RootIface {
    fn raise(&self) {
        // No-op for TUI.
    }

    fn quit(&self) {
        let _ = self.tx.send(ControlCmd::Quit);
    }

    #[zbus(property)]
    fn can_quit(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_raise(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn has_track_list(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn identity(&self) -> &str {
        "encore"
    }

    #[zbus(property)]
    fn supported_uri_schemes(&self) -> Vec<String> {
        vec!["file".into(), "http".into(), "https".into()]
    }

    #[zbus(property)]
    fn supported_mime_types(&self) -> Vec<String> {
        vec![]
    }
}

struct PlayerIface {
    tx: Sender<ControlCmd>,
    state: Arc<Mutex<SharedState>>,
}

fn owned(value: Value<'_>) -> Option<OwnedValue> {
    OwnedValue::try_from(value).ok()
}

#[interface(name = "org.mpris.MediaPlayer2.Player")]
impl PlayerIface {
    fn next(&self) {
        let _ = self.tx.send(ControlCmd::Next);
    }

    fn previous(&self) {
        let _ = self.tx.send(ControlCmd::Prev);
    }

    fn play(&self) {
        let _ = self.tx.send(ControlCmd::Play);
    }

    fn pause(&self) {
        let _ = self.tx.send(ControlCmd::Pause);
    }

    fn play_pause(&self) {
        let _ = self.tx.send(ControlCmd::PlayPause);
    }

    fn stop(&self) {
        let _ = self.tx.send(ControlCmd::Stop);
    }

    fn seek(&self, offset: i64) {
        let _ = self.tx.send(ControlCmd::Seek(offset));
    }

    fn set_position(&self, track_id: ObjectPath<'_>, position: i64) {
        let current = self.state.lock().ok().and_then(|s| s.track_id.clone());
        // Requests for a track that is no longer current are ignored.
        if current.as_ref().map(|p| p.as_str()) == Some(track_id.as_str()) && position >= 0 {
            let _ = self.tx.send(ControlCmd::SetPosition(position));
        }
    }

    #[zbus(property)]
    fn playback_status(&self) -> &str {
        let Ok(s) = self.state.lock() else {
            return "Stopped";
        };
        match s.playback {
            PlaybackStatus::Stopped => "Stopped",
            PlaybackStatus::Playing => "Playing",
            PlaybackStatus::Paused => "Paused",
        }
    }

    #[zbus(property)]
    fn loop_status(&self) -> &str {
        match self.state.lock() {
            Ok(s) if s.repeat => "Track",
            _ => "None",
        }
    }

    #[zbus(property)]
    fn set_loop_status(&mut self, value: String) {
        let _ = self.tx.send(ControlCmd::SetRepeat(value != "None"));
    }

    #[zbus(property)]
    fn volume(&self) -> f64 {
        self.state.lock().map(|s| s.volume).unwrap_or(0.0)
    }

    #[zbus(property)]
    fn set_volume(&mut self, value: f64) {
        let _ = self.tx.send(ControlCmd::SetVolume(value.clamp(0.0, 1.0)));
    }

    #[zbus(property(emits_changed_signal = "false"))]
    fn position(&self) -> i64 {
        self.state.lock().map(|s| s.position_micros).unwrap_or(0)
    }

    #[zbus(property)]
    fn rate(&self) -> f64 {
        1.0
    }

    #[zbus(property)]
    fn can_control(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_play(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_pause(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_seek(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_go_next(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_go_previous(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn metadata(&self) -> HashMap<String, OwnedValue> {
        let mut map = HashMap::new();
        let Ok(s) = self.state.lock() else {
            return map;
        };

        let mut put = |key: &str, value: Option<OwnedValue>| {
            if let Some(v) = value {
                map.insert(key.to_string(), v);
            }
        };

        put(
            "mpris:trackid",
            s.track_id
                .as_ref()
                .and_then(|p| owned(Value::ObjectPath(p.clone().into_inner()))),
        );
        put(
            "xesam:title",
            s.title.as_ref().and_then(|t| owned(Value::from(t.as_str()))),
        );
        if !s.artist.is_empty() {
            put("xesam:artist", owned(Value::from(s.artist.clone())));
        }
        put(
            "xesam:url",
            s.url.as_ref().and_then(|u| owned(Value::from(u.as_str()))),
        );
        put(
            "mpris:artUrl",
            s.art_url.as_ref().and_then(|u| owned(Value::from(u.as_str()))),
        );
        put(
            "mpris:length",
            s.length_micros.and_then(|l| owned(Value::from(l))),
        );
        map
    }
}

/// Emit `PropertiesChanged` for everything a snapshot can move.
async fn emit_changes(player: &InterfaceRef<PlayerIface>) -> zbus::Result<()> {
    let emitter = player.signal_emitter();
    let iface = player.get().await;
    iface.playback_status_changed(emitter).await?;
    iface.loop_status_changed(emitter).await?;
    iface.volume_changed(emitter).await?;
    iface.metadata_changed(emitter).await?;
    Ok(())
}

async fn serve(
    tx: Sender<ControlCmd>,
    state: Arc<Mutex<SharedState>>,
    notify: Receiver<()>,
) -> zbus::Result<()> {
    let connection = Connection::session().await?;
    connection.request_name(BUS_NAME).await?;

    let object_server = connection.object_server();
    object_server
        .at(OBJECT_PATH, RootIface { tx: tx.clone() })
        .await?;
    object_server
        .at(OBJECT_PATH, PlayerIface { tx, state })
        .await?;
    let player = object_server
        .interface::<_, PlayerIface>(OBJECT_PATH)
        .await?;
    debug!(name = BUS_NAME, "MPRIS service registered");

    loop {
        Timer::after(NOTIFY_POLL).await;

        let mut dirty = false;
        loop {
            match notify.try_recv() {
                Ok(()) => dirty = true,
                Err(mpsc::TryRecvError::Empty) => break,
                // The runtime is gone; so is the reason to stay on the bus.
                Err(mpsc::TryRecvError::Disconnected) => return Ok(()),
            }
        }
        if dirty {
            if let Err(e) = emit_changes(&player).await {
                debug!("MPRIS: failed to emit PropertiesChanged: {e}");
            }
        }
    }
}

/// Start the MPRIS service thread. Failing to reach the bus is logged, not fatal.
pub fn spawn_mpris(tx: Sender<ControlCmd>) -> MprisHandle {
    let state = Arc::new(Mutex::new(SharedState::default()));
    let (notify, notify_rx) = mpsc::channel();

    let state_for_thread = state.clone();
    let spawned = std::thread::Builder::new()
        .name("encore-mpris".into())
        .spawn(move || {
            if let Err(e) = block_on(serve(tx, state_for_thread, notify_rx)) {
                warn!("MPRIS unavailable: {e}");
            }
        });
    if let Err(e) = spawned {
        warn!("MPRIS: failed to start service thread: {e}");
    }

    MprisHandle { state, notify }
}

#[cfg(test)]
mod tests;
