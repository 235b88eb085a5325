use super::*;
use crate::timefmt::split_duration;
use std::sync::mpsc;
use std::time::Duration;

fn make_track() -> Track {
    Track {
        id: "album/test.mp3".to_string(),
        title: "Test Title".to_string(),
        author: "Test Artist".to_string(),
        audio_url: "file:///tmp/music/album/test.mp3".to_string(),
        artwork_url: Some("file:///tmp/music/album/cover.jpg".to_string()),
        duration: Some(Duration::from_secs(99)),
    }
}

fn make_snapshot(state: TransportState, track: Option<Track>) -> PlayerSnapshot {
    let elapsed = Duration::from_millis(2_500);
    let duration = track.as_ref().map(|_| Duration::from_micros(1_234_567));
    PlayerSnapshot {
        state,
        active_id: track.as_ref().map(|t| t.id.clone()),
        track,
        elapsed,
        duration,
        elapsed_display: split_duration(Some(elapsed)),
        duration_display: split_duration(duration),
        playing: state == TransportState::Playing,
        volume: 0.25,
        repeat: true,
        muted: false,
        notice: None,
    }
}

fn handle_with_state() -> (MprisHandle, Arc<Mutex<SharedState>>, mpsc::Receiver<()>) {
    let state = Arc::new(Mutex::new(SharedState::default()));
    let (notify, notify_rx) = mpsc::channel::<()>();
    let handle = MprisHandle {
        state: state.clone(),
        notify,
    };
    (handle, state, notify_rx)
}

#[test]
fn update_sets_and_clears_track_metadata() {
    let (handle, state, notify_rx) = handle_with_state();

    handle.update(
        &make_snapshot(TransportState::Playing, Some(make_track())),
        Some(7),
    );
    assert!(notify_rx.try_recv().is_ok());
    {
        let s = state.lock().unwrap();
        assert_eq!(s.title.as_deref(), Some("Test Title"));
        assert_eq!(s.artist, vec!["Test Artist".to_string()]);
        assert!(s.url.as_deref().unwrap().ends_with("album/test.mp3"));
        assert!(s.art_url.as_deref().unwrap().ends_with("cover.jpg"));
        assert_eq!(s.length_micros, Some(1_234_567));
        assert_eq!(s.position_micros, 2_500_000);
        assert_eq!(s.volume, 0.25);
        assert!(s.repeat);
        assert_eq!(
            s.track_id.as_ref().map(|p| p.as_str()),
            Some("/org/mpris/MediaPlayer2/track/7")
        );
    }

    handle.update(&make_snapshot(TransportState::Idle, None), None);
    {
        let s = state.lock().unwrap();
        assert_eq!(s.title, None);
        assert!(s.artist.is_empty());
        assert_eq!(s.url, None);
        assert_eq!(s.art_url, None);
        assert_eq!(s.length_micros, None);
        assert!(s.track_id.is_none());
    }
}

#[test]
fn playback_status_maps_transport_state() {
    let (handle, state, _notify_rx) = handle_with_state();
    let (tx, _rx) = mpsc::channel::<ControlCmd>();
    let iface = PlayerIface {
        tx,
        state: state.clone(),
    };

    for (transport, expected) in [
        (TransportState::Idle, "Stopped"),
        (TransportState::Ended, "Stopped"),
        (TransportState::Loading, "Paused"),
        (TransportState::Paused, "Paused"),
        (TransportState::Playing, "Playing"),
    ] {
        handle.update(&make_snapshot(transport, None), None);
        assert_eq!(iface.playback_status(), expected, "{transport:?}");
    }
}

#[test]
fn loop_status_and_volume_setters_forward_commands() {
    let state = Arc::new(Mutex::new(SharedState::default()));
    let (tx, rx) = mpsc::channel::<ControlCmd>();
    let mut iface = PlayerIface {
        tx,
        state: state.clone(),
    };

    assert_eq!(iface.loop_status(), "None");
    state.lock().unwrap().repeat = true;
    assert_eq!(iface.loop_status(), "Track");

    iface.set_loop_status("None".to_string());
    iface.set_loop_status("Playlist".to_string());
    iface.set_volume(1.5);
    assert_eq!(rx.try_recv().unwrap(), ControlCmd::SetRepeat(false));
    assert_eq!(rx.try_recv().unwrap(), ControlCmd::SetRepeat(true));
    assert_eq!(rx.try_recv().unwrap(), ControlCmd::SetVolume(1.0));
}

#[test]
fn set_position_ignores_other_tracks() {
    let (handle, state, _notify_rx) = handle_with_state();
    let (tx, rx) = mpsc::channel::<ControlCmd>();
    let iface = PlayerIface { tx, state };
    handle.update(
        &make_snapshot(TransportState::Playing, Some(make_track())),
        Some(3),
    );

    let other = ObjectPath::try_from("/org/mpris/MediaPlayer2/track/4").unwrap();
    iface.set_position(other, 1_000_000);
    assert!(rx.try_recv().is_err());

    let current = ObjectPath::try_from("/org/mpris/MediaPlayer2/track/3").unwrap();
    iface.set_position(current, 1_000_000);
    assert_eq!(rx.try_recv().unwrap(), ControlCmd::SetPosition(1_000_000));
}

#[test]
fn metadata_includes_expected_keys_when_present() {
    let (handle, state, _notify_rx) = handle_with_state();
    let (tx, _rx) = mpsc::channel::<ControlCmd>();
    let iface = PlayerIface { tx, state };

    assert!(iface.metadata().is_empty());

    handle.update(
        &make_snapshot(TransportState::Playing, Some(make_track())),
        Some(1),
    );
    let map = iface.metadata();
    for k in [
        "mpris:trackid",
        "xesam:title",
        "xesam:artist",
        "xesam:url",
        "mpris:artUrl",
        "mpris:length",
    ] {
        assert!(map.contains_key(k), "missing key: {k}");
    }
}
