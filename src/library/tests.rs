use std::time::Duration;

use super::*;
use crate::config::TrackDisplayField;

fn track(id: &str, title: &str, author: &str) -> Track {
    Track {
        id: id.into(),
        title: title.into(),
        author: author.into(),
        audio_url: format!("https://cdn.example.com/{id}.mp3"),
        artwork_url: None,
        duration: None,
    }
}

#[test]
fn display_from_fields_can_format_author_title() {
    let t = track("a", "Song", "  Artist  ");
    assert_eq!(
        display_from_fields(&t, &[TrackDisplayField::Author, TrackDisplayField::Title], " - "),
        "Artist - Song"
    );

    let nameless = track("a", "Song", " ");
    assert_eq!(
        display_from_fields(
            &nameless,
            &[TrackDisplayField::Author, TrackDisplayField::Title],
            " - "
        ),
        "Song"
    );
    assert_eq!(display_from_fields(&t, &[], " - "), "Song");
}

#[test]
fn library_resolves_by_id_and_keeps_insertion_order() {
    let lib = Library::new(vec![
        track("b", "Bee", "X"),
        track("a", "Ay", "Y"),
        track("b", "Duplicate", "Z"),
    ]);
    assert_eq!(lib.len(), 2);
    assert_eq!(lib.ids(), vec!["b".to_string(), "a".to_string()]);
    assert_eq!(lib.resolve("a").unwrap().title, "Ay");
    assert_eq!(lib.resolve("b").unwrap().title, "Bee");
    assert!(lib.resolve("missing").is_none());
}

#[test]
fn parse_manifest_reads_remote_tracks() {
    let text = r#"
        [[track]]
        id = "a1"
        title = "First"
        author = "Someone"
        url = "https://cdn.example.com/a1.mp3"
        artwork = "https://cdn.example.com/a1.jpg"
        duration_secs = 90.5

        [[track]]
        id = "a2"
        title = "Second"
        url = "https://cdn.example.com/a2.mp3"
    "#;
    let tracks = parse_manifest(text).unwrap();
    assert_eq!(tracks.len(), 2);
    assert_eq!(tracks[0].author, "Someone");
    assert_eq!(
        tracks[0].artwork_url.as_deref(),
        Some("https://cdn.example.com/a1.jpg")
    );
    assert_eq!(tracks[0].duration, Some(Duration::from_secs_f64(90.5)));
    assert_eq!(tracks[1].author, "Unknown artist");
    assert_eq!(tracks[1].duration, None);
}

#[test]
fn parse_manifest_rejects_duplicate_ids() {
    let text = r#"
        [[track]]
        id = "a1"
        title = "First"
        url = "https://x/a.mp3"

        [[track]]
        id = "a1"
        title = "Again"
        url = "https://x/b.mp3"
    "#;
    assert!(matches!(
        parse_manifest(text),
        Err(CatalogError::DuplicateId(id)) if id == "a1"
    ));
}

#[test]
fn parse_manifest_rejects_missing_locator() {
    let text = r#"
        [[track]]
        id = "a1"
        title = "First"
        url = "  "
    "#;
    assert!(matches!(
        parse_manifest(text),
        Err(CatalogError::MissingLocator(id)) if id == "a1"
    ));
}

#[test]
fn open_reads_manifest_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tracks.toml");
    std::fs::write(
        &path,
        "[[track]]\nid = \"x\"\ntitle = \"X\"\nurl = \"https://x/x.mp3\"\n",
    )
    .unwrap();

    let lib = Library::open(&path, &crate::config::LibrarySettings::default()).unwrap();
    assert_eq!(lib.ids(), vec!["x".to_string()]);
}

#[test]
fn parse_manifest_drops_unusable_duration_hints() {
    let text = r#"
        [[track]]
        id = "neg"
        title = "Negative"
        url = "https://x/neg.mp3"
        duration_secs = -1.0

        [[track]]
        id = "nan"
        title = "Not a number"
        url = "https://x/nan.mp3"
        duration_secs = nan

        [[track]]
        id = "huge"
        title = "Too long"
        url = "https://x/huge.mp3"
        duration_secs = 1e30

        [[track]]
        id = "ok"
        title = "Fine"
        url = "https://x/ok.mp3"
        duration_secs = 12.0
    "#;
    let tracks = parse_manifest(text).unwrap();
    assert_eq!(tracks.len(), 4);
    assert!(tracks[..3].iter().all(|t| t.duration.is_none()));
    assert_eq!(tracks[3].duration, Some(Duration::from_secs(12)));
}

#[test]
fn open_on_an_audio_file_scans_its_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.mp3"), b"not really audio").unwrap();
    std::fs::write(dir.path().join("b.mp3"), b"not really audio").unwrap();

    let lib = Library::open(
        &dir.path().join("a.mp3"),
        &crate::config::LibrarySettings::default(),
    )
    .unwrap();
    let mut ids = lib.ids();
    ids.sort();
    assert_eq!(ids, vec!["a.mp3".to_string(), "b.mp3".to_string()]);
}
