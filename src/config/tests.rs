use super::load::{default_config_path, default_state_dir, resolve_config_path};
use super::schema::*;
use std::sync::{Mutex, OnceLock};

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn env_lock() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

struct EnvGuard {
    key: &'static str,
    old: Option<std::ffi::OsString>,
}

impl EnvGuard {
    fn set(key: &'static str, val: &str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::set_var(key, val);
        }
        Self { key, old }
    }

    fn remove(key: &'static str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::remove_var(key);
        }
        Self { key, old }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        match self.old.take() {
            Some(v) => unsafe {
                std::env::set_var(self.key, v);
            },
            None => unsafe {
                std::env::remove_var(self.key);
            },
        }
    }
}

#[test]
fn resolve_config_path_prefers_encore_config_path() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("ENCORE_CONFIG_PATH", "/tmp/encore-test-config.toml");
    assert_eq!(
        resolve_config_path().unwrap(),
        std::path::PathBuf::from("/tmp/encore-test-config.toml")
    );
}

#[test]
fn default_config_path_prefers_xdg_config_home() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("XDG_CONFIG_HOME", "/tmp/xdg-config-home");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-should-not-win");

    let p = default_config_path().unwrap();
    assert_eq!(
        p,
        std::path::PathBuf::from("/tmp/xdg-config-home")
            .join("encore")
            .join("config.toml")
    );
}

#[test]
fn default_config_path_falls_back_to_home_dot_config() {
    let _lock = env_lock();
    let _g1 = EnvGuard::remove("XDG_CONFIG_HOME");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-dir");

    let p = default_config_path().unwrap();
    assert_eq!(
        p,
        std::path::PathBuf::from("/tmp/home-dir")
            .join(".config")
            .join("encore")
            .join("config.toml")
    );
}

#[test]
fn default_state_dir_precedence() {
    let _lock = env_lock();
    let _g0 = EnvGuard::remove("ENCORE_STATE_DIR");
    let _g1 = EnvGuard::remove("XDG_STATE_HOME");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-dir");
    assert_eq!(
        default_state_dir().unwrap(),
        std::path::PathBuf::from("/tmp/home-dir/.local/state/encore")
    );

    let _g3 = EnvGuard::set("XDG_STATE_HOME", "/tmp/xdg-state");
    assert_eq!(
        default_state_dir().unwrap(),
        std::path::PathBuf::from("/tmp/xdg-state/encore")
    );

    let _g4 = EnvGuard::set("ENCORE_STATE_DIR", "/tmp/explicit-state");
    assert_eq!(
        default_state_dir().unwrap(),
        std::path::PathBuf::from("/tmp/explicit-state")
    );
}

#[test]
fn settings_load_from_config_file() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[playback]
repeat = true
tick_ms = 500
autoplay = true

[audio]
initial_volume = 0.4
volume_step = 0.1
fetch_timeout_ms = 1000

[controls]
scrub_seconds = 9
debounce_ms = 150

[ui]
header_text = "hello"
now_playing_fields = ["artist", "title"]
now_playing_separator = " • "

[library]
extensions = ["mp3"]
recursive = false
include_hidden = false
follow_links = false
display_fields = ["id"]
display_separator = "::"

[log]
level = "debug"
file = "/tmp/encore-test.log"
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("ENCORE_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::remove("ENCORE__CONTROLS__DEBOUNCE_MS");

    let s = Settings::load().unwrap();
    assert!(s.playback.repeat);
    assert!(s.playback.autoplay);
    assert_eq!(s.playback.tick_ms, 500);
    assert_eq!(s.audio.initial_volume, 0.4);
    assert_eq!(s.audio.volume_step, 0.1);
    assert_eq!(s.audio.fetch_timeout_ms, 1000);
    assert_eq!(s.controls.scrub_seconds, 9);
    assert_eq!(s.controls.debounce_ms, 150);
    assert_eq!(s.ui.header_text, "hello");
    assert_eq!(
        s.ui.now_playing_fields,
        vec![TrackDisplayField::Author, TrackDisplayField::Title]
    );
    assert_eq!(s.ui.now_playing_separator, " • ");
    assert_eq!(s.library.extensions, vec!["mp3".to_string()]);
    assert!(!s.library.recursive);
    assert!(!s.library.include_hidden);
    assert!(!s.library.follow_links);
    assert_eq!(s.library.display_separator, "::");
    assert_eq!(s.library.display_fields, vec![TrackDisplayField::Id]);
    assert_eq!(s.log.level, "debug");
    assert_eq!(
        s.log.file.as_deref(),
        Some(std::path::Path::new("/tmp/encore-test.log"))
    );
    assert!(s.validate().is_ok());
}

#[test]
fn settings_env_overrides_config_file() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[controls]
debounce_ms = 300
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("ENCORE_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::set("ENCORE__CONTROLS__DEBOUNCE_MS", "0");

    let s = Settings::load().unwrap();
    assert_eq!(s.controls.debounce_ms, 0);
}

#[test]
fn validate_rejects_out_of_range_values() {
    let mut s = Settings::default();
    assert!(s.validate().is_ok());

    s.audio.initial_volume = 1.5;
    assert!(s.validate().is_err());

    s = Settings::default();
    s.audio.volume_step = 0.0;
    assert!(s.validate().is_err());

    s = Settings::default();
    s.playback.tick_ms = 10;
    assert!(s.validate().is_err());
}
