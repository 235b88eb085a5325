//! UI rendering helpers for the terminal user interface.
//!
//! This module renders the queue, the now-playing panel and the key help
//! using `ratatui`. Everything shown about playback comes from the last
//! `PlayerSnapshot` the app received.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Modifier, Style, Stylize},
    widgets::{Block, Borders, Gauge, List, ListItem, Padding, Paragraph, Wrap},
};
use std::{collections::BTreeMap, sync::LazyLock, time::Duration};

use crate::app::App;
use crate::config::{ControlsSettings, LibrarySettings, UiSettings};
use crate::library::display_from_fields;
use crate::transport::{PlayerSnapshot, TransportState};

static CONTROLS_MAP: LazyLock<BTreeMap<&'static str, &'static str>> = LazyLock::new(|| {
    let mut map = BTreeMap::new();
    map.insert("j/k", "up/down");
    map.insert("gg/G", "top/bottom");
    map.insert("enter", "play selected");
    map.insert("space/p", "play/pause");
    map.insert("h/l", "prev/next");
    // H/L is filled dynamically from config.
    map.insert("+/-", "volume");
    map.insert("m", "mute");
    map.insert("r", "repeat");
    map.insert("s", "stop");
    map.insert("f", "follow playing");
    map.insert("q", "quit");
    map
});

/// Render the controls help text, incorporating scrub seconds.
pub fn controls_text(scrub_seconds: u64) -> String {
    let order = [
        "j/k", "h/l", "H/L", "enter", "space/p", "+/-", "m", "r", "s", "gg/G", "f", "q",
    ];
    order
        .iter()
        .filter_map(|k| {
            if *k == "H/L" {
                Some(format!("[H/L] scrub -/+{}s", scrub_seconds))
            } else {
                CONTROLS_MAP.get(*k).map(|v| format!("[{}] {}", k, v))
            }
        })
        .collect::<Vec<String>>()
        .join(" | ")
}

/// Fraction of the track played, in `0.0..=1.0`. Unknown or zero durations give 0.
pub fn progress_ratio(elapsed: Duration, duration: Option<Duration>) -> f64 {
    match duration {
        Some(d) if !d.is_zero() => (elapsed.as_secs_f64() / d.as_secs_f64()).clamp(0.0, 1.0),
        _ => 0.0,
    }
}

pub fn state_icon(state: TransportState) -> &'static str {
    match state {
        TransportState::Playing => "▶",
        TransportState::Paused => "⏸",
        TransportState::Loading => "…",
        TransportState::Idle | TransportState::Ended => "■",
    }
}

/// Flags and volume shown next to the progress bar.
pub fn indicators_text(snapshot: &PlayerSnapshot) -> String {
    let volume = if snapshot.muted {
        "MUTED".to_string()
    } else {
        format!("VOL {:>3}%", (snapshot.volume * 100.0).round() as u32)
    };
    let repeat = if snapshot.repeat { "REPEAT: on" } else { "REPEAT: off" };
    format!("{repeat} • {volume}")
}

/// The `elapsed / duration` label of the progress bar.
pub fn time_label(snapshot: &PlayerSnapshot) -> String {
    format!(
        "{} / {}",
        snapshot.elapsed_display, snapshot.duration_display
    )
}

/// Render the entire UI into the provided `frame` using `app` state and settings.
pub fn draw(
    frame: &mut Frame,
    app: &App,
    ui_settings: &UiSettings,
    library_settings: &LibrarySettings,
    controls_settings: &ControlsSettings,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(5),
            Constraint::Min(1),
            Constraint::Length(4),
        ])
        .split(frame.area());

    let header = Paragraph::new(ui_settings.header_text.as_str())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" encore ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, chunks[0]);

    // Now playing
    {
        let block = Block::bordered()
            .padding(Padding {
                left: 1,
                right: 1,
                top: 0,
                bottom: 0,
            })
            .title(" now playing ");
        let inner = block.inner(chunks[1]);
        frame.render_widget(block, chunks[1]);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(inner);

        match app.snapshot.as_ref() {
            Some(snap) => {
                let song = snap
                    .track
                    .as_ref()
                    .map(|t| {
                        display_from_fields(
                            t,
                            &ui_settings.now_playing_fields,
                            &ui_settings.now_playing_separator,
                        )
                    })
                    .unwrap_or_else(|| "Nothing playing".to_string());
                let line = format!("{} {} [{}]", state_icon(snap.state), song, snap.state.name());
                frame.render_widget(Paragraph::new(line), rows[0]);

                let gauge = Gauge::default()
                    .ratio(progress_ratio(snap.elapsed, snap.duration))
                    .label(time_label(snap))
                    .gauge_style(Style::default().add_modifier(Modifier::BOLD));
                frame.render_widget(gauge, rows[1]);

                let mut status = indicators_text(snap);
                if let Some(notice) = &snap.notice {
                    status.push_str(" • ");
                    status.push_str(notice);
                }
                let status_par = Paragraph::new(status);
                let status_par = if snap.notice.is_some() {
                    status_par.red()
                } else {
                    status_par
                };
                frame.render_widget(status_par, rows[2]);
            }
            None => frame.render_widget(Paragraph::new("Starting…"), rows[0]),
        }
    }

    // Queue
    {
        // Center the selected item when possible by creating a visible window.
        let total = app.tracks.len();
        let list_height = chunks[2].height.saturating_sub(2) as usize;
        let sel_pos = app.selected.min(total.saturating_sub(1));
        let (start, end, selected_pos_in_visible) = if total <= list_height || list_height == 0 {
            (0, total, sel_pos)
        } else {
            let half = list_height / 2;
            let mut start = sel_pos.saturating_sub(half);
            if start + list_height > total {
                start = total - list_height;
            }
            (start, start + list_height, sel_pos - start)
        };

        let active = app.active_index();
        let visible_items: Vec<ListItem> = (start..end)
            .map(|i| {
                let text = display_from_fields(
                    &app.tracks[i],
                    &library_settings.display_fields,
                    &library_settings.display_separator,
                );
                if active == Some(i) {
                    ListItem::new(format!("♪ {text}")).bold()
                } else {
                    ListItem::new(format!("  {text}"))
                }
            })
            .collect();

        let title = if app.follow_playback {
            " queue (follow) "
        } else {
            " queue "
        };
        let list = List::new(visible_items)
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");
        let mut state = ratatui::widgets::ListState::default();
        if total > 0 {
            state.select(Some(selected_pos_in_visible));
        }
        frame.render_stateful_widget(list, chunks[2], &mut state);
    }

    let footer_text = controls_text(controls_settings.scrub_seconds);
    let footer = Paragraph::new(footer_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" controls ")
                .padding(Padding {
                    left: 1,
                    right: 0,
                    top: 0,
                    bottom: 0,
                }),
        )
        .wrap(Wrap { trim: true });

    frame.render_widget(footer, chunks[3]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timefmt::split_duration;

    fn snap(elapsed: u64, duration: Option<u64>) -> PlayerSnapshot {
        let elapsed = Duration::from_secs(elapsed);
        let duration = duration.map(Duration::from_secs);
        PlayerSnapshot {
            state: TransportState::Playing,
            track: None,
            active_id: None,
            elapsed,
            duration,
            elapsed_display: split_duration(Some(elapsed)),
            duration_display: split_duration(duration),
            playing: true,
            volume: 0.5,
            repeat: false,
            muted: false,
            notice: None,
        }
    }

    #[test]
    fn controls_text_includes_scrub_seconds_and_core_keys() {
        let text = controls_text(7);
        assert!(text.contains("[H/L] scrub -/+7s"));
        assert!(text.contains("[space/p] play/pause"));
        assert!(text.contains("[m] mute"));
        assert!(text.starts_with("[j/k]"));
    }

    #[test]
    fn progress_ratio_handles_unknown_and_overrun() {
        let s = Duration::from_secs;
        assert_eq!(progress_ratio(s(30), Some(s(120))), 0.25);
        assert_eq!(progress_ratio(s(30), None), 0.0);
        assert_eq!(progress_ratio(s(30), Some(Duration::ZERO)), 0.0);
        assert_eq!(progress_ratio(s(500), Some(s(120))), 1.0);
    }

    #[test]
    fn time_label_uses_placeholder_until_loaded() {
        assert_eq!(time_label(&snap(0, None)), "0:00 / 0:00");
        assert_eq!(time_label(&snap(65, Some(200))), "1:05 / 3:20");
    }

    #[test]
    fn indicators_show_volume_or_mute() {
        let mut s = snap(0, None);
        assert_eq!(indicators_text(&s), "REPEAT: off • VOL  50%");
        s.muted = true;
        s.repeat = true;
        assert_eq!(indicators_text(&s), "REPEAT: on • MUTED");
    }

    #[test]
    fn icons_follow_state() {
        assert_eq!(state_icon(TransportState::Playing), "▶");
        assert_eq!(state_icon(TransportState::Paused), "⏸");
        assert_eq!(state_icon(TransportState::Idle), "■");
    }
}
