//! The capability interface the orchestrator renders through, plus the
//! pure shaping of what gets rendered.

use crate::api::models::{PlaylistTrack, Track};
use crate::plan::{Appearance, PlanDecision};
use crate::utils::{format_duration, format_time, progress_percent};

/// Pixels per second the marquee scrolls at.
const MARQUEE_SPEED_PX: f64 = 40.0;
const MARQUEE_MIN_SECS: f64 = 6.0;

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressDisplay {
    pub percent: f64,
    pub current_label: String,
    pub duration_label: String,
}

impl ProgressDisplay {
    pub fn new(current_time: f64, duration: f64) -> Self {
        Self {
            percent: progress_percent(current_time, duration),
            current_label: format_time(current_time),
            duration_label: format_duration(duration),
        }
    }
}

/// One rendered `.track-item`. `index` is the playback-order index.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackRow {
    pub index: usize,
    pub title: String,
    pub artist: Option<String>,
    pub duration_label: Option<String>,
    pub active: bool,
}

/// Rows for the list, truncated to `maxVisibleTracks`. Playback still
/// covers the whole playlist.
pub fn track_rows(
    tracks: &[PlaylistTrack],
    active_index: usize,
    appearance: &Appearance,
) -> Vec<TrackRow> {
    let limit = appearance.max_visible_tracks.unwrap_or(tracks.len());
    tracks
        .iter()
        .take(limit)
        .enumerate()
        .map(|(index, entry)| TrackRow {
            index,
            title: display_title(&entry.track),
            artist: appearance
                .show_artist_name
                .then(|| entry.track.artist.clone())
                .filter(|artist| !artist.trim().is_empty()),
            duration_label: appearance
                .show_track_duration
                .then(|| duration_label(&entry.track)),
            active: index == active_index,
        })
        .collect()
}

pub fn display_title(track: &Track) -> String {
    if track.title.trim().is_empty() {
        "Untitled".to_string()
    } else {
        track.title.clone()
    }
}

pub fn duration_label(track: &Track) -> String {
    format_duration(track.duration.unwrap_or(f64::NAN))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControlState {
    pub can_play: bool,
    pub can_skip: bool,
    pub can_shuffle: bool,
}

pub fn control_state(track_count: usize) -> ControlState {
    ControlState {
        can_play: track_count > 0,
        can_skip: track_count > 1,
        can_shuffle: track_count > 1,
    }
}

/// Text wider than its box scrolls.
pub fn needs_marquee(content_width: f64, container_width: f64) -> bool {
    container_width > 0.0 && content_width > container_width + 1.0
}

pub fn marquee_duration_secs(content_width: f64) -> f64 {
    (content_width / MARQUEE_SPEED_PX).max(MARQUEE_MIN_SECS)
}

/// What the orchestrator needs from the markup. Every method must be safe
/// to call repeatedly and must no-op when its elements are absent.
pub trait PlayerView {
    fn apply_decision(&mut self, decision: &PlanDecision);
    fn render_playlist(&mut self, rows: &[TrackRow]);
    fn show_empty(&mut self, message: &str);
    fn highlight_track(&mut self, index: usize);
    fn show_track(&mut self, track: &Track);
    fn set_playing(&mut self, playing: bool);
    fn set_progress(&mut self, progress: &ProgressDisplay);
    fn set_volume(&mut self, volume: f64, muted: bool);
    fn set_shuffle(&mut self, shuffled: bool);
    fn set_controls(&mut self, controls: ControlState);
    fn update_track_duration(&mut self, index: usize, label: &str);
    /// Re-measure scrolling titles after layout changes.
    fn refresh_marquee(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_playlist;

    #[test]
    fn rows_respect_visibility_and_limit() {
        let playlist = sample_playlist(&["a", "b", "c", "d"]);
        let appearance = Appearance {
            max_visible_tracks: Some(2),
            show_artist_name: false,
            ..Appearance::default()
        };
        let rows = track_rows(&playlist.tracks, 1, &appearance);
        assert_eq!(rows.len(), 2);
        assert!(rows[1].active);
        assert!(rows[0].artist.is_none());
        assert_eq!(rows[0].duration_label.as_deref(), Some("--:--"));
    }

    #[test]
    fn rows_without_limit_cover_playlist() {
        let playlist = sample_playlist(&["a", "b", "c"]);
        let rows = track_rows(&playlist.tracks, 0, &Appearance::default());
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2].index, 2);
        assert_eq!(rows[0].artist.as_deref(), Some("Artist a"));
    }

    #[test]
    fn controls_follow_track_count() {
        assert_eq!(control_state(0), ControlState::default());
        let single = control_state(1);
        assert!(single.can_play && !single.can_skip && !single.can_shuffle);
        assert!(control_state(2).can_shuffle);
    }

    #[test]
    fn marquee_only_for_overflowing_text() {
        assert!(!needs_marquee(100.0, 120.0));
        assert!(!needs_marquee(100.0, 0.0));
        assert!(needs_marquee(300.0, 120.0));
        assert_eq!(marquee_duration_secs(80.0), MARQUEE_MIN_SECS);
        assert_eq!(marquee_duration_secs(400.0), 10.0);
    }

    #[test]
    fn progress_display_uses_sentinels() {
        let unknown = ProgressDisplay::new(12.0, f64::NAN);
        assert_eq!(unknown.percent, 0.0);
        assert_eq!(unknown.current_label, "0:12");
        assert_eq!(unknown.duration_label, "--:--");
    }
}
