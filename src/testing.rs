//! In-memory doubles for the browser seams, shared by unit and
//! integration tests.

use crate::api::models::{Playlist, PlaylistTrack, Track};
use crate::components::audio_manager::MediaElement;
use crate::components::player::view::{ControlState, PlayerView, ProgressDisplay, TrackRow};
use crate::plan::PlanDecision;

/// Records every request. Media events are delivered by the test itself.
#[derive(Debug, Clone)]
pub struct FakeMedia {
    pub src: String,
    pub loads: usize,
    pub play_requests: usize,
    pub pause_calls: usize,
    pub volume: f64,
    pub current_time: f64,
    pub duration: f64,
    pub paused: bool,
}

impl Default for FakeMedia {
    fn default() -> Self {
        Self {
            src: String::new(),
            loads: 0,
            play_requests: 0,
            pause_calls: 0,
            volume: 1.0,
            current_time: 0.0,
            duration: f64::NAN,
            paused: true,
        }
    }
}

impl MediaElement for FakeMedia {
    fn set_src(&mut self, url: &str) {
        self.src = url.to_string();
    }

    fn load(&mut self) {
        self.loads += 1;
        self.current_time = 0.0;
        self.duration = f64::NAN;
        self.paused = true;
    }

    fn play(&mut self) {
        self.play_requests += 1;
        self.paused = false;
    }

    fn pause(&mut self) {
        self.pause_calls += 1;
        self.paused = true;
    }

    fn set_volume(&mut self, volume: f64) {
        self.volume = volume;
    }

    fn volume(&self) -> f64 {
        self.volume
    }

    fn set_current_time(&mut self, seconds: f64) {
        self.current_time = seconds;
    }

    fn current_time(&self) -> f64 {
        self.current_time
    }

    fn duration(&self) -> f64 {
        self.duration
    }

    fn paused(&self) -> bool {
        self.paused
    }
}

/// Keeps the latest value pushed through each [`PlayerView`] method.
#[derive(Debug, Clone, Default)]
pub struct RecordingView {
    pub decision: Option<PlanDecision>,
    pub rows: Vec<TrackRow>,
    pub renders: usize,
    pub empty_message: Option<String>,
    pub highlighted: Option<usize>,
    pub track_title: Option<String>,
    pub playing: bool,
    pub progress: Option<ProgressDisplay>,
    pub volume: Option<(f64, bool)>,
    pub shuffled: bool,
    pub controls: ControlState,
    pub duration_labels: Vec<(usize, String)>,
    pub marquee_refreshes: usize,
}

impl PlayerView for RecordingView {
    fn apply_decision(&mut self, decision: &PlanDecision) {
        self.decision = Some(decision.clone());
    }

    fn render_playlist(&mut self, rows: &[TrackRow]) {
        self.rows = rows.to_vec();
        self.renders += 1;
        self.empty_message = None;
    }

    fn show_empty(&mut self, message: &str) {
        self.rows.clear();
        self.empty_message = Some(message.to_string());
    }

    fn highlight_track(&mut self, index: usize) {
        self.highlighted = Some(index);
        for row in &mut self.rows {
            row.active = row.index == index;
        }
    }

    fn show_track(&mut self, track: &Track) {
        self.track_title = Some(track.title.clone());
    }

    fn set_playing(&mut self, playing: bool) {
        self.playing = playing;
    }

    fn set_progress(&mut self, progress: &ProgressDisplay) {
        self.progress = Some(progress.clone());
    }

    fn set_volume(&mut self, volume: f64, muted: bool) {
        self.volume = Some((volume, muted));
    }

    fn set_shuffle(&mut self, shuffled: bool) {
        self.shuffled = shuffled;
    }

    fn set_controls(&mut self, controls: ControlState) {
        self.controls = controls;
    }

    fn update_track_duration(&mut self, index: usize, label: &str) {
        self.duration_labels.push((index, label.to_string()));
        if let Some(row) = self.rows.iter_mut().find(|row| row.index == index) {
            row.duration_label = Some(label.to_string());
        }
    }

    fn refresh_marquee(&mut self) {
        self.marquee_refreshes += 1;
    }
}

pub fn sample_track(id: &str) -> Track {
    Track {
        id: id.to_string(),
        title: format!("Track {id}"),
        artist: format!("Artist {id}"),
        album_art: None,
        audio_url: format!("https://cdn.example/{id}.mp3"),
        duration: None,
        file_size: None,
    }
}

/// A playlist whose tracks appear in the given order.
pub fn sample_playlist(ids: &[&str]) -> Playlist {
    Playlist {
        id: "pl-main".to_string(),
        name: "Main".to_string(),
        tracks: ids
            .iter()
            .enumerate()
            .map(|(order, id)| PlaylistTrack {
                order: order as i64,
                track: sample_track(id),
            })
            .collect(),
    }
}
