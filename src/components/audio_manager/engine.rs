//! Playback engine: owns the audio element, the track cursor, shuffle
//! order and the playback phase. Holds no DOM references; every change is
//! reported as an [`EngineEvent`] for the orchestrator to drain.

use super::media::{MediaElement, PlayRejection};
use super::shuffle::fisher_yates;
use crate::api::models::{Playlist, PlaylistTrack, Track};
use crate::utils::{is_known_duration, normalize_volume};
use rand::Rng;

pub const DEFAULT_VOLUME: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackPhase {
    /// No track loaded.
    #[default]
    Idle,
    /// Source set, metadata pending.
    Loading,
    Playing,
    Paused,
    /// Reached the end on its own; transient until the next load.
    Ended,
}

/// Inputs to the phase machine, mostly media element events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaSignal {
    SourceSet,
    SourceCleared,
    MetadataLoaded,
    Played,
    Paused,
    Ended,
    PlayRefused,
}

/// Why a track is being loaded. The autoplay decision is a pure function
/// of this, see [`should_autoplay`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionReason {
    /// First track of a fresh page view.
    InitialLoad,
    /// The previous track finished on its own.
    NaturalEnd,
    /// Prev/next controls.
    ManualSkip,
    /// A track picked from the list.
    Selection,
    /// Shuffle or unshuffle reordered the list.
    Reorder,
    /// Reloading the track from a persisted snapshot.
    Restore,
}

/// Natural completion always continues; the stored pause intent only
/// matters for the first track of a page view.
pub fn should_autoplay(
    reason: TransitionReason,
    was_playing: bool,
    autoplay_allowed: bool,
    user_paused: bool,
) -> bool {
    match reason {
        TransitionReason::NaturalEnd | TransitionReason::Selection => true,
        TransitionReason::ManualSkip => was_playing,
        TransitionReason::InitialLoad => autoplay_allowed && !user_paused,
        TransitionReason::Reorder | TransitionReason::Restore => false,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    PlaylistChanged,
    TrackChanged {
        index: usize,
        reason: TransitionReason,
    },
    PlayStateChanged {
        playing: bool,
    },
    Progress,
    VolumeChanged,
    ShuffleChanged {
        shuffled: bool,
    },
    DurationProbed {
        index: usize,
    },
    AutoplayBlocked,
    TrackCompleted {
        index: usize,
    },
}

/// Central mutable player state for one page view.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerState {
    pub playlist: Option<Playlist>,
    /// Taken on the first shuffle of the session and kept afterwards.
    pub original_playlist_order: Option<Vec<PlaylistTrack>>,
    pub current_track_index: usize,
    pub current_track: Option<Track>,
    pub is_playing: bool,
    pub current_time: f64,
    pub volume: f64,
    pub is_muted: bool,
    pub last_volume: f64,
    pub user_paused_from_storage: bool,
    pub shuffled: bool,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            playlist: None,
            original_playlist_order: None,
            current_track_index: 0,
            current_track: None,
            is_playing: false,
            current_time: 0.0,
            volume: DEFAULT_VOLUME,
            is_muted: false,
            last_volume: DEFAULT_VOLUME,
            user_paused_from_storage: false,
            shuffled: false,
        }
    }
}

impl PlayerState {
    pub fn track_count(&self) -> usize {
        self.playlist.as_ref().map(Playlist::len).unwrap_or(0)
    }

    pub fn playlist_id(&self) -> Option<&str> {
        self.playlist.as_ref().map(|playlist| playlist.id.as_str())
    }
}

pub struct PlaybackEngine<M> {
    media: M,
    state: PlayerState,
    phase: PlaybackPhase,
    loop_playback: bool,
    autoplay_allowed: bool,
    pending_seek: Option<f64>,
    awaiting_gesture: bool,
    events: Vec<EngineEvent>,
}

impl<M: MediaElement> PlaybackEngine<M> {
    pub fn new(mut media: M) -> Self {
        let state = PlayerState::default();
        media.set_volume(state.volume);
        Self {
            media,
            state,
            phase: PlaybackPhase::Idle,
            loop_playback: false,
            autoplay_allowed: false,
            pending_seek: None,
            awaiting_gesture: false,
            events: Vec::new(),
        }
    }

    pub fn state(&self) -> &PlayerState {
        &self.state
    }

    pub fn phase(&self) -> PlaybackPhase {
        self.phase
    }

    pub fn media(&self) -> &M {
        &self.media
    }

    pub fn media_mut(&mut self) -> &mut M {
        &mut self.media
    }

    pub fn is_awaiting_gesture(&self) -> bool {
        self.awaiting_gesture
    }

    pub fn take_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn set_loop(&mut self, enabled: bool) {
        self.loop_playback = enabled;
    }

    pub fn loop_enabled(&self) -> bool {
        self.loop_playback
    }

    pub fn set_autoplay_allowed(&mut self, allowed: bool) {
        self.autoplay_allowed = allowed;
    }

    pub fn set_user_paused(&mut self, paused: bool) {
        self.state.user_paused_from_storage = paused;
    }

    /// Install a freshly fetched playlist. Nothing is loaded yet.
    pub fn set_playlist(&mut self, playlist: Playlist) {
        self.state.current_track = playlist.track(0).cloned();
        self.state.playlist = Some(playlist);
        self.state.original_playlist_order = None;
        self.state.shuffled = false;
        self.state.current_track_index = 0;
        self.state.current_time = 0.0;
        self.pending_seek = None;
        self.transition(MediaSignal::SourceCleared);
        self.events.push(EngineEvent::PlaylistChanged);
    }

    /// Point the element at `index` and optionally start it. No-op for an
    /// out-of-range index or an empty playlist.
    pub fn load_track(&mut self, index: usize, reason: TransitionReason) -> bool {
        // A play refused by autoplay policy still counts as playing.
        let was_playing = self.state.is_playing || self.awaiting_gesture;
        let Some(track) = self
            .state
            .playlist
            .as_ref()
            .and_then(|playlist| playlist.track(index))
            .cloned()
        else {
            log::debug!("ignoring load of track {index}: not in playlist");
            return false;
        };

        let volume = self.effective_volume();
        self.media.set_src(&track.audio_url);
        self.media.load();
        self.media.set_volume(volume);

        self.state.current_track_index = index;
        self.state.current_track = Some(track);
        self.state.current_time = 0.0;
        self.pending_seek = None;
        self.awaiting_gesture = false;
        // A load resets the element's paused flag without a pause event.
        self.transition(MediaSignal::SourceSet);
        self.events.push(EngineEvent::TrackChanged { index, reason });

        if should_autoplay(
            reason,
            was_playing,
            self.autoplay_allowed,
            self.state.user_paused_from_storage,
        ) {
            self.play_with_retry();
        }
        true
    }

    /// Ask the element to play. A policy refusal comes back through
    /// [`Self::on_play_rejected`].
    pub fn play_with_retry(&mut self) {
        if self.state.current_track.is_none() {
            return;
        }
        self.media.play();
    }

    pub fn on_play_rejected(&mut self, rejection: PlayRejection) {
        match rejection {
            PlayRejection::Aborted => {
                log::debug!("play request superseded by a newer load");
            }
            PlayRejection::NotAllowed => {
                log::info!("autoplay blocked, waiting for a user gesture");
                self.transition(MediaSignal::PlayRefused);
                if !self.awaiting_gesture {
                    self.awaiting_gesture = true;
                    self.events.push(EngineEvent::AutoplayBlocked);
                }
            }
            PlayRejection::Failed => {
                log::warn!("playback failed for track {}", self.state.current_track_index);
                self.transition(MediaSignal::PlayRefused);
            }
        }
    }

    /// Retry a blocked play after the first click, touch or key press.
    pub fn retry_after_gesture(&mut self) -> bool {
        if !self.awaiting_gesture {
            return false;
        }
        self.awaiting_gesture = false;
        if self.state.current_track.is_none() {
            return false;
        }
        self.media.play();
        true
    }

    /// Start or resume the current track.
    pub fn play(&mut self) {
        if self.state.current_track.is_none() {
            return;
        }
        match self.phase {
            PlaybackPhase::Idle | PlaybackPhase::Ended => {
                let index = self.state.current_track_index;
                self.load_track(index, TransitionReason::Selection);
            }
            _ => self.play_with_retry(),
        }
    }

    pub fn pause_track(&mut self) {
        self.awaiting_gesture = false;
        if self.phase == PlaybackPhase::Idle {
            return;
        }
        self.media.pause();
        self.transition(MediaSignal::Paused);
    }

    pub fn next_track(&mut self) -> bool {
        self.advance(TransitionReason::ManualSkip)
    }

    pub fn next_track_with_autoplay(&mut self) -> bool {
        self.advance(TransitionReason::NaturalEnd)
    }

    fn advance(&mut self, reason: TransitionReason) -> bool {
        let len = self.state.track_count();
        if len == 0 {
            return false;
        }
        let current = self.state.current_track_index;
        let target = if current + 1 < len {
            current + 1
        } else if self.loop_playback {
            current
        } else {
            0
        };
        self.load_track(target, reason)
    }

    pub fn prev_track(&mut self) -> bool {
        let len = self.state.track_count();
        if len == 0 {
            return false;
        }
        let current = self.state.current_track_index;
        if current > 0 {
            self.load_track(current - 1, TransitionReason::ManualSkip)
        } else if self.loop_playback {
            self.load_track(len - 1, TransitionReason::ManualSkip)
        } else {
            self.pause_track();
            self.state.current_track_index = 0;
            false
        }
    }

    pub fn select_track(&mut self, index: usize) -> bool {
        self.load_track(index, TransitionReason::Selection)
    }

    pub fn on_media_play(&mut self) {
        self.awaiting_gesture = false;
        self.transition(MediaSignal::Played);
    }

    pub fn on_media_pause(&mut self) {
        self.transition(MediaSignal::Paused);
    }

    pub fn on_loaded_metadata(&mut self) {
        self.transition(MediaSignal::MetadataLoaded);
        let duration = self.media.duration();
        if let Some(seconds) = self.pending_seek.take() {
            if is_known_duration(duration) {
                let target = seconds.clamp(0.0, duration);
                self.media.set_current_time(target);
                self.state.current_time = target;
            }
        }
        if is_known_duration(duration) {
            let missing = self
                .state
                .current_track
                .as_ref()
                .filter(|track| !track.has_known_duration())
                .map(|track| track.id.clone());
            if let Some(track_id) = missing {
                self.update_track_duration(&track_id, duration);
            }
        }
        self.events.push(EngineEvent::Progress);
    }

    pub fn on_time_update(&mut self) {
        let time = self.media.current_time();
        self.state.current_time = if time.is_finite() { time } else { 0.0 };
        self.events.push(EngineEvent::Progress);
    }

    /// Natural completion: always moves on with playback.
    pub fn on_ended(&mut self) {
        self.transition(MediaSignal::Ended);
        self.events.push(EngineEvent::TrackCompleted {
            index: self.state.current_track_index,
        });
        self.next_track_with_autoplay();
    }

    /// Seek once the element knows the duration.
    pub fn seek_when_ready(&mut self, seconds: f64) {
        if !(seconds.is_finite() && seconds > 0.0) {
            return;
        }
        let duration = self.media.duration();
        if matches!(self.phase, PlaybackPhase::Playing | PlaybackPhase::Paused)
            && is_known_duration(duration)
        {
            let target = seconds.clamp(0.0, duration);
            self.media.set_current_time(target);
            self.state.current_time = target;
        } else {
            self.pending_seek = Some(seconds);
        }
    }

    /// Position to persist: a seek still waiting on metadata wins over the
    /// element's clock.
    pub fn resume_position(&self) -> f64 {
        self.pending_seek.unwrap_or(self.state.current_time)
    }

    /// Seek to a fraction of the track, e.g. from a progress-bar click.
    pub fn seek_to_fraction(&mut self, fraction: f64) -> bool {
        let duration = self.duration();
        if !is_known_duration(duration) || !fraction.is_finite() {
            return false;
        }
        let target = fraction.clamp(0.0, 1.0) * duration;
        self.media.set_current_time(target);
        self.state.current_time = target;
        self.events.push(EngineEvent::Progress);
        true
    }

    /// Element duration, else the track's known duration, else NaN.
    pub fn duration(&self) -> f64 {
        let element = self.media.duration();
        if is_known_duration(element) {
            return element;
        }
        self.state
            .current_track
            .as_ref()
            .and_then(|track| track.duration)
            .filter(|d| is_known_duration(*d))
            .unwrap_or(f64::NAN)
    }

    pub fn effective_volume(&self) -> f64 {
        if self.state.is_muted {
            0.0
        } else {
            self.state.volume
        }
    }

    pub fn toggle_mute(&mut self) {
        if self.state.is_muted {
            self.state.is_muted = false;
            self.state.volume = self.state.last_volume;
        } else {
            self.state.last_volume = self.state.volume;
            self.state.is_muted = true;
        }
        let volume = self.effective_volume();
        self.media.set_volume(volume);
        self.events.push(EngineEvent::VolumeChanged);
    }

    /// Slider input. Raising the volume while muted unmutes.
    pub fn set_volume(&mut self, volume: f64) {
        let volume = normalize_volume(volume, self.state.volume);
        self.state.volume = volume;
        if self.state.is_muted && volume > 0.0 {
            self.state.is_muted = false;
        }
        if !self.state.is_muted {
            self.state.last_volume = volume;
        }
        let volume = self.effective_volume();
        self.media.set_volume(volume);
        self.events.push(EngineEvent::VolumeChanged);
    }

    /// Volume and mute state coming from a persisted snapshot.
    pub fn restore_volume(&mut self, volume: f64, muted: bool) {
        let volume = normalize_volume(volume, DEFAULT_VOLUME);
        self.state.volume = volume;
        self.state.last_volume = volume;
        self.state.is_muted = muted;
        let volume = self.effective_volume();
        self.media.set_volume(volume);
        self.events.push(EngineEvent::VolumeChanged);
    }

    pub fn shuffle(&mut self) -> bool {
        self.shuffle_with(&mut rand::thread_rng())
    }

    pub fn shuffle_with<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        let Some(playlist) = self.state.playlist.as_mut() else {
            return false;
        };
        if playlist.is_empty() {
            return false;
        }
        if self.state.original_playlist_order.is_none() {
            self.state.original_playlist_order = Some(playlist.tracks.clone());
        }
        let mut working = playlist.tracks.clone();
        fisher_yates(&mut working, rng);
        playlist.tracks = working;

        self.state.shuffled = true;
        self.events.push(EngineEvent::ShuffleChanged { shuffled: true });
        self.events.push(EngineEvent::PlaylistChanged);
        self.load_track(0, TransitionReason::Reorder)
    }

    /// Restore the pre-shuffle order, keeping the current track current.
    pub fn unshuffle(&mut self) -> bool {
        let Some(original) = self.state.original_playlist_order.clone() else {
            log::warn!("unshuffle requested without a saved original order");
            return false;
        };
        let Some(playlist) = self.state.playlist.as_mut() else {
            return false;
        };

        let current_id = self.state.current_track.as_ref().map(|track| track.id.clone());
        playlist.tracks = original;
        let index = current_id
            .and_then(|id| playlist.position_of_id(&id))
            .unwrap_or(0);

        self.state.shuffled = false;
        self.events.push(EngineEvent::ShuffleChanged { shuffled: false });
        self.events.push(EngineEvent::PlaylistChanged);
        self.load_track(index, TransitionReason::Reorder)
    }

    pub fn toggle_shuffle(&mut self) -> bool {
        if self.state.shuffled {
            self.unshuffle()
        } else {
            self.shuffle()
        }
    }

    /// Record a probed duration on every copy of the track.
    pub fn update_track_duration(&mut self, track_id: &str, duration: f64) -> bool {
        let duration = if is_known_duration(duration) { duration } else { 0.0 };
        let mut index = None;

        if let Some(playlist) = self.state.playlist.as_mut() {
            for (position, entry) in playlist.tracks.iter_mut().enumerate() {
                if entry.track.id == track_id {
                    entry.track.duration = Some(duration);
                    if index.is_none() {
                        index = Some(position);
                    }
                }
            }
        }
        if let Some(original) = self.state.original_playlist_order.as_mut() {
            for entry in original.iter_mut().filter(|entry| entry.track.id == track_id) {
                entry.track.duration = Some(duration);
            }
        }
        if let Some(track) = self
            .state
            .current_track
            .as_mut()
            .filter(|track| track.id == track_id)
        {
            track.duration = Some(duration);
        }

        match index {
            Some(index) => {
                self.events.push(EngineEvent::DurationProbed { index });
                true
            }
            None => false,
        }
    }

    fn transition(&mut self, signal: MediaSignal) {
        use MediaSignal as S;
        use PlaybackPhase as P;

        let next = match (self.phase, signal) {
            (_, S::SourceCleared) => P::Idle,
            (_, S::SourceSet) => P::Loading,
            (P::Idle, _) => P::Idle,
            (P::Loading, S::MetadataLoaded) => P::Paused,
            (phase, S::MetadataLoaded) => phase,
            (_, S::Played) => P::Playing,
            (P::Loading, S::Paused) => P::Loading,
            (_, S::Paused) => P::Paused,
            (_, S::Ended) => P::Ended,
            (P::Playing, S::PlayRefused) => P::Paused,
            (phase, S::PlayRefused) => phase,
        };

        if next != self.phase {
            log::debug!("playback phase {:?} -> {:?} on {:?}", self.phase, next, signal);
            self.phase = next;
        }

        let playing = next == P::Playing;
        if playing != self.state.is_playing {
            self.state.is_playing = playing;
            self.events.push(EngineEvent::PlayStateChanged { playing });
        }
    }
}
