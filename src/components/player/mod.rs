//! The player orchestrator. Bridges the engine, persistence, the plan
//! rules and a [`PlayerView`]; everything the host page must do later
//! (timers, network, gesture listeners) is queued as a [`HostEffect`].

pub mod controls;
pub mod view;

#[cfg(target_arch = "wasm32")]
pub mod dom_view;

use crate::api::models::Track;
use crate::api::storefront::{
    probe_schedule, AnalyticsEvent, AnalyticsKind, PlaylistSelection, ProbeRequest,
};
use crate::components::audio_manager::{
    EngineEvent, MediaElement, PlayRejection, PlaybackEngine, PlayerState, TransitionReason,
};
use crate::components::navigation::{Location, NavigationWatcher};
use crate::config::PlayerSettings;
use crate::db::{KeyValueStore, PlaybackSnapshot, PlaybackStore};
use crate::plan::{self, PlanDecision};
use chrono::Utc;
use std::time::Duration;
use view::{control_state, duration_label, track_rows, PlayerView, ProgressDisplay};

/// Delay before resuming a persisted session, giving the new page time to
/// settle.
pub const RESUME_DELAY: Duration = Duration::from_millis(1000);

/// Work the orchestrator needs the host page to carry out.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEffect {
    /// Listen for the next click, touch or key press and call
    /// [`MusicPlayer::on_user_gesture`].
    ArmGestureRetry,
    /// Call [`MusicPlayer::resume_playback`] after the delay.
    ScheduleResume(Duration),
    /// Probe each URL off-DOM and report through
    /// [`MusicPlayer::on_duration_probed`].
    ProbeDurations(Vec<ProbeRequest>),
    SendAnalytics(AnalyticsEvent),
}

pub struct MusicPlayer<M, V, S> {
    engine: PlaybackEngine<M>,
    view: V,
    store: PlaybackStore<S>,
    settings: PlayerSettings,
    decision: PlanDecision,
    navigation: NavigationWatcher,
    shop: String,
    session_id: String,
    pending_resume: bool,
    effects: Vec<HostEffect>,
}

impl<M, V, S> MusicPlayer<M, V, S>
where
    M: MediaElement,
    V: PlayerView,
    S: KeyValueStore,
{
    pub fn new(
        media: M,
        view: V,
        backend: S,
        settings: PlayerSettings,
        shop: impl Into<String>,
        location: &Location,
    ) -> Self {
        let decision = plan::evaluate(&settings, &location.path);
        let store = PlaybackStore::new(backend);

        let mut engine = PlaybackEngine::new(media);
        engine.set_loop(decision.loop_playback);
        engine.set_autoplay_allowed(decision.autoplay_allowed);
        engine.set_user_paused(store.user_paused());

        let mut player = Self {
            engine,
            view,
            store,
            settings,
            decision,
            navigation: NavigationWatcher::new(location.href.clone()),
            shop: shop.into(),
            session_id: uuid::Uuid::new_v4().to_string(),
            pending_resume: false,
            effects: Vec::new(),
        };
        player.view.apply_decision(&player.decision);
        player.view.set_controls(control_state(0));
        let state = player.engine.state();
        player.view.set_volume(state.volume, state.is_muted);
        player
    }

    pub fn state(&self) -> &PlayerState {
        self.engine.state()
    }

    pub fn engine(&self) -> &PlaybackEngine<M> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut PlaybackEngine<M> {
        &mut self.engine
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn store(&self) -> &PlaybackStore<S> {
        &self.store
    }

    pub fn decision(&self) -> &PlanDecision {
        &self.decision
    }

    pub fn settings(&self) -> &PlayerSettings {
        &self.settings
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn is_resume_pending(&self) -> bool {
        self.pending_resume
    }

    pub fn take_effects(&mut self) -> Vec<HostEffect> {
        std::mem::take(&mut self.effects)
    }

    /// Install the fetched playlist, or show the empty state.
    pub fn on_playlist_loaded(&mut self, selection: PlaylistSelection) {
        let playlist = match selection {
            PlaylistSelection::Ready(playlist) => playlist,
            PlaylistSelection::Empty(message) => {
                log::info!("player has nothing to play: {message}");
                self.view.show_empty(message);
                self.view.set_controls(control_state(0));
                return;
            }
        };

        let probes = probe_schedule(&playlist);
        log::debug!(
            "loaded playlist {} with {} track(s)",
            playlist.id,
            playlist.len()
        );
        self.engine.set_playlist(playlist);

        // Read once per page view, after the playlist is known.
        match self.store.restore() {
            Some(snapshot) => self.restore_playback(snapshot),
            None => {
                self.engine.load_track(0, TransitionReason::InitialLoad);
            }
        }

        if !probes.is_empty() {
            self.effects.push(HostEffect::ProbeDurations(probes));
        }
        self.sync();
    }

    fn restore_playback(&mut self, snapshot: PlaybackSnapshot) {
        self.engine.restore_volume(snapshot.volume, snapshot.is_muted);

        let state = self.engine.state();
        let same_playlist = match (snapshot.playlist_id.as_deref(), state.playlist_id()) {
            (Some(saved), Some(current)) => saved == current,
            (None, _) => true,
            (Some(_), None) => false,
        };
        let index = if same_playlist {
            state.playlist.as_ref().and_then(|playlist| {
                snapshot
                    .audio_url
                    .as_deref()
                    .and_then(|url| playlist.position_of_url(url))
                    .or_else(|| {
                        snapshot
                            .track_id
                            .as_deref()
                            .and_then(|id| playlist.position_of_id(id))
                    })
            })
        } else {
            log::info!("saved session belongs to another playlist, keeping volume only");
            None
        };

        match index {
            Some(index) => {
                self.engine.load_track(index, TransitionReason::Restore);
                self.engine.seek_when_ready(snapshot.current_time);
            }
            None => {
                if same_playlist {
                    log::debug!("saved track is gone, starting from the first track");
                }
                self.engine.load_track(0, TransitionReason::Restore);
            }
        }

        if self.decision.is_free_plan {
            self.engine.pause_track();
            return;
        }
        if self.decision.persistent_playback
            && self.decision.playback_allowed
            && (snapshot.is_playing || snapshot.should_resume)
        {
            self.pending_resume = true;
            self.effects.push(HostEffect::ScheduleResume(RESUME_DELAY));
        }
    }

    /// The delayed half of a persistent-session restore. Does nothing when
    /// the shopper acted in the meantime.
    pub fn resume_playback(&mut self) -> bool {
        if !std::mem::take(&mut self.pending_resume) {
            log::debug!("scheduled resume superseded");
            return false;
        }
        if !self.decision.playback_allowed || self.engine.state().is_playing {
            return false;
        }
        self.engine.play_with_retry();
        self.sync();
        true
    }

    pub fn toggle_play(&mut self) {
        if self.engine.state().is_playing {
            self.pause();
        } else {
            self.play();
        }
    }

    pub fn play(&mut self) {
        self.pending_resume = false;
        if !self.decision.playback_allowed {
            log::info!("playback is limited to the homepage on the free plan");
            return;
        }
        self.set_user_paused(false);
        self.engine.play();
        self.sync();
    }

    /// An explicit pause, remembered across page views.
    pub fn pause(&mut self) {
        self.pending_resume = false;
        self.set_user_paused(true);
        if self.engine.state().is_playing {
            self.record_current(AnalyticsKind::Pause);
        }
        self.engine.pause_track();
        self.sync();
    }

    pub fn next(&mut self) {
        self.pending_resume = false;
        self.record_current(AnalyticsKind::Skip);
        self.engine.next_track();
        self.sync();
    }

    pub fn prev(&mut self) {
        self.pending_resume = false;
        self.record_current(AnalyticsKind::Skip);
        self.engine.prev_track();
        self.sync();
    }

    /// A click on a `.track-item`.
    pub fn select_track(&mut self, index: usize) {
        self.pending_resume = false;
        if index >= self.engine.state().track_count() {
            return;
        }
        if self.decision.playback_allowed {
            self.set_user_paused(false);
            self.engine.select_track(index);
        } else {
            self.engine.load_track(index, TransitionReason::ManualSkip);
        }
        self.sync();
    }

    pub fn toggle_shuffle(&mut self) {
        self.pending_resume = false;
        self.engine.toggle_shuffle();
        self.sync();
    }

    pub fn toggle_mute(&mut self) {
        self.engine.toggle_mute();
        self.sync();
    }

    pub fn set_volume(&mut self, volume: f64) {
        self.engine.set_volume(volume);
        self.sync();
    }

    pub fn seek(&mut self, fraction: f64) {
        self.engine.seek_to_fraction(fraction);
        self.sync();
    }

    pub fn on_media_play(&mut self) {
        self.engine.on_media_play();
        self.sync();
    }

    pub fn on_media_pause(&mut self) {
        self.engine.on_media_pause();
        self.sync();
    }

    pub fn on_time_update(&mut self) {
        self.engine.on_time_update();
        self.sync();
    }

    pub fn on_loaded_metadata(&mut self) {
        self.engine.on_loaded_metadata();
        self.sync();
    }

    pub fn on_ended(&mut self) {
        self.engine.on_ended();
        self.sync();
    }

    pub fn on_play_rejected(&mut self, rejection: PlayRejection) {
        self.engine.on_play_rejected(rejection);
        self.sync();
    }

    /// First user interaction after a refused autoplay.
    pub fn on_user_gesture(&mut self) {
        if !self.decision.playback_allowed {
            return;
        }
        if self.engine.retry_after_gesture() {
            self.sync();
        }
    }

    pub fn on_duration_probed(&mut self, track_id: &str, duration: f64) {
        self.engine.update_track_duration(track_id, duration);
        self.sync();
    }

    /// Re-evaluate the plan rules when the URL changes. Returns whether the
    /// location was new.
    pub fn on_location_change(&mut self, location: &Location) -> bool {
        if !self.navigation.observe(&location.href) {
            return false;
        }

        let decision = plan::evaluate(&self.settings, &location.path);
        self.engine.set_autoplay_allowed(decision.autoplay_allowed);
        self.engine.set_loop(decision.loop_playback);
        if decision != self.decision {
            self.decision = decision;
            self.view.apply_decision(&self.decision);
        }

        if !self.decision.playback_allowed {
            log::info!("left the homepage on the free plan, pausing");
            self.pending_resume = false;
            self.engine.pause_track();
        }
        self.sync();
        true
    }

    /// Layout changed; scrolling titles need re-measuring.
    pub fn refresh_layout(&mut self) {
        self.view.refresh_marquee();
    }

    /// Page is being hidden or unloaded.
    pub fn persist_now(&mut self) {
        self.persist();
    }

    /// What would be written to storage right now. `None` until a playlist
    /// is installed, so an empty page never clobbers a saved session.
    pub fn snapshot(&self) -> Option<PlaybackSnapshot> {
        let state = self.engine.state();
        let playlist = state.playlist.as_ref()?;
        let track = state.current_track.as_ref();
        Some(PlaybackSnapshot {
            playlist_id: Some(playlist.id.clone()),
            track_id: track.map(|track| track.id.clone()),
            audio_url: track.map(|track| track.audio_url.clone()),
            track_index: state.current_track_index,
            current_time: self.engine.resume_position(),
            volume: state.volume,
            is_muted: state.is_muted,
            is_playing: state.is_playing,
            should_resume: state.is_playing || self.pending_resume,
        })
    }

    fn persist(&mut self) {
        if let Some(snapshot) = self.snapshot() {
            self.store.save(&snapshot);
        }
    }

    fn set_user_paused(&mut self, paused: bool) {
        if self.engine.state().user_paused_from_storage != paused {
            self.store.set_user_paused(paused);
        }
        self.engine.set_user_paused(paused);
    }

    fn progress(&self) -> ProgressDisplay {
        ProgressDisplay::new(self.engine.state().current_time, self.engine.duration())
    }

    fn render_playlist(&mut self) {
        let state = self.engine.state();
        let Some(playlist) = state.playlist.as_ref() else {
            return;
        };
        let rows = track_rows(
            &playlist.tracks,
            state.current_track_index,
            &self.decision.appearance,
        );
        self.view.render_playlist(&rows);
        self.view.set_controls(control_state(playlist.len()));
        self.view.apply_decision(&self.decision);
    }

    /// Push drained engine events into the view, storage and effects.
    fn sync(&mut self) {
        let mut dirty = false;
        for event in self.engine.take_events() {
            match event {
                EngineEvent::PlaylistChanged => self.render_playlist(),
                EngineEvent::TrackChanged { index, reason } => {
                    log::debug!("track {index} loaded ({reason:?})");
                    self.view.highlight_track(index);
                    if let Some(track) = self.engine.state().current_track.as_ref() {
                        self.view.show_track(track);
                    }
                    let progress = self.progress();
                    self.view.set_progress(&progress);
                    self.view.refresh_marquee();
                    dirty = true;
                }
                EngineEvent::PlayStateChanged { playing } => {
                    self.view.set_playing(playing);
                    if playing {
                        self.record_current(AnalyticsKind::Play);
                    }
                    dirty = true;
                }
                EngineEvent::Progress => {
                    let progress = self.progress();
                    self.view.set_progress(&progress);
                    dirty = true;
                }
                EngineEvent::VolumeChanged => {
                    let state = self.engine.state();
                    self.view.set_volume(state.volume, state.is_muted);
                    dirty = true;
                }
                EngineEvent::ShuffleChanged { shuffled } => self.view.set_shuffle(shuffled),
                EngineEvent::DurationProbed { index } => {
                    let state = self.engine.state();
                    let label = state
                        .playlist
                        .as_ref()
                        .and_then(|playlist| playlist.track(index))
                        .map(duration_label);
                    if let Some(label) = label {
                        self.view.update_track_duration(index, &label);
                    }
                    if index == state.current_track_index {
                        let progress = self.progress();
                        self.view.set_progress(&progress);
                    }
                }
                EngineEvent::AutoplayBlocked => self.effects.push(HostEffect::ArmGestureRetry),
                EngineEvent::TrackCompleted { index } => {
                    let track = self
                        .engine
                        .state()
                        .playlist
                        .as_ref()
                        .and_then(|playlist| playlist.track(index))
                        .cloned();
                    if let Some(track) = track {
                        let position = track.duration.unwrap_or(0.0);
                        self.record(AnalyticsKind::Complete, &track, position);
                    }
                }
            }
        }
        if dirty {
            self.persist();
        }
    }

    fn record_current(&mut self, kind: AnalyticsKind) {
        let Some(track) = self.engine.state().current_track.clone() else {
            return;
        };
        let position = self.engine.state().current_time;
        self.record(kind, &track, position);
    }

    fn record(&mut self, kind: AnalyticsKind, track: &Track, position: f64) {
        if !self.settings.track_analytics {
            return;
        }
        self.effects.push(HostEffect::SendAnalytics(AnalyticsEvent {
            shop: self.shop.clone(),
            session_id: self.session_id.clone(),
            event: kind,
            track_id: track.id.clone(),
            playlist_id: self.engine.state().playlist_id().map(str::to_string),
            position,
            occurred_at: Utc::now(),
        }));
    }
}
