use rand::rngs::StdRng;
use rand::SeedableRng;
use webexp_music_player::api::PlaylistSelection;
use webexp_music_player::components::audio_manager::{PlayRejection, PlaybackEngine};
use webexp_music_player::components::Location;
use webexp_music_player::config::PlayerSettings;
use webexp_music_player::db::{MemoryStore, USER_PAUSED_KEY};
use webexp_music_player::testing::{sample_playlist, FakeMedia, RecordingView};
use webexp_music_player::MusicPlayer;

type TestPlayer = MusicPlayer<FakeMedia, RecordingView, MemoryStore>;

fn pro(loop_playback: bool) -> PlayerSettings {
    PlayerSettings {
        is_free_plan: false,
        autoplay: false,
        loop_playback,
        ..PlayerSettings::default()
    }
}

fn player_with(settings: PlayerSettings, store: MemoryStore) -> TestPlayer {
    MusicPlayer::new(
        FakeMedia::default(),
        RecordingView::default(),
        store,
        settings,
        "demo.myshopify.com",
        &Location::new("https://demo.example/", "/"),
    )
}

fn loaded(settings: PlayerSettings, ids: &[&str]) -> TestPlayer {
    let mut player = player_with(settings, MemoryStore::new());
    player.on_playlist_loaded(PlaylistSelection::Ready(sample_playlist(ids)));
    player
}

fn track_ids(engine: &PlaybackEngine<FakeMedia>) -> Vec<String> {
    engine
        .state()
        .playlist
        .as_ref()
        .map(|playlist| {
            playlist
                .tracks
                .iter()
                .map(|entry| entry.track.id.clone())
                .collect()
        })
        .unwrap_or_default()
}

#[test]
fn next_at_end_wraps_to_start_without_loop() {
    let mut player = loaded(pro(false), &["a", "b", "c"]);
    player.select_track(2);
    player.next();
    assert_eq!(player.state().current_track_index, 0);
    assert_eq!(player.view().highlighted, Some(0));
}

#[test]
fn next_at_end_repeats_current_with_loop() {
    let mut player = loaded(pro(true), &["a", "b", "c"]);
    player.select_track(2);
    let loads = player.engine().media().loads;
    player.next();
    assert_eq!(player.state().current_track_index, 2);
    assert_eq!(player.engine().media().loads, loads + 1);
}

#[test]
fn natural_end_autoplays_even_with_stored_pause() {
    let mut store = MemoryStore::new();
    store.insert_raw(USER_PAUSED_KEY, "true");
    let mut player = player_with(
        PlayerSettings {
            autoplay: true,
            ..pro(false)
        },
        store,
    );
    player.on_playlist_loaded(PlaylistSelection::Ready(sample_playlist(&["a", "b"])));
    assert_eq!(player.engine().media().play_requests, 0);
    assert!(player.state().user_paused_from_storage);

    player.engine_mut().play();
    player.on_media_play();
    let before = player.engine().media().play_requests;

    player.on_media_pause();
    player.on_ended();
    assert_eq!(player.state().current_track_index, 1);
    assert_eq!(player.engine().media().play_requests, before + 1);
}

#[test]
fn user_pause_is_remembered_and_cleared_by_play() {
    let mut player = loaded(pro(false), &["a", "b"]);
    player.toggle_play();
    player.on_media_play();
    player.toggle_play();
    assert!(!player.state().is_playing);
    assert!(player.store().user_paused());

    player.toggle_play();
    assert!(!player.store().user_paused());
}

#[test]
fn mute_round_trip_restores_exact_volume() {
    let mut player = loaded(pro(false), &["a"]);
    player.set_volume(0.7);
    player.toggle_mute();
    assert_eq!(player.engine().effective_volume(), 0.0);
    assert_eq!(player.engine().media().volume, 0.0);
    assert_eq!(player.view().volume, Some((0.7, true)));

    player.toggle_mute();
    assert_eq!(player.engine().effective_volume(), 0.7);
    assert_eq!(player.engine().media().volume, 0.7);
}

#[test]
fn shuffle_does_not_start_playback() {
    let mut player = loaded(pro(false), &["a", "b", "c", "d"]);
    player.toggle_shuffle();
    assert!(player.state().shuffled);
    assert!(player.view().shuffled);
    assert_eq!(player.engine().media().play_requests, 0);
    assert_eq!(player.view().rows.len(), 4);
}

#[test]
fn probed_durations_reach_the_rendered_rows() {
    let mut player = loaded(pro(false), &["a", "b"]);
    player.on_duration_probed("b", 125.0);
    assert_eq!(
        player.view().duration_labels.last(),
        Some(&(1, "2:05".to_string()))
    );
    player.on_duration_probed("a", f64::NAN);
    assert_eq!(
        player.view().duration_labels.last(),
        Some(&(0, "--:--".to_string()))
    );
}

#[test]
fn skipping_after_blocked_autoplay_plays_the_new_track() {
    let mut player = loaded(
        PlayerSettings {
            autoplay: true,
            ..pro(false)
        },
        &["a", "b", "c"],
    );
    assert_eq!(player.engine().media().play_requests, 1);
    player.on_play_rejected(PlayRejection::NotAllowed);
    assert!(player.engine().is_awaiting_gesture());

    // The next button handles the click before the document-level retry.
    player.next();
    player.on_user_gesture();
    assert_eq!(player.state().current_track_index, 1);
    assert_eq!(player.engine().media().src, "https://cdn.example/b.mp3");
    assert_eq!(player.engine().media().play_requests, 2);
}

proptest::proptest! {
    #[test]
    fn shuffle_is_a_permutation(len in 1usize..40, seed in proptest::prelude::any::<u64>()) {
        let ids: Vec<String> = (0..len).map(|n| format!("t{n}")).collect();
        let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        let mut engine = PlaybackEngine::new(FakeMedia::default());
        engine.set_playlist(sample_playlist(&refs));

        engine.shuffle_with(&mut StdRng::seed_from_u64(seed));
        let mut shuffled = track_ids(&engine);
        proptest::prop_assert_eq!(shuffled.len(), len);
        shuffled.sort();
        let mut expected = ids.clone();
        expected.sort();
        proptest::prop_assert_eq!(shuffled, expected);
    }

    #[test]
    fn unshuffle_restores_order_and_keeps_current(
        len in 1usize..30,
        seed in proptest::prelude::any::<u64>(),
        pick in 0usize..30,
    ) {
        let ids: Vec<String> = (0..len).map(|n| format!("t{n}")).collect();
        let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        let mut engine = PlaybackEngine::new(FakeMedia::default());
        engine.set_playlist(sample_playlist(&refs));

        engine.shuffle_with(&mut StdRng::seed_from_u64(seed));
        engine.select_track(pick % len);
        let current = engine.state().current_track.clone().map(|track| track.id);

        proptest::prop_assert!(engine.unshuffle());
        proptest::prop_assert_eq!(track_ids(&engine), ids.clone());
        let index = engine.state().current_track_index;
        proptest::prop_assert_eq!(Some(ids[index].clone()), current);
    }
}
