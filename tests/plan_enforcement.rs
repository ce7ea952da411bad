use webexp_music_player::api::PlaylistSelection;
use webexp_music_player::components::Location;
use webexp_music_player::config::PlayerSettings;
use webexp_music_player::db::MemoryStore;
use webexp_music_player::plan::{ColorScheme, DisplayMode};
use webexp_music_player::testing::{sample_playlist, FakeMedia, RecordingView};
use webexp_music_player::MusicPlayer;

type TestPlayer = MusicPlayer<FakeMedia, RecordingView, MemoryStore>;

fn at(path: &str) -> Location {
    Location::new(format!("https://demo.example{path}"), path)
}

fn playing_on_homepage(settings: PlayerSettings) -> TestPlayer {
    let mut player = MusicPlayer::new(
        FakeMedia::default(),
        RecordingView::default(),
        MemoryStore::new(),
        settings,
        "demo.myshopify.com",
        &at("/"),
    );
    player.on_playlist_loaded(PlaylistSelection::Ready(sample_playlist(&["a", "b"])));
    player.on_media_play();
    assert!(player.state().is_playing);
    player
}

fn free_plan() -> PlayerSettings {
    PlayerSettings {
        is_free_plan: true,
        autoplay: true,
        display_mode: "floating-button".into(),
        color_scheme: "dark".into(),
        ..PlayerSettings::default()
    }
}

#[test]
fn free_plan_pauses_when_leaving_the_homepage() {
    let mut player = playing_on_homepage(free_plan());
    assert_eq!(player.engine().media().play_requests, 1);

    assert!(player.on_location_change(&at("/products/shirt")));
    assert!(!player.state().is_playing);
    assert!(!player.view().playing);
    assert_eq!(player.engine().media().pause_calls, 1);
    assert!(!player.store().user_paused());

    player.toggle_play();
    player.select_track(1);
    player.on_user_gesture();
    assert_eq!(player.engine().media().play_requests, 1);
}

#[test]
fn free_plan_plays_again_back_on_the_homepage() {
    let mut player = playing_on_homepage(free_plan());
    player.on_location_change(&at("/collections/all"));
    assert!(player.on_location_change(&at("/")));
    player.toggle_play();
    assert_eq!(player.engine().media().play_requests, 2);
}

#[test]
fn locale_root_counts_as_homepage() {
    let mut player = playing_on_homepage(free_plan());
    player.on_location_change(&at("/fr-ca"));
    assert!(player.state().is_playing);
    assert!(player.decision().playback_allowed);
}

#[test]
fn repeated_href_is_not_a_navigation() {
    let mut player = playing_on_homepage(free_plan());
    assert!(!player.on_location_change(&at("/")));
    assert!(player.state().is_playing);
}

#[test]
fn free_plan_ignores_customization() {
    let player = playing_on_homepage(free_plan());
    let decision = player.view().decision.as_ref().expect("decision applied");
    assert_eq!(decision.display_mode, DisplayMode::MiniBar);
    assert_eq!(decision.color_scheme, ColorScheme::Light);
}

#[test]
fn pro_plan_keeps_playing_across_pages() {
    let settings = PlayerSettings {
        is_free_plan: false,
        autoplay: true,
        display_mode: "floating-button".into(),
        color_scheme: "dark".into(),
        ..PlayerSettings::default()
    };
    let mut player = playing_on_homepage(settings);
    assert!(player.on_location_change(&at("/products/shirt")));
    assert!(player.state().is_playing);
    assert_eq!(player.engine().media().pause_calls, 0);

    let decision = player.view().decision.as_ref().expect("decision applied");
    assert_eq!(decision.display_mode, DisplayMode::FloatingButton);
    assert_eq!(decision.color_scheme, ColorScheme::Dark);
}
