//! Plan gating: which display mode, theme, and playback behaviors the
//! current store and route are entitled to.

use crate::config::PlayerSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayMode {
    #[default]
    MiniBar,
    FloatingButton,
}

impl DisplayMode {
    pub fn from_setting(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "floating-button" | "floating_button" | "floating" | "button" => {
                DisplayMode::FloatingButton
            }
            _ => DisplayMode::MiniBar,
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            DisplayMode::MiniBar => "display-mini-bar",
            DisplayMode::FloatingButton => "display-floating-button",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorScheme {
    #[default]
    Light,
    Dark,
}

impl ColorScheme {
    pub fn from_setting(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("dark") {
            ColorScheme::Dark
        } else {
            ColorScheme::Light
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            ColorScheme::Light => "theme-light",
            ColorScheme::Dark => "theme-dark",
        }
    }
}

/// Cosmetic options only Pro and Studio stores may customize.
#[derive(Debug, Clone, PartialEq)]
pub struct Appearance {
    pub button_size: String,
    pub button_position: String,
    pub rounded_corners: bool,
    pub show_album_art: bool,
    pub show_track_info: bool,
    pub show_artist_name: bool,
    pub show_track_duration: bool,
    pub player_opacity: f64,
    pub max_visible_tracks: Option<usize>,
}

impl Default for Appearance {
    fn default() -> Self {
        let defaults = PlayerSettings::default();
        Self {
            button_size: defaults.button_size,
            button_position: defaults.button_position,
            rounded_corners: defaults.rounded_corners,
            show_album_art: defaults.show_album_art,
            show_track_info: defaults.show_track_info,
            show_artist_name: defaults.show_artist_name,
            show_track_duration: defaults.show_track_duration,
            player_opacity: defaults.player_opacity,
            max_visible_tracks: None,
        }
    }
}

impl Appearance {
    fn from_settings(settings: &PlayerSettings) -> Self {
        Self {
            button_size: settings.button_size.clone(),
            button_position: settings.button_position.clone(),
            rounded_corners: settings.rounded_corners,
            show_album_art: settings.show_album_art,
            show_track_info: settings.show_track_info,
            show_artist_name: settings.show_artist_name,
            show_track_duration: settings.show_track_duration,
            player_opacity: normalize_opacity(settings.player_opacity),
            max_visible_tracks: settings.max_visible_tracks.filter(|max| *max > 0),
        }
    }
}

/// Resolved behavior for one `(settings, route)` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanDecision {
    pub is_free_plan: bool,
    pub on_homepage: bool,
    pub display_mode: DisplayMode,
    pub color_scheme: ColorScheme,
    pub appearance: Appearance,
    /// False when the route forbids audio (free plan off the homepage).
    pub playback_allowed: bool,
    pub autoplay_allowed: bool,
    pub persistent_playback: bool,
    pub loop_playback: bool,
}

/// Decide what the store is entitled to on `route` (a URL path).
pub fn evaluate(settings: &PlayerSettings, route: &str) -> PlanDecision {
    let on_homepage = is_homepage(route);

    if settings.is_free_plan {
        return PlanDecision {
            is_free_plan: true,
            on_homepage,
            display_mode: DisplayMode::MiniBar,
            color_scheme: ColorScheme::Light,
            appearance: Appearance::default(),
            playback_allowed: on_homepage,
            autoplay_allowed: on_homepage && settings.autoplay,
            persistent_playback: false,
            loop_playback: settings.loop_playback,
        };
    }

    PlanDecision {
        is_free_plan: false,
        on_homepage,
        display_mode: DisplayMode::from_setting(&settings.display_mode),
        color_scheme: ColorScheme::from_setting(&settings.color_scheme),
        appearance: Appearance::from_settings(settings),
        playback_allowed: true,
        autoplay_allowed: settings.autoplay,
        persistent_playback: settings.persistent_playback,
        loop_playback: settings.loop_playback,
    }
}

/// Opacity arrives as 0..=1, or as a percentage from older settings forms.
fn normalize_opacity(value: f64) -> f64 {
    if !value.is_finite() {
        return 1.0;
    }
    let value = if value > 1.0 { value / 100.0 } else { value };
    value.clamp(0.1, 1.0)
}

/// The storefront root, optionally under a single Markets locale prefix
/// such as `/fr` or `/en-ca`.
pub fn is_homepage(path: &str) -> bool {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        return true;
    }
    if trimmed.contains('/') {
        return false;
    }
    is_locale_segment(trimmed)
}

fn is_locale_segment(segment: &str) -> bool {
    let mut parts = segment.split('-');
    let language = parts.next().unwrap_or_default();
    let region = parts.next();
    if parts.next().is_some() {
        return false;
    }
    let is_alpha = |s: &str, len: usize| s.len() == len && s.chars().all(|c| c.is_ascii_alphabetic());
    is_alpha(language, 2) && region.map(|r| is_alpha(r, 2)).unwrap_or(true)
}
