//! [`PlayerView`] over the theme's markup. Elements are resolved once at
//! startup; any selector that matches nothing simply turns the matching
//! updates into no-ops.

use super::view::{
    display_title, marquee_duration_secs, needs_marquee, ControlState, PlayerView,
    ProgressDisplay, TrackRow,
};
use crate::api::models::Track;
use crate::plan::{Appearance, DisplayMode, PlanDecision};
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement, HtmlImageElement, HtmlInputElement};

pub const TRACK_ITEM_SELECTOR: &str = ".track-item";
const MARQUEE_SELECTOR: &str =
    ".mini-music-bar .marquee-text, .audio-player-modal .modal-header .marquee-text";
const THEME_CLASSES: [&str; 2] = ["theme-light", "theme-dark"];

fn query_all(document: &Document, selector: &str) -> Vec<Element> {
    let Ok(list) = document.query_selector_all(selector) else {
        return Vec::new();
    };
    (0..list.length())
        .filter_map(|i| list.item(i))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect()
}

fn query_all_as<T: JsCast>(document: &Document, selector: &str) -> Vec<T> {
    query_all(document, selector)
        .into_iter()
        .filter_map(|element| element.dyn_into::<T>().ok())
        .collect()
}

fn query_one_as<T: JsCast>(document: &Document, selector: &str) -> Option<T> {
    document
        .query_selector(selector)
        .ok()
        .flatten()
        .and_then(|element| element.dyn_into::<T>().ok())
}

fn set_visible(element: &Element, visible: bool) {
    let Some(element) = element.dyn_ref::<HtmlElement>() else {
        return;
    };
    let style = element.style();
    if visible {
        let _ = style.remove_property("display");
    } else {
        let _ = style.set_property("display", "none");
    }
}

fn set_class(element: &Element, class: &str, on: bool) {
    let _ = element.class_list().toggle_with_force(class, on);
}

fn set_disabled(element: &Element, disabled: bool) {
    if disabled {
        let _ = element.set_attribute("disabled", "");
        let _ = element.set_attribute("aria-disabled", "true");
    } else {
        let _ = element.remove_attribute("disabled");
        let _ = element.remove_attribute("aria-disabled");
    }
}

fn slider_max(slider: &HtmlInputElement) -> f64 {
    slider.max().parse::<f64>().ok().filter(|max| *max > 0.0).unwrap_or(1.0)
}

/// Handles to every element the player touches.
#[derive(Clone)]
pub struct DomBindings {
    pub document: Document,
    pub modal: Option<HtmlElement>,
    pub close_modal_buttons: Vec<Element>,
    pub mini_expand_buttons: Vec<Element>,
    pub toggle_button: Option<HtmlElement>,
    pub mini_bar: Option<HtmlElement>,
    pub play_buttons: Vec<Element>,
    pub prev_buttons: Vec<Element>,
    pub next_buttons: Vec<Element>,
    pub shuffle_buttons: Vec<Element>,
    pub volume_sliders: Vec<HtmlInputElement>,
    pub volume_buttons: Vec<Element>,
    pub progress_bars: Vec<HtmlElement>,
    pub track_lists: Vec<Element>,
    titles: Vec<Element>,
    artists: Vec<Element>,
    track_info: Vec<Element>,
    album_art: Vec<HtmlImageElement>,
    current_times: Vec<Element>,
    total_times: Vec<Element>,
}

impl DomBindings {
    pub fn resolve(document: &Document) -> Self {
        let bindings = Self {
            document: document.clone(),
            modal: query_one_as(document, ".audio-player-modal"),
            close_modal_buttons: query_all(document, ".close-modal-btn"),
            mini_expand_buttons: query_all(document, ".mini-expand-btn"),
            toggle_button: query_one_as(document, ".music-toggle-btn"),
            mini_bar: query_one_as(document, ".mini-music-bar"),
            play_buttons: query_all(document, ".play-btn, .mini-play-btn"),
            prev_buttons: query_all(document, ".prev-btn, .mini-prev-btn"),
            next_buttons: query_all(document, ".next-btn, .mini-next-btn"),
            shuffle_buttons: query_all(document, ".shuffle-btn"),
            volume_sliders: query_all_as(document, ".volume-slider"),
            volume_buttons: query_all(document, ".volume-btn"),
            progress_bars: query_all_as(document, ".progress-bar, .mini-progress-bar"),
            track_lists: query_all(document, ".track-list"),
            titles: query_all(document, ".track-title"),
            artists: query_all(document, ".track-artist"),
            track_info: query_all(document, ".track-info"),
            album_art: query_all_as(document, "img.album-art"),
            current_times: query_all(document, ".current-time"),
            total_times: query_all(document, ".total-time"),
        };
        if bindings.modal.is_none() && bindings.mini_bar.is_none() {
            log::warn!("player markup not found; controls will be inert");
        }
        bindings
    }

    fn themed_roots(&self) -> impl Iterator<Item = &HtmlElement> {
        self.modal
            .iter()
            .chain(self.mini_bar.iter())
            .chain(self.toggle_button.iter())
    }

    pub fn set_modal_open(&self, open: bool) {
        let Some(modal) = self.modal.as_ref() else {
            return;
        };
        set_class(modal, "is-open", open);
        let _ = modal.set_attribute("aria-hidden", if open { "false" } else { "true" });
    }
}

pub struct DomPlayerView {
    bindings: DomBindings,
    appearance: Appearance,
}

impl DomPlayerView {
    pub fn new(bindings: DomBindings) -> Self {
        Self {
            bindings,
            appearance: Appearance::default(),
        }
    }

    pub fn bindings(&self) -> &DomBindings {
        &self.bindings
    }

    fn track_items(&self) -> Vec<Element> {
        self.bindings
            .track_lists
            .iter()
            .flat_map(|list| {
                let Ok(nodes) = list.query_selector_all(TRACK_ITEM_SELECTOR) else {
                    return Vec::new();
                };
                (0..nodes.length())
                    .filter_map(|i| nodes.item(i))
                    .filter_map(|node| node.dyn_into::<Element>().ok())
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    fn build_row(&self, row: &TrackRow) -> Option<Element> {
        let document = &self.bindings.document;
        let item = document.create_element("li").ok()?;
        item.set_class_name("track-item");
        set_class(&item, "active", row.active);
        let _ = item.set_attribute("data-index", &row.index.to_string());

        let title = document.create_element("span").ok()?;
        title.set_class_name("track-item-title");
        title.set_text_content(Some(row.title.as_str()));
        let _ = item.append_child(&title);

        if let Some(artist) = row.artist.as_deref() {
            let span = document.create_element("span").ok()?;
            span.set_class_name("track-item-artist");
            span.set_text_content(Some(artist));
            let _ = item.append_child(&span);
        }
        if let Some(label) = row.duration_label.as_deref() {
            let span = document.create_element("span").ok()?;
            span.set_class_name("track-item-duration");
            span.set_text_content(Some(label));
            let _ = item.append_child(&span);
        }
        Some(item)
    }
}

impl PlayerView for DomPlayerView {
    fn apply_decision(&mut self, decision: &PlanDecision) {
        let appearance = &decision.appearance;
        for root in self.bindings.themed_roots() {
            for class in THEME_CLASSES {
                set_class(root, class, class == decision.color_scheme.css_class());
            }
            set_class(root, "rounded", appearance.rounded_corners);
            set_class(root, "free-plan", decision.is_free_plan);
            let _ = root.set_attribute("data-display-mode", decision.display_mode.css_class());
        }

        let opacity = appearance.player_opacity.to_string();
        if let Some(bar) = self.bindings.mini_bar.as_ref() {
            set_visible(bar, decision.display_mode == DisplayMode::MiniBar);
            let _ = bar.style().set_property("opacity", &opacity);
        }
        if let Some(toggle) = self.bindings.toggle_button.as_ref() {
            set_visible(toggle, decision.display_mode == DisplayMode::FloatingButton);
            let _ = toggle.style().set_property("opacity", &opacity);
            let _ = toggle.set_attribute("data-button-size", &appearance.button_size);
            let _ = toggle.set_attribute("data-button-position", &appearance.button_position);
        }

        for art in &self.bindings.album_art {
            set_visible(art, appearance.show_album_art);
        }
        for info in &self.bindings.track_info {
            set_visible(info, appearance.show_track_info);
        }
        for artist in &self.bindings.artists {
            set_visible(artist, appearance.show_artist_name);
        }
        for total in &self.bindings.total_times {
            set_visible(total, appearance.show_track_duration);
        }
        self.appearance = appearance.clone();
    }

    fn render_playlist(&mut self, rows: &[TrackRow]) {
        let items: Vec<Element> = rows.iter().filter_map(|row| self.build_row(row)).collect();
        for list in &self.bindings.track_lists {
            list.set_inner_html("");
            for item in &items {
                if let Ok(node) = item.clone_node_with_deep(true) {
                    let _ = list.append_child(&node);
                }
            }
        }
    }

    fn show_empty(&mut self, message: &str) {
        for list in &self.bindings.track_lists {
            list.set_inner_html("");
            if let Ok(item) = self.bindings.document.create_element("li") {
                item.set_class_name("track-item-empty");
                item.set_text_content(Some(message));
                let _ = list.append_child(&item);
            }
        }
        for title in &self.bindings.titles {
            title.set_text_content(Some(message));
        }
        for artist in &self.bindings.artists {
            artist.set_text_content(None);
        }
    }

    fn highlight_track(&mut self, index: usize) {
        let wanted = index.to_string();
        for item in self.track_items() {
            let active = item.get_attribute("data-index").as_deref() == Some(wanted.as_str());
            set_class(&item, "active", active);
        }
    }

    fn show_track(&mut self, track: &Track) {
        let title = display_title(track);
        for element in &self.bindings.titles {
            element.set_text_content(Some(title.as_str()));
        }
        for element in &self.bindings.artists {
            element.set_text_content(Some(track.artist.as_str()));
        }
        let art = track.album_art.as_deref().filter(|url| !url.trim().is_empty());
        for image in &self.bindings.album_art {
            match art {
                Some(url) => {
                    image.set_src(url);
                    image.set_alt(&title);
                    set_visible(image, self.appearance.show_album_art);
                }
                None => set_visible(image, false),
            }
        }
    }

    fn set_playing(&mut self, playing: bool) {
        let label = if playing { "Pause" } else { "Play" };
        for button in &self.bindings.play_buttons {
            set_class(button, "is-playing", playing);
            let _ = button.set_attribute("aria-label", label);
        }
        for root in self.bindings.themed_roots() {
            set_class(root, "playing", playing);
        }
    }

    fn set_progress(&mut self, progress: &ProgressDisplay) {
        let percent = format!("{:.2}%", progress.percent);
        for bar in &self.bindings.progress_bars {
            let _ = bar.style().set_property("--progress", &percent);
            if let Ok(Some(fill)) = bar.query_selector(".progress-fill") {
                if let Some(fill) = fill.dyn_ref::<HtmlElement>() {
                    let _ = fill.style().set_property("width", &percent);
                }
            }
        }
        for element in &self.bindings.current_times {
            element.set_text_content(Some(progress.current_label.as_str()));
        }
        for element in &self.bindings.total_times {
            element.set_text_content(Some(progress.duration_label.as_str()));
        }
    }

    fn set_volume(&mut self, volume: f64, muted: bool) {
        let shown = if muted { 0.0 } else { volume };
        for slider in &self.bindings.volume_sliders {
            slider.set_value(&(shown * slider_max(slider)).to_string());
        }
        for button in &self.bindings.volume_buttons {
            set_class(button, "is-muted", muted);
            let _ = button.set_attribute("aria-label", if muted { "Unmute" } else { "Mute" });
        }
    }

    fn set_shuffle(&mut self, shuffled: bool) {
        for button in &self.bindings.shuffle_buttons {
            set_class(button, "active", shuffled);
            let _ = button.set_attribute("aria-pressed", if shuffled { "true" } else { "false" });
        }
    }

    fn set_controls(&mut self, controls: ControlState) {
        for button in &self.bindings.play_buttons {
            set_disabled(button, !controls.can_play);
        }
        for button in self
            .bindings
            .prev_buttons
            .iter()
            .chain(self.bindings.next_buttons.iter())
        {
            set_disabled(button, !controls.can_skip);
        }
        for button in &self.bindings.shuffle_buttons {
            set_disabled(button, !controls.can_shuffle);
        }
    }

    fn update_track_duration(&mut self, index: usize, label: &str) {
        let selector = format!("{TRACK_ITEM_SELECTOR}[data-index=\"{index}\"] .track-item-duration");
        for list in &self.bindings.track_lists {
            if let Ok(Some(cell)) = list.query_selector(&selector) {
                cell.set_text_content(Some(label));
            }
        }
    }

    fn refresh_marquee(&mut self) {
        for element in query_all_as::<HtmlElement>(&self.bindings.document, MARQUEE_SELECTOR) {
            let container = element
                .parent_element()
                .map(|parent| f64::from(parent.client_width()))
                .unwrap_or(0.0);
            let content = f64::from(element.scroll_width());
            let scrolling = needs_marquee(content, container);
            set_class(&element, "is-scrolling", scrolling);
            let style = element.style();
            if scrolling {
                let secs = format!("{:.1}s", marquee_duration_secs(content));
                let _ = style.set_property("--marquee-duration", &secs);
            } else {
                let _ = style.remove_property("--marquee-duration");
            }
        }
    }
}
