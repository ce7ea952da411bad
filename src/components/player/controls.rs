//! Input mapping for the transport controls: hardware media keys, the
//! progress bar and the volume slider.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    TogglePlay,
    Next,
    Previous,
}

/// Media keys only. Storefront pages own the rest of the keyboard.
pub fn shortcut_action(key: &str, code: &str, key_code: u32) -> Option<ShortcutAction> {
    if matches!(
        key,
        "MediaTrackNext" | "MediaNextTrack" | "AudioTrackNext" | "AudioNext" | "NextTrack"
    ) || code == "MediaTrackNext"
        || key_code == 176
    {
        return Some(ShortcutAction::Next);
    }
    if matches!(
        key,
        "MediaTrackPrevious"
            | "MediaPreviousTrack"
            | "AudioTrackPrevious"
            | "AudioPrev"
            | "PreviousTrack"
    ) || code == "MediaTrackPrevious"
        || key_code == 177
    {
        return Some(ShortcutAction::Previous);
    }
    if matches!(key, "MediaPlayPause" | "AudioPlay" | "AudioPause")
        || code == "MediaPlayPause"
        || key_code == 179
    {
        return Some(ShortcutAction::TogglePlay);
    }
    None
}

/// Fraction of the bar left of the click.
pub fn seek_fraction(click_x: f64, bar_left: f64, bar_width: f64) -> Option<f64> {
    if !(bar_width.is_finite() && bar_width > 0.0) || !click_x.is_finite() {
        return None;
    }
    Some(((click_x - bar_left) / bar_width).clamp(0.0, 1.0))
}

/// Sliders are authored either as 0..1 or 0..100.
pub fn slider_volume(value: f64, max: f64) -> Option<f64> {
    if !value.is_finite() {
        return None;
    }
    let scale = if max.is_finite() && max > 1.0 { max } else { 1.0 };
    Some((value / scale).clamp(0.0, 1.0))
}

#[cfg(target_arch = "wasm32")]
pub use browser::shortcut_action_from_key;

#[cfg(target_arch = "wasm32")]
mod browser {
    use super::{shortcut_action, ShortcutAction};
    use wasm_bindgen::JsCast;
    use web_sys::KeyboardEvent;

    fn is_editable_shortcut_target(event: &KeyboardEvent) -> bool {
        let Some(target) = event.target() else {
            return false;
        };

        let mut current = target.dyn_into::<web_sys::Element>().ok();
        while let Some(element) = current {
            let tag = element.tag_name().to_ascii_lowercase();
            if tag == "input" || tag == "textarea" || tag == "select" {
                return true;
            }
            if element
                .get_attribute("contenteditable")
                .map(|v| v.to_ascii_lowercase() != "false")
                .unwrap_or(false)
            {
                return true;
            }
            current = element.parent_element();
        }

        false
    }

    pub fn shortcut_action_from_key(event: &KeyboardEvent) -> Option<ShortcutAction> {
        if event.default_prevented() || event.is_composing() || is_editable_shortcut_target(event)
        {
            return None;
        }
        shortcut_action(&event.key(), &event.code(), event.key_code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_keys_map_to_actions() {
        assert_eq!(
            shortcut_action("MediaPlayPause", "", 0),
            Some(ShortcutAction::TogglePlay)
        );
        assert_eq!(shortcut_action("", "", 176), Some(ShortcutAction::Next));
        assert_eq!(
            shortcut_action("Unidentified", "MediaTrackPrevious", 0),
            Some(ShortcutAction::Previous)
        );
        assert_eq!(shortcut_action(" ", "Space", 32), None);
        assert_eq!(shortcut_action("F8", "F8", 119), None);
    }

    #[test]
    fn seek_fraction_clamps_to_bar() {
        assert_eq!(seek_fraction(150.0, 100.0, 200.0), Some(0.25));
        assert_eq!(seek_fraction(50.0, 100.0, 200.0), Some(0.0));
        assert_eq!(seek_fraction(400.0, 100.0, 200.0), Some(1.0));
        assert_eq!(seek_fraction(150.0, 100.0, 0.0), None);
    }

    #[test]
    fn slider_scale_is_detected_from_max() {
        assert_eq!(slider_volume(0.4, 1.0), Some(0.4));
        assert_eq!(slider_volume(40.0, 100.0), Some(0.4));
        assert_eq!(slider_volume(f64::NAN, 1.0), None);
    }
}
