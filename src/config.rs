//! Bootstrap configuration embedded in the storefront page by the theme
//! app extension, and the merchant's player settings.

use crate::error::{PlayerError, PlayerResult};
use serde::{Deserialize, Serialize};

/// Id of the `<script type="application/json">` element carrying the config.
pub const CONFIG_ELEMENT_ID: &str = "webexp-music-player-config";
pub const DEFAULT_PROXY_PATH: &str = "webexp";

/// Merchant-facing player customization, read-only to the runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerSettings {
    pub is_free_plan: bool,
    pub plan: Option<String>,
    pub display_mode: String,
    pub color_scheme: String,
    pub button_size: String,
    pub button_position: String,
    pub rounded_corners: bool,
    pub show_album_art: bool,
    pub show_track_info: bool,
    pub show_artist_name: bool,
    pub show_track_duration: bool,
    pub player_opacity: f64,
    pub max_visible_tracks: Option<usize>,
    pub persistent_playback: bool,
    pub autoplay: bool,
    #[serde(rename = "loop")]
    pub loop_playback: bool,
    pub track_analytics: bool,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            is_free_plan: true,
            plan: None,
            display_mode: "mini-bar".to_string(),
            color_scheme: "light".to_string(),
            button_size: "medium".to_string(),
            button_position: "bottom-right".to_string(),
            rounded_corners: true,
            show_album_art: true,
            show_track_info: true,
            show_artist_name: true,
            show_track_duration: true,
            player_opacity: 1.0,
            max_visible_tracks: None,
            persistent_playback: false,
            autoplay: true,
            loop_playback: false,
            track_analytics: true,
        }
    }
}

/// Everything the runtime needs from the page before it can start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BootstrapConfig {
    pub shop: String,
    pub proxy_path: String,
    pub log_level: Option<String>,
    pub settings: PlayerSettings,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            shop: String::new(),
            proxy_path: DEFAULT_PROXY_PATH.to_string(),
            log_level: None,
            settings: PlayerSettings::default(),
        }
    }
}

impl BootstrapConfig {
    pub fn from_json(raw: &str) -> PlayerResult<Self> {
        let mut config: BootstrapConfig = serde_json::from_str(raw)?;
        if config.proxy_path.trim().is_empty() {
            config.proxy_path = DEFAULT_PROXY_PATH.to_string();
        }
        Ok(config)
    }

    pub fn validate(&self) -> PlayerResult<()> {
        if self.shop.trim().is_empty() {
            return Err(PlayerError::Config("shop domain is missing".to_string()));
        }
        Ok(())
    }
}

/// Read the config blob from the page, falling back to defaults and to
/// `window.Shopify.shop` for the shop domain.
#[cfg(target_arch = "wasm32")]
pub fn load_from_page() -> BootstrapConfig {
    use web_sys::window;

    let raw = window()
        .and_then(|w| w.document())
        .and_then(|doc| doc.get_element_by_id(CONFIG_ELEMENT_ID))
        .and_then(|element| element.text_content());

    let mut config = match raw {
        Some(raw) => BootstrapConfig::from_json(&raw).unwrap_or_else(|err| {
            log::warn!("ignoring unreadable player config: {err}");
            BootstrapConfig::default()
        }),
        None => BootstrapConfig::default(),
    };

    if config.shop.trim().is_empty() {
        if let Some(shop) = shopify_global_shop() {
            config.shop = shop;
        }
    }
    config
}

#[cfg(target_arch = "wasm32")]
fn shopify_global_shop() -> Option<String> {
    let win = web_sys::window()?;
    let shopify = js_sys::Reflect::get(&win, &"Shopify".into()).ok()?;
    if shopify.is_undefined() || shopify.is_null() {
        return None;
    }
    js_sys::Reflect::get(&shopify, &"shop".into())
        .ok()?
        .as_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_partial_settings_with_defaults() {
        let config = BootstrapConfig::from_json(
            r#"{
                "shop": "demo.myshopify.com",
                "settings": { "isFreePlan": false, "loop": true, "maxVisibleTracks": 5,
                              "colorScheme": "dark" }
            }"#,
        )
        .expect("config");
        assert_eq!(config.proxy_path, DEFAULT_PROXY_PATH);
        assert!(!config.settings.is_free_plan);
        assert!(config.settings.loop_playback);
        assert_eq!(config.settings.max_visible_tracks, Some(5));
        assert_eq!(config.settings.color_scheme, "dark");
        assert!(config.settings.show_album_art);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn blank_proxy_path_and_missing_shop() {
        let config = BootstrapConfig::from_json(r#"{ "proxyPath": "" }"#).expect("config");
        assert_eq!(config.proxy_path, DEFAULT_PROXY_PATH);
        assert!(matches!(config.validate(), Err(PlayerError::Config(_))));
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(matches!(
            BootstrapConfig::from_json("{not json"),
            Err(PlayerError::Serialization(_))
        ));
    }
}
