//! Background-music player for Shopify storefronts, compiled to wasm and
//! started from the theme's app embed.

pub mod api;
pub mod components;
pub mod config;
pub mod db;
pub mod diagnostics;
pub mod error;
pub mod plan;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod utils;

pub use components::{HostEffect, MusicPlayer};
pub use error::{PlayerError, PlayerResult};

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn start() {
    components::app::launch();
}
