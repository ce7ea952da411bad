//! Browser-facing pieces of the player: the playback engine, the
//! orchestrator and its view, and the navigation watcher.

pub mod audio_manager;
pub mod navigation;
pub mod player;

#[cfg(target_arch = "wasm32")]
pub mod app;

pub use audio_manager::{PlaybackEngine, PlayerState};
pub use navigation::{Location, NavigationWatcher};
pub use player::{HostEffect, MusicPlayer};
