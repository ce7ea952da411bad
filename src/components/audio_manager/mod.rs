//! Audio Manager - owns playback outside of any view.
//! The engine is generic over the media element so the same state machine
//! runs against the storefront `<audio>` tag and against test doubles.

pub mod engine;
pub mod media;
pub mod shuffle;

#[cfg(target_arch = "wasm32")]
pub mod web_audio;

pub use engine::{
    should_autoplay, EngineEvent, MediaSignal, PlaybackEngine, PlaybackPhase, PlayerState,
    TransitionReason, DEFAULT_VOLUME,
};
pub use media::{MediaElement, PlayRejection};
