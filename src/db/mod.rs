//! Browser-scoped persistence of playback state across full page loads.

#[cfg(any(target_arch = "wasm32", test))]
use crate::error::PlayerError;
use crate::error::PlayerResult;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[cfg(target_arch = "wasm32")]
mod browser;
#[cfg(target_arch = "wasm32")]
pub use browser::BrowserStorage;

pub const PLAYBACK_KEY: &str = "webexp_music_player_state";
pub const USER_PAUSED_KEY: &str = "webexp_user_paused";

/// Durable key/value storage holding JSON-encoded values.
pub trait KeyValueStore {
    fn load<T: DeserializeOwned>(&self, key: &str) -> PlayerResult<Option<T>>;
    fn store<T: Serialize>(&mut self, key: &str, value: &T) -> PlayerResult<()>;
    fn delete(&mut self, key: &str) -> PlayerResult<()>;
}

/// Process-local store, used when browser storage is disabled and in tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn insert_raw(&mut self, key: &str, value: impl Into<String>) {
        self.entries.insert(key.to_string(), value.into());
    }
}

impl KeyValueStore for MemoryStore {
    fn load<T: DeserializeOwned>(&self, key: &str) -> PlayerResult<Option<T>> {
        match self.entries.get(key) {
            Some(raw) => Ok(Some(serde_json::from_str(raw)?)),
            None => Ok(None),
        }
    }

    fn store<T: Serialize>(&mut self, key: &str, value: &T) -> PlayerResult<()> {
        let raw = serde_json::to_string(value)?;
        self.entries.insert(key.to_string(), raw);
        Ok(())
    }

    fn delete(&mut self, key: &str) -> PlayerResult<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Serializable subset of the player state that survives navigation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct PlaybackSnapshot {
    pub playlist_id: Option<String>,
    pub track_id: Option<String>,
    pub audio_url: Option<String>,
    pub track_index: usize,
    pub current_time: f64,
    pub volume: f64,
    pub is_muted: bool,
    pub is_playing: bool,
    pub should_resume: bool,
}

/// Save/restore/clear over a [`KeyValueStore`]. All failures are logged and
/// swallowed: playback carries on without persistence.
#[derive(Debug, Clone, Default)]
pub struct PlaybackStore<S> {
    backend: S,
}

impl<S: KeyValueStore> PlaybackStore<S> {
    pub fn new(backend: S) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    pub fn save(&mut self, snapshot: &PlaybackSnapshot) {
        if let Err(err) = self.backend.store(PLAYBACK_KEY, snapshot) {
            log::warn!("could not persist playback state: {err}");
        }
    }

    pub fn restore(&self) -> Option<PlaybackSnapshot> {
        match self.backend.load::<PlaybackSnapshot>(PLAYBACK_KEY) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                log::warn!("discarding unreadable playback state: {err}");
                None
            }
        }
    }

    pub fn clear(&mut self) {
        if let Err(err) = self.backend.delete(PLAYBACK_KEY) {
            log::warn!("could not clear playback state: {err}");
        }
    }

    /// Whether the shopper explicitly paused during an earlier page view.
    pub fn user_paused(&self) -> bool {
        match self.backend.load::<bool>(USER_PAUSED_KEY) {
            Ok(flag) => flag.unwrap_or(false),
            Err(err) => {
                log::warn!("could not read pause preference: {err}");
                false
            }
        }
    }

    /// Stored as the bare JSON `true`, deleted when cleared.
    pub fn set_user_paused(&mut self, paused: bool) {
        let result = if paused {
            self.backend.store(USER_PAUSED_KEY, &true)
        } else {
            self.backend.delete(USER_PAUSED_KEY)
        };
        if let Err(err) = result {
            log::warn!("could not persist pause preference: {err}");
        }
    }
}

/// Map a storage backend failure into the crate error.
#[cfg(any(target_arch = "wasm32", test))]
pub(crate) fn storage_error(err: impl std::fmt::Display) -> PlayerError {
    PlayerError::Storage(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn load<T: DeserializeOwned>(&self, _key: &str) -> PlayerResult<Option<T>> {
            Err(storage_error("disabled"))
        }

        fn store<T: Serialize>(&mut self, _key: &str, _value: &T) -> PlayerResult<()> {
            Err(storage_error("quota exceeded"))
        }

        fn delete(&mut self, _key: &str) -> PlayerResult<()> {
            Err(storage_error("disabled"))
        }
    }

    fn snapshot() -> PlaybackSnapshot {
        PlaybackSnapshot {
            playlist_id: Some("pl".into()),
            track_id: Some("t2".into()),
            audio_url: Some("https://cdn.example/2.mp3".into()),
            track_index: 1,
            current_time: 42.125,
            volume: 0.35,
            is_muted: true,
            is_playing: true,
            should_resume: true,
        }
    }

    #[test]
    fn save_then_restore_round_trips() {
        let mut store = PlaybackStore::new(MemoryStore::new());
        store.save(&snapshot());
        let restored = store.restore().expect("snapshot");
        assert!((restored.current_time - 42.125).abs() < 1e-9);
        assert!((restored.volume - 0.35).abs() < 1e-9);
        assert!(restored.is_muted);
        assert_eq!(restored, snapshot());
    }

    #[test]
    fn restore_on_empty_store_is_none() {
        let store = PlaybackStore::new(MemoryStore::new());
        assert_eq!(store.restore(), None);
    }

    #[test]
    fn clear_removes_snapshot() {
        let mut store = PlaybackStore::new(MemoryStore::new());
        store.save(&snapshot());
        store.clear();
        assert_eq!(store.restore(), None);
    }

    #[test]
    fn corrupt_snapshot_is_discarded() {
        let mut backend = MemoryStore::new();
        backend.insert_raw(PLAYBACK_KEY, "{broken");
        let store = PlaybackStore::new(backend);
        assert_eq!(store.restore(), None);
    }

    #[test]
    fn user_paused_flag_uses_literal_true() {
        let mut store = PlaybackStore::new(MemoryStore::new());
        assert!(!store.user_paused());
        store.set_user_paused(true);
        assert_eq!(store.backend().raw(USER_PAUSED_KEY), Some("true"));
        assert!(store.user_paused());
        store.set_user_paused(false);
        assert_eq!(store.backend().raw(USER_PAUSED_KEY), None);
    }

    #[test]
    fn storage_failures_never_escape() {
        let mut store = PlaybackStore::new(BrokenStore);
        store.save(&snapshot());
        store.clear();
        store.set_user_paused(true);
        assert_eq!(store.restore(), None);
        assert!(!store.user_paused());
    }
}
