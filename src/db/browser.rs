use super::{storage_error, KeyValueStore};
use crate::error::PlayerResult;
use gloo_storage::errors::StorageError;
use gloo_storage::{LocalStorage, Storage};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// `localStorage`-backed store. gloo's accessors throw when storage is
/// disabled, so availability is checked once up front.
#[derive(Debug, Clone, Copy)]
pub struct BrowserStorage {
    available: bool,
}

impl BrowserStorage {
    pub fn new() -> Self {
        let available = web_sys::window()
            .and_then(|w| w.local_storage().ok().flatten())
            .is_some();
        if !available {
            log::warn!("localStorage unavailable, playback state will not persist");
        }
        Self { available }
    }

    pub fn is_available(&self) -> bool {
        self.available
    }
}

impl Default for BrowserStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for BrowserStorage {
    fn load<T: DeserializeOwned>(&self, key: &str) -> PlayerResult<Option<T>> {
        if !self.available {
            return Ok(None);
        }
        match LocalStorage::get::<T>(key) {
            Ok(value) => Ok(Some(value)),
            Err(StorageError::KeyNotFound(_)) => Ok(None),
            Err(err) => Err(storage_error(err)),
        }
    }

    fn store<T: Serialize>(&mut self, key: &str, value: &T) -> PlayerResult<()> {
        if !self.available {
            return Ok(());
        }
        LocalStorage::set(key, value).map_err(storage_error)
    }

    fn delete(&mut self, key: &str) -> PlayerResult<()> {
        if self.available {
            LocalStorage::delete(key);
        }
        Ok(())
    }
}
