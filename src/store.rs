use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::errors::StoreError;

// --- Persisted Keys ---

pub mod keys {
    pub const VOLUME_DESIRED: &str = "volume.desired";
    pub const VOLUME_MUTED: &str = "volume.muted";
    pub const AUTOPLAY_REMAINING: &str = "autoplay.remaining";
    pub const CREDITS: &str = "credits";
    pub const WATCH_TIME: &str = "watchTime";
    pub const HISTORY: &str = "watchHistory";
}

// --- Capability Trait ---

/// Key-value persistence capability handed to every component. Backends are
/// interchangeable; consumers never branch on which one they got.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> Option<Value>;
    fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Typed convenience layer. Writes absorb backend failures with a warning:
/// persistence trouble degrades a feature, it never breaks a cycle.
pub trait KvStoreExt {
    fn get_typed<T: DeserializeOwned>(&self, key: &str) -> Option<T>;
    fn put_typed<T: Serialize>(&self, key: &str, value: &T);
}

impl<S: KvStore + ?Sized> KvStoreExt for S {
    fn get_typed<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.get(key)?;
        match serde_json::from_value(raw) {
            Ok(v) => Some(v),
            Err(e) => {
                log::warn!("Stored value under '{}' has unexpected shape: {}", key, e);
                None
            }
        }
    }

    fn put_typed<T: Serialize>(&self, key: &str, value: &T) {
        let raw = match serde_json::to_value(value) {
            Ok(v) => v,
            Err(e) => {
                log::warn!("Failed to serialize value for '{}': {}", key, e);
                return;
            }
        };
        if let Err(e) = self.set(key, raw) {
            log::warn!("Failed to persist '{}': {}", key, e);
        }
    }
}

// --- In-Memory Backend ---

#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("memory store lock: {}", e)))?;
        entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("memory store lock: {}", e)))?;
        entries.remove(key);
        Ok(())
    }
}

// --- File Backend ---

/// All keys live in one JSON document on disk, rewritten on every set. Cheap
/// for the handful of small values this engine persists.
pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, Value>>,
}

impl JsonFileStore {
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = match std::fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str::<HashMap<String, Value>>(&text) {
                Ok(map) => map,
                Err(e) => {
                    log::warn!(
                        "Store document '{}' is corrupt ({}); starting empty",
                        path.display(),
                        e
                    );
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };
        JsonFileStore {
            path,
            entries: Mutex::new(entries),
        }
    }

    fn flush(&self, entries: &HashMap<String, Value>) -> Result<(), StoreError> {
        let text = serde_json::to_string_pretty(entries)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::WriteFailed {
                path: self.path.display().to_string(),
                source,
            })?;
        }
        std::fs::write(&self.path, text).map_err(|source| StoreError::WriteFailed {
            path: self.path.display().to_string(),
            source,
        })
    }
}

impl KvStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("file store lock: {}", e)))?;
        entries.insert(key.to_string(), value);
        self.flush(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("file store lock: {}", e)))?;
        entries.remove(key);
        self.flush(&entries)
    }
}

// --- Fallback Chain ---

/// Primary backend with a transparent fallback. Reads consult the primary
/// first; writes that fail on the primary land on the fallback instead. The
/// rest of the engine never learns which backend served it.
pub struct FallbackStore {
    primary: Box<dyn KvStore>,
    fallback: Box<dyn KvStore>,
}

impl FallbackStore {
    pub fn new(primary: Box<dyn KvStore>, fallback: Box<dyn KvStore>) -> Self {
        FallbackStore { primary, fallback }
    }
}

impl KvStore for FallbackStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.primary.get(key).or_else(|| self.fallback.get(key))
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        match self.primary.set(key, value.clone()) {
            Ok(()) => Ok(()),
            Err(e) => {
                log::debug!("Primary store rejected '{}' ({}); using fallback", key, e);
                self.fallback.set(key, value)
            }
        }
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let primary = self.primary.remove(key);
        let fallback = self.fallback.remove(key);
        primary.or(fallback)
    }
}
