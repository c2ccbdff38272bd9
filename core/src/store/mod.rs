//! Durable client-local state
//!
//! Both stores persist through a [`KeyValueStore`] port: one named entry per
//! store, rewritten in full on every mutation. The file-backed port keeps one
//! JSON document per key; the in-memory port backs tests and throwaway sessions.

pub mod matrix;
pub mod results;

pub use matrix::{VariableValueMatrix, VARIABLE_VALUES_KEY};
pub use results::{ResultStore, PROMPT_RESULTS_KEY};

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::error::{BenchError, Result};

/// String-keyed, string-valued durable storage
pub trait KeyValueStore: Send + Sync {
    /// `Ok(None)` when nothing was stored under `key`
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value under `key`; synchronous and unconditional
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// One `<key>.json` file per entry under a directory
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    root_dir: PathBuf,
}

impl FileKeyValueStore {
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    /// `<data dir>/promptbench/state`
    pub fn default_location() -> Result<Self> {
        let root = dirs::data_dir().ok_or_else(|| BenchError::Storage {
            key: "*".to_string(),
            message: "could not find data directory".to_string(),
        })?;
        Ok(Self::new(root.join("promptbench").join("state")))
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(storage_error(key, "keys may only contain [A-Za-z0-9_-]"));
        }
        Ok(self.root_dir.join(format!("{}.json", key)))
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        if !path.exists() {
            return Ok(None);
        }
        fs::read_to_string(&path)
            .map(Some)
            .map_err(|e| storage_error(key, format!("failed to read {:?}: {}", path, e)))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        atomic_write(&path, value.as_bytes())
            .map_err(|e| storage_error(key, format!("failed to write {:?}: {}", path, e)))
    }
}

/// Process-local storage that forgets everything on drop
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

fn storage_error(key: &str, message: impl Into<String>) -> BenchError {
    BenchError::Storage {
        key: key.to_string(),
        message: message.into(),
    }
}

/// Read and deserialize a snapshot; missing, unreadable or corrupt all yield `None`
pub(crate) fn read_snapshot<T: serde::de::DeserializeOwned>(
    port: &dyn KeyValueStore,
    key: &str,
) -> Option<T> {
    let raw = match port.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!("Could not read snapshot '{}', starting empty: {}", key, e);
            return None;
        }
    };

    if raw.trim().is_empty() {
        return None;
    }

    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("Discarding corrupt snapshot '{}': {}", key, e);
            None
        }
    }
}

pub(crate) fn write_snapshot<T: serde::Serialize>(
    port: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<()> {
    let content = serde_json::to_string(value)?;
    port.set(key, &content)
}

fn atomic_write(dest: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }

    let tmp = dest.with_extension(format!("tmp.{}", uuid::Uuid::new_v4()));
    fs::write(&tmp, bytes)?;

    if let Err(rename_err) = fs::rename(&tmp, dest) {
        let _ = fs::remove_file(&tmp);
        return Err(rename_err);
    }
    Ok(())
}
