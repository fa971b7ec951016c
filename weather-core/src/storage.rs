//! Persistence of the session location.

use std::{collections::BTreeMap, fmt::Debug, fs, path::PathBuf};

use anyhow::anyhow;
use directories::ProjectDirs;
use parking_lot::Mutex;

use crate::error::StorageError;

/// Key the session location is stored under.
pub const LOCATION_KEY: &str = "userLocation";

/// Synchronous key-value storage of the cached location.
pub trait LocationStore: Send + Sync + Debug {
    /// The cached location; empty strings count as absent.
    fn get(&self) -> Option<String>;

    fn set(&self, location: &str) -> Result<(), StorageError>;

    fn clear(&self) -> Result<(), StorageError>;
}

/// Store kept in memory for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemoryLocationStore {
    value: Mutex<Option<String>>,
}

impl MemoryLocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_location(location: impl Into<String>) -> Self {
        Self { value: Mutex::new(Some(location.into())) }
    }
}

impl LocationStore for MemoryLocationStore {
    fn get(&self) -> Option<String> {
        self.value.lock().clone().filter(|v| !v.is_empty())
    }

    fn set(&self, location: &str) -> Result<(), StorageError> {
        *self.value.lock() = Some(location.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        *self.value.lock() = None;
        Ok(())
    }
}

/// Store backed by a small JSON object on disk, e.g. `{"userLocation": "51.5, -0.12"}`.
#[derive(Debug, Clone)]
pub struct FileLocationStore {
    path: PathBuf,
}

impl FileLocationStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the platform data directory.
    pub fn open_default() -> anyhow::Result<Self> {
        Ok(Self::new(Self::default_path()?))
    }

    pub fn default_path() -> anyhow::Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-task", "weather-cli")
            .ok_or_else(|| anyhow!("Could not determine platform data directory"))?;

        Ok(dirs.data_dir().join("storage.json"))
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>, StorageError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&contents)?)
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(entries)?)?;
        Ok(())
    }
}

impl LocationStore for FileLocationStore {
    fn get(&self) -> Option<String> {
        match self.read_entries() {
            Ok(mut entries) => entries.remove(LOCATION_KEY).filter(|v| !v.is_empty()),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "Failed to read location storage: {e}");
                None
            }
        }
    }

    fn set(&self, location: &str) -> Result<(), StorageError> {
        // A corrupt file is replaced rather than blocking the write.
        let mut entries = self.read_entries().unwrap_or_default();
        entries.insert(LOCATION_KEY.to_string(), location.to_string());
        self.write_entries(&entries)
    }

    fn clear(&self) -> Result<(), StorageError> {
        let mut entries = self.read_entries().unwrap_or_default();
        if entries.remove(LOCATION_KEY).is_some() {
            self.write_entries(&entries)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_treats_empty_as_absent() {
        let store = MemoryLocationStore::new();
        assert_eq!(store.get(), None);

        store.set("").unwrap();
        assert_eq!(store.get(), None);

        store.set("Paris").unwrap();
        assert_eq!(store.get().as_deref(), Some("Paris"));

        store.clear().unwrap();
        assert_eq!(store.get(), None);
    }

    #[test]
    fn file_store_roundtrips_under_fixed_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("storage.json");
        let store = FileLocationStore::new(&path);

        assert_eq!(store.get(), None);
        store.set("51.5074, -0.1278").unwrap();

        let raw: BTreeMap<String, String> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw.get("userLocation").map(String::as_str), Some("51.5074, -0.1278"));

        let reopened = FileLocationStore::new(&path);
        assert_eq!(reopened.get().as_deref(), Some("51.5074, -0.1278"));
    }

    #[test]
    fn file_store_keeps_unrelated_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        fs::write(&path, r#"{"theme":"dark","userLocation":"Oslo"}"#).unwrap();

        let store = FileLocationStore::new(&path);
        store.clear().unwrap();
        assert_eq!(store.get(), None);

        let raw: BTreeMap<String, String> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw.get("theme").map(String::as_str), Some("dark"));
    }

    #[test]
    fn corrupt_file_reads_as_empty_and_is_replaced_on_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        fs::write(&path, "not json").unwrap();

        let store = FileLocationStore::new(&path);
        assert_eq!(store.get(), None);

        store.set("Lima").unwrap();
        assert_eq!(store.get().as_deref(), Some("Lima"));
    }
}
