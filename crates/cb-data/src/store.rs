//! Preference store persisted as a JSON object on disk

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use ahash::AHashMap;
use parking_lot::RwLock;
use tracing::{debug, warn};

use cb_core::PreferenceStore;
use crate::Result;

/// Keeps preferences in memory and rewrites the file after every change.
/// A failed write is logged; the in-memory value still applies.
pub struct JsonFileStore {
    path: PathBuf,
    values: RwLock<AHashMap<String, String>>,
}

impl JsonFileStore {
    /// Open a store, reading the file if it exists
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let values = if path.exists() {
            let text = fs::read_to_string(&path)?;
            let values: AHashMap<String, String> = serde_json::from_str(&text)?;
            debug!("Loaded {} preferences from {:?}", values.len(), path);
            values
        } else {
            AHashMap::new()
        };
        Ok(Self { path, values: RwLock::new(values) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }

    fn save(&self, values: &AHashMap<String, String>) {
        // sorted so the file diffs cleanly
        let sorted: BTreeMap<&String, &String> = values.iter().collect();
        let written = serde_json::to_string_pretty(&sorted)
            .map_err(crate::DataError::from)
            .and_then(|text| Ok(fs::write(&self.path, text)?));
        if let Err(e) = written {
            warn!("Cannot save preferences to {:?}: {}", self.path, e);
        }
    }
}

impl PreferenceStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut values = self.values.write();
        values.insert(key.to_string(), value.to_string());
        self.save(&values);
    }

    fn remove(&self, key: &str) {
        let mut values = self.values.write();
        if values.remove(key).is_some() {
            self.save(&values);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");

        let store = JsonFileStore::open(&path).unwrap();
        assert!(store.is_empty());
        store.set("SORT|cluster", "name");
        store.set("COL|cluster|T cells", "ff0000");
        store.remove("COL|cluster|T cells");
        drop(store);

        let store = JsonFileStore::open(&path).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("SORT|cluster").as_deref(), Some("name"));
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        fs::write(&path, "[1, 2").unwrap();
        assert!(JsonFileStore::open(&path).is_err());
    }

    #[test]
    fn test_unwritable_path_keeps_memory_value() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path().join("missing").join("prefs.json")).unwrap();
        store.set("k", "v");
        assert_eq!(store.get("k").as_deref(), Some("v"));
    }
}
