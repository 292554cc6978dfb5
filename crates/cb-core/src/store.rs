//! Key/value persistence for user preferences
//!
//! The engine stores two kinds of values: manual legend colors keyed by a
//! class's color storage key, and per-field sort preferences keyed by
//! `SORT|{field}`. Any backend offering get/set/remove will do.

use std::sync::Arc;
use parking_lot::RwLock;
use ahash::AHashMap;

/// Key prefix of stored legend sort preferences
pub const SORT_KEY_PREFIX: &str = "SORT";

/// Storage key of the sort preference of a field
pub fn sort_key(field_name: &str) -> String {
    format!("{SORT_KEY_PREFIX}|{field_name}")
}

/// Trait for preference backends
pub trait PreferenceStore: Send + Sync {
    /// Get a stored value
    fn get(&self, key: &str) -> Option<String>;

    /// Store a value, replacing any previous one
    fn set(&self, key: &str, value: &str);

    /// Remove a value
    fn remove(&self, key: &str);

    /// Store `value`, or remove the key when `value` equals `default`
    fn set_or_clear(&self, key: &str, value: &str, default: &str) {
        if value == default {
            self.remove(key);
        } else {
            self.set(key, value);
        }
    }
}

/// In-memory preference store
#[derive(Clone, Default)]
pub struct MemoryStore {
    values: Arc<RwLock<AHashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.values.write().insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.values.write().remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert!(store.get("k").is_none());
        store.set("k", "v");
        assert_eq!(store.get("k").as_deref(), Some("v"));
        store.remove("k");
        assert!(store.is_empty());
    }

    #[test]
    fn test_set_or_clear_drops_default() {
        let store = MemoryStore::new();
        store.set_or_clear(&sort_key("cluster"), "name", "count");
        assert_eq!(store.get("SORT|cluster").as_deref(), Some("name"));
        store.set_or_clear(&sort_key("cluster"), "count", "count");
        assert!(store.get("SORT|cluster").is_none());
    }
}
