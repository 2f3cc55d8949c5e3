use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::CoreError;

use super::KeyValueStore;

/// Ephemeral store backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, serde_json::Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> CoreError {
    CoreError::Store("memory store lock poisoned".to_owned())
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<serde_json::Value>, CoreError> {
        Ok(self.entries.read().map_err(|_| poisoned())?.get(key).cloned())
    }

    fn set(&self, key: &str, value: serde_json::Value) -> Result<(), CoreError> {
        self.entries
            .write()
            .map_err(|_| poisoned())?
            .insert(key.to_owned(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CoreError> {
        self.entries.write().map_err(|_| poisoned())?.remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<(), CoreError> {
        self.entries.write().map_err(|_| poisoned())?.clear();
        Ok(())
    }
}
