//! Persisted wallet state.
//!
//! A small key/value abstraction ([`KeyValueStore`]) with an in-memory and
//! a JSON-file backend, plus the typed [`WalletStore`] facade that knows the
//! wallet's key layout.

mod file;
mod memory;
mod wallet;

pub use file::JsonFileStore;
pub use memory::MemoryStore;
pub use wallet::{keys, WalletStore};

use crate::error::CoreError;

/// Minimal key/value contract over JSON values.
///
/// Writes are per key, so two writers racing on the same key can at worst
/// store the same value twice.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<serde_json::Value>, CoreError>;

    /// Fetch several keys at once; missing keys are absent from the result.
    fn get_many(
        &self,
        keys: &[String],
    ) -> Result<std::collections::HashMap<String, serde_json::Value>, CoreError> {
        let mut found = std::collections::HashMap::with_capacity(keys.len());
        for key in keys {
            if let Some(value) = self.get(key)? {
                found.insert(key.clone(), value);
            }
        }
        Ok(found)
    }

    fn set(&self, key: &str, value: serde_json::Value) -> Result<(), CoreError>;

    fn remove(&self, key: &str) -> Result<(), CoreError>;

    fn clear(&self) -> Result<(), CoreError>;
}
