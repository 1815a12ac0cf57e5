//! Shared pipeline state store
//!
//! A keyed map from stage name to that stage's last output. Writes replace the
//! previous value wholesale; nothing is merged. The store is an owned value:
//! clones share the same underlying map, so a run hands a clone to each stage
//! that needs it and calls [`PipelineStateStore::clear_all`] between runs.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;
use tracing::debug;

/// Well-known store keys
pub mod keys {
    /// Canonical clustered-orders artifact
    pub const CLUSTERED_ORDERS: &str = "h3_clustered_orders";
    pub const TIME_OPTIMIZED_ROUTES: &str = "time_optimized_routes";
    pub const WEIGHT_OPTIMIZED_ROUTES: &str = "weight_optimized_routes";
    pub const VOLUME_OPTIMIZED_ROUTES: &str = "volume_optimized_routes";
    /// Ordered list of stages the collector found
    pub const OPTIMIZATION_STAGES: &str = "optimization_stages";
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store key '{key}' has not been written")]
    KeyMissing { key: String },

    #[error("Value under store key '{key}' does not have the expected shape: {source}")]
    Serialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Thread-safe last-write-wins map shared between pipeline stages
#[derive(Debug, Clone, Default)]
pub struct PipelineStateStore {
    entries: Arc<RwLock<HashMap<String, Value>>>,
}

impl PipelineStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Every mutation is a single map call, so a poisoned lock still guards a
    // consistent map.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Value>> {
        self.entries.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Value>> {
        self.entries.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Store `value` under `key`, replacing any previous value
    pub fn set(&self, key: impl Into<String>, value: Value) {
        let key = key.into();
        let replaced = self.write().insert(key.clone(), value).is_some();
        debug!(key = %key, replaced, "Store write");
    }

    /// Serialize and store a typed value
    pub fn set_typed<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let value = serde_json::to_value(value).map_err(|source| StoreError::Serialization {
            key: key.to_string(),
            source,
        })?;
        self.set(key, value);
        Ok(())
    }

    /// Current value under `key`, `None` if it was never written or was cleared
    pub fn get(&self, key: &str) -> Option<Value> {
        let value = self.read().get(key).cloned();
        debug!(key = %key, present = value.is_some(), "Store read");
        value
    }

    /// Typed read; an absent key is `Ok(None)`
    pub fn get_typed<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        self.get(key)
            .map(|value| {
                serde_json::from_value(value).map_err(|source| StoreError::Serialization {
                    key: key.to_string(),
                    source,
                })
            })
            .transpose()
    }

    /// Typed read for a key the caller cannot proceed without
    pub fn require<T: DeserializeOwned>(&self, key: &str) -> Result<T, StoreError> {
        self.get_typed(key)?.ok_or_else(|| StoreError::KeyMissing {
            key: key.to_string(),
        })
    }

    /// Remove one entry, returning it if present
    pub fn clear(&self, key: &str) -> Option<Value> {
        let removed = self.write().remove(key);
        debug!(key = %key, removed = removed.is_some(), "Store clear");
        removed
    }

    /// Remove every entry
    pub fn clear_all(&self) {
        let mut entries = self.write();
        let count = entries.len();
        entries.clear();
        debug!(cleared = count, "Store cleared");
    }

    pub fn contains(&self, key: &str) -> bool {
        self.read().contains_key(key)
    }

    /// Keys currently present, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}
