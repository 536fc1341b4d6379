//! Storage configuration

use serde::{Deserialize, Serialize};

use crate::storage::{
    MemoryDatabase, MemoryFactory, MemoryFlatStore, Partition, StoreResult, DEFAULT_FLAT_QUOTA,
};

/// Where notes live, how much the flat store may hold, and how chatty logging is.
///
/// Every field has a default, so `{}` is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Database name of the notes partition
    pub database: String,
    /// Object store name inside `database`
    pub store: String,
    /// Capacity ceiling of the in-memory flat store, in bytes
    pub flat_quota_bytes: usize,
    /// Default tracing filter directive (e.g. `"info"`, `"jotter_core=debug"`)
    pub log_filter: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database: "notes".to_string(),
            store: "notes".to_string(),
            flat_quota_bytes: DEFAULT_FLAT_QUOTA,
            log_filter: "info".to_string(),
        }
    }
}

impl StorageConfig {
    /// Parse a JSON configuration; missing fields take their defaults.
    pub fn from_json(json: &str) -> StoreResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// The notes partition named by this configuration.
    pub fn partition(&self) -> Partition {
        Partition::new(&self.database, &self.store)
    }

    /// In-memory backends for this configuration: a handle to the notes
    /// partition in `factory` and a flat store capped at `flat_quota_bytes`.
    pub fn memory_backends(&self, factory: &MemoryFactory) -> (MemoryDatabase, MemoryFlatStore) {
        (
            factory.create_store(&self.database, &self.store),
            MemoryFlatStore::with_quota(self.flat_quota_bytes),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FlatStore, StoreError};

    #[test]
    fn test_defaults() {
        let config = StorageConfig::from_json("{}").unwrap();
        assert_eq!(config, StorageConfig::default());
        assert_eq!(config.partition(), Partition::new("notes", "notes"));
        assert_eq!(config.flat_quota_bytes, 5 * 1024 * 1024);
    }

    #[test]
    fn test_partial_override() {
        let config = StorageConfig::from_json(r#"{"store":"drafts"}"#).unwrap();
        assert_eq!(config.database, "notes");
        assert_eq!(config.store, "drafts");
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn test_memory_backends_follow_config() {
        let config = StorageConfig::from_json(r#"{"database":"jot","flat_quota_bytes":16}"#).unwrap();
        let factory = MemoryFactory::new();

        let (db, flat) = config.memory_backends(&factory);

        assert_eq!(db.partition(), &Partition::new("jot", "notes"));
        assert!(matches!(
            flat.set_item("k", &"x".repeat(16)),
            Err(StoreError::QuotaExceeded { used: 17, limit: 16 })
        ));
    }

    #[test]
    fn test_invalid_json() {
        let result = StorageConfig::from_json("not json");
        assert!(matches!(result, Err(StoreError::Serialization(_))));
    }
}
