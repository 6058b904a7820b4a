//! Blob store access and the data model key resolver.

use std::collections::HashMap;

use crate::error::StorageError;

#[cfg(feature = "file-storage")]
pub mod file;
pub mod manager;

#[cfg(feature = "file-storage")]
pub use file::FileStorage;

/// A key/value store for data model blobs. Each call is assumed atomic on
/// its own, nothing more.
pub trait DataModelStorage {
    /// Returns [`StorageError::NotFound`] when the key does not exist.
    fn get_data_model(&self, key: &str) -> Result<Vec<u8>, StorageError>;

    fn set_data_model(&mut self, key: &str, data: &[u8]) -> Result<(), StorageError>;

    fn remove_key(&mut self, key: &str) -> Result<(), StorageError>;
}

/// Source of the label of the partition the firmware is running from.
pub trait RunningPartition {
    fn running_partition_label(&self) -> Option<String>;
}

impl<F> RunningPartition for F
where
    F: Fn() -> Option<String>,
{
    fn running_partition_label(&self) -> Option<String> {
        self()
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, Vec<u8>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, key: impl Into<String>, data: &[u8]) -> Self {
        self.entries.insert(key.into(), data.to_vec());
        self
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl DataModelStorage for MemoryStorage {
    fn get_data_model(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        self.entries
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    fn set_data_model(&mut self, key: &str, data: &[u8]) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), data.to_vec());
        Ok(())
    }

    fn remove_key(&mut self, key: &str) -> Result<(), StorageError> {
        self.entries
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage() {
        let mut storage = MemoryStorage::new().with_entry("ota_0_dm", &[1, 2, 3]);
        assert_eq!(storage.get_data_model("ota_0_dm").unwrap(), vec![1, 2, 3]);
        assert!(storage.get_data_model("ota_1_dm").unwrap_err().is_not_found());

        storage.set_data_model("ota_1_dm", &[4]).unwrap();
        storage.remove_key("ota_0_dm").unwrap();
        assert!(storage.remove_key("ota_0_dm").unwrap_err().is_not_found());
        assert!(storage.contains_key("ota_1_dm"));
        assert_eq!(storage.len(), 1);
    }

    #[test]
    fn test_closure_as_partition() {
        let partition = || Some("ota_1".to_string());
        assert_eq!(partition.running_partition_label().as_deref(), Some("ota_1"));
    }
}
