//! Finds the data model blob of the running partition.
//!
//! Each OTA slot keeps its blob under `<label>_dm`. A slot booting for the
//! first time has no such key and adopts the factory blob instead, which is
//! then moved under the slot's own key.

use heapless::String as KeyString;
use tracing::{debug, info, warn};

use crate::{
    config::StorageConfig,
    constants::PRIMARY_KEY_CAPACITY,
    error::LoadError,
    storage::{DataModelStorage, RunningPartition},
};

pub type PrimaryKey = KeyString<PRIMARY_KEY_CAPACITY>;

#[derive(Debug)]
pub struct DataModelManager<S> {
    storage: S,
    config: StorageConfig,
}

impl<S: DataModelStorage> DataModelManager<S> {
    pub fn new(storage: S) -> Self {
        Self::with_config(StorageConfig::default(), storage)
    }

    pub fn with_config(config: StorageConfig, storage: S) -> Self {
        Self { storage, config }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn into_inner(self) -> S {
        self.storage
    }

    /// `label` followed by the key suffix. Anything past the key capacity is
    /// dropped, so two long labels sharing a prefix map to the same key.
    pub fn primary_key(&self, label: &str) -> PrimaryKey {
        let mut key = PrimaryKey::new();
        let mut truncated = false;
        for c in label.chars().chain(self.config.key_suffix.chars()) {
            if key.push(c).is_err() {
                truncated = true;
                break;
            }
        }
        if truncated {
            warn!(label, key = key.as_str(), "data model key truncated");
        }
        key
    }

    /// Load the blob of the partition `label`, promoting the fallback blob
    /// when the partition has none of its own.
    pub fn load(&mut self, label: &str) -> Result<Vec<u8>, LoadError> {
        let primary = self.primary_key(label);
        match self.storage.get_data_model(&primary) {
            Ok(data) if !data.is_empty() => {
                debug!(key = primary.as_str(), len = data.len(), "loaded data model");
                return Ok(data);
            }
            Ok(_) => debug!(key = primary.as_str(), "data model blob is empty"),
            Err(e) if e.is_not_found() => {
                debug!(key = primary.as_str(), "no data model under primary key")
            }
            Err(e) => warn!(key = primary.as_str(), error = %e, "failed to read data model"),
        }

        let fallback = self.config.fallback_key.clone();
        let data = match self.storage.get_data_model(&fallback) {
            Ok(data) if !data.is_empty() => data,
            Ok(_) => {
                warn!(key = fallback.as_str(), "fallback data model blob is empty");
                return Err(LoadError::FallbackUnavailable {
                    key: fallback,
                    source: None,
                });
            }
            Err(e) => {
                warn!(key = fallback.as_str(), error = %e, "fallback data model not found");
                return Err(LoadError::FallbackUnavailable {
                    key: fallback,
                    source: Some(e),
                });
            }
        };

        // Same key, nothing to move
        if primary.as_str() == fallback {
            return Ok(data);
        }

        self.storage
            .set_data_model(&primary, &data)
            .map_err(|source| {
                warn!(key = primary.as_str(), error = %source, "failed to write data model");
                LoadError::Promotion {
                    key: primary.to_string(),
                    source,
                }
            })?;
        if let Err(e) = self.storage.remove_key(&fallback) {
            warn!(key = fallback.as_str(), error = %e, "failed to remove fallback data model");
        }
        info!(
            from = fallback.as_str(),
            to = primary.as_str(),
            len = data.len(),
            "promoted data model blob"
        );
        Ok(data)
    }

    /// Like [`Self::load`], with any failure turned into an empty blob.
    pub fn data_model_binary(&mut self, label: &str) -> Vec<u8> {
        self.load(label).unwrap_or_else(|e| {
            warn!(label, error = %e, "no data model available");
            Vec::new()
        })
    }

    pub fn load_running_partition<P>(&mut self, partition: &P) -> Result<Vec<u8>, LoadError>
    where
        P: RunningPartition + ?Sized,
    {
        let label = partition
            .running_partition_label()
            .ok_or(LoadError::NoRunningPartition)?;
        self.load(&label)
    }
}
