//! Runtime configuration for the interpreter and the blob resolver.

use crate::constants::{
    DATA_MODEL_KEY_SUFFIX, DEFAULT_MAX_DEVICE_TYPES, DEFAULT_MAX_ENDPOINTS,
    FALLBACK_DATA_MODEL_KEY,
};

/// Capacity of the device model runtime. Creation calls past these limits
/// produce no object, which the builder reports as an allocation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataModelLimits {
    pub max_endpoints: usize,
    /// Per endpoint
    pub max_device_types: usize,
}

impl Default for DataModelLimits {
    fn default() -> Self {
        Self {
            max_endpoints: DEFAULT_MAX_ENDPOINTS,
            max_device_types: DEFAULT_MAX_DEVICE_TYPES,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InterpreterConfig {
    pub limits: DataModelLimits,
    /// Treat the first failed command as fatal instead of skipping it.
    /// Framing and decoding errors are always fatal.
    pub abort_on_command_failure: bool,
}

impl InterpreterConfig {
    pub const fn with_limits(mut self, limits: DataModelLimits) -> Self {
        self.limits = limits;
        self
    }

    pub const fn abort_on_command_failure(mut self, abort: bool) -> Self {
        self.abort_on_command_failure = abort;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub key_suffix: String,
    pub fallback_key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            key_suffix: DATA_MODEL_KEY_SUFFIX.to_string(),
            fallback_key: FALLBACK_DATA_MODEL_KEY.to_string(),
        }
    }
}
