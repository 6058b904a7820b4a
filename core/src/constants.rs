//! All the constants used by the interpreter and the blob resolver.
//! Most of them have a runtime counterpart in [`crate::config`] that
//! defaults to the value here.

/// A varint length prefix is at most 5 bytes (35 bits of payload).
pub const MAX_PREFIX_LEN: usize = 5;
/// Messages are bounded below 2 GiB, which also keeps
/// `prefix_len + payload_len` from overflowing on 32-bit targets.
pub const MAX_MESSAGE_LEN: u64 = i32::MAX as u64;

/// Appended to the running partition label to form the primary key,
/// e.g. `ota_1` becomes `ota_1_dm`.
pub const DATA_MODEL_KEY_SUFFIX: &str = "_dm";
/// Key written by the factory image, promoted on first boot of another slot.
pub const FALLBACK_DATA_MODEL_KEY: &str = "ota_0_dm";
/// The primary key is formatted into a 32 byte C buffer, one of which is
/// the terminator. Longer keys are truncated.
pub const PRIMARY_KEY_CAPACITY: usize = 31;

// Device model limits
pub const DEFAULT_MAX_ENDPOINTS: usize = 16;
pub const DEFAULT_MAX_DEVICE_TYPES: usize = 8;

/// Short strings carry a one byte length, 0xFF is reserved for null.
pub const SHORT_STRING_MAX_LEN: usize = 254;
/// Long strings carry a two byte length, 0xFFFF is reserved for null.
pub const LONG_STRING_MAX_LEN: usize = 65534;
