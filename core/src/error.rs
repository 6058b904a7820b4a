use core::fmt;

use thiserror::Error;

use crate::{data_model::value::ValueType, message::command::CommandKind};

/// The buffer can no longer be split into messages. Always fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FramingError {
    #[error("no terminating byte in the first {scanned} bytes of the length prefix")]
    MalformedPrefix { scanned: usize },
    #[error("length prefix of {length} is too large")]
    LengthOverflow { length: u64 },
    #[error("data too short after length prefix of {length}, {available} bytes available")]
    Truncated { length: u64, available: usize },
}

/// A framed payload does not deserialize into a command. Always fatal.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error(transparent)]
    Protobuf(#[from] prost::DecodeError),
    #[error("function call carries no parameters")]
    MissingParams,
}

/// Producing a typed value from a value descriptor failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    #[error("unknown value type {0}")]
    UnknownType(i32),
    #[error("bounds are not supported for {0:?}")]
    BoundsType(ValueType),
    #[error("payload does not carry a {0:?}")]
    Mismatch(ValueType),
    #[error("{value} does not fit in {value_type:?}")]
    OutOfRange { value_type: ValueType, value: i128 },
    #[error("{value_type:?} of {len} bytes exceeds the {limit} byte limit")]
    TooLong {
        value_type: ValueType,
        len: usize,
        limit: usize,
    },
    #[error("value of {len} bytes exceeds the requested maximum size of {max_size}")]
    ExceedsMaxSize { len: usize, max_size: u32 },
}

/// Something the device model runtime was asked to create and did not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Endpoint,
    Cluster(u32),
    Attribute(u32),
    Command(u32),
    Event(u32),
    DeviceType(u32),
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entity::Endpoint => write!(f, "endpoint"),
            Entity::Cluster(id) => write!(f, "cluster {id:#06x}"),
            Entity::Attribute(id) => write!(f, "attribute {id:#06x}"),
            Entity::Command(id) => write!(f, "command {id:#06x}"),
            Entity::Event(id) => write!(f, "event {id:#06x}"),
            Entity::DeviceType(id) => write!(f, "device type {id:#06x}"),
        }
    }
}

/// Raised by an injected side effect (cluster plugin init, command registration).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct HookError(pub String);

impl HookError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Applying one decoded command failed. The command is skipped and the
/// stream continues.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApplyError {
    #[error("no current endpoint")]
    NoCurrentEndpoint,
    #[error("no current cluster")]
    NoCurrentCluster,
    #[error(transparent)]
    Value(#[from] ValueError),
    #[error("failed to create {0}")]
    Allocation(Entity),
    #[error("handle does not belong to this node")]
    UnknownHandle,
    #[error("plugin init failed for cluster {cluster_id:#06x}: {source}")]
    PluginInit { cluster_id: u32, source: HookError },
    #[error("failed to register command {command_id:#06x} on cluster {cluster_id:#06x}: {source}")]
    CommandRegistration {
        cluster_id: u32,
        command_id: u32,
        source: HookError,
    },
}

/// Interpretation was aborted. No node is produced.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InterpretError {
    #[error("failed to read length-prefixed data for message {index} at offset {offset}")]
    Framing {
        index: usize,
        offset: usize,
        #[source]
        source: FramingError,
    },
    #[error("failed to unpack message {index} at offset {offset}")]
    Decode {
        index: usize,
        offset: usize,
        #[source]
        source: DecodeError,
    },
    #[error("failed to apply {kind:?} for message {index}")]
    Command {
        index: usize,
        kind: CommandKind,
        #[source]
        source: ApplyError,
    },
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("key {0:?} not found")]
    NotFound(String),
    #[error("invalid key {0:?}")]
    InvalidKey(String),
    #[error("storage backend failure: {0}")]
    Backend(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }
}

/// Resolving the data model blob failed. Callers get no bytes.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to get running partition")]
    NoRunningPartition,
    #[error("fallback key {key:?} not found")]
    FallbackUnavailable {
        key: String,
        #[source]
        source: Option<StorageError>,
    },
    #[error("failed to write data model blob to new key {key:?}")]
    Promotion {
        key: String,
        #[source]
        source: StorageError,
    },
}
