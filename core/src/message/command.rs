//! Commands carried in a data model blob.
//!
//! Each framed payload is one protobuf `FunctionCall`:
//!
//! ```text
//! message FunctionCall {
//!   oneof params {
//!     CreateEndpointParams create_endpoint_params = 1;
//!     CreateClusterParams create_cluster_params = 2;
//!     CreateAttributeParams create_attribute_params = 3;
//!     CreateCommandParams create_command_params = 4;
//!     CreateEventParams create_event_params = 5;
//!     EndpointAddDeviceTypeParams endpoint_add_device_type_params = 6;
//!   }
//! }
//! ```

use bytes::BufMut;
use prost::Message;

use crate::error::DecodeError;

#[derive(Clone, PartialEq, Message)]
pub struct FunctionCall {
    #[prost(oneof = "function_call::Params", tags = "1, 2, 3, 4, 5, 6")]
    pub params: Option<function_call::Params>,
}

pub mod function_call {
    use super::*;

    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Params {
        #[prost(message, tag = "1")]
        CreateEndpointParams(CreateEndpointParams),
        #[prost(message, tag = "2")]
        CreateClusterParams(CreateClusterParams),
        #[prost(message, tag = "3")]
        CreateAttributeParams(CreateAttributeParams),
        #[prost(message, tag = "4")]
        CreateCommandParams(CreateCommandParams),
        #[prost(message, tag = "5")]
        CreateEventParams(CreateEventParams),
        #[prost(message, tag = "6")]
        EndpointAddDeviceTypeParams(EndpointAddDeviceTypeParams),
    }
}

#[derive(Clone, PartialEq, Message)]
pub struct CreateEndpointParams {
    /// Only used in diagnostics, the runtime assigns the real id
    #[prost(uint32, tag = "1")]
    pub endpoint_id: u32,
    #[prost(uint32, tag = "2")]
    pub flags: u32,
}

#[derive(Clone, PartialEq, Message)]
pub struct CreateClusterParams {
    #[prost(uint32, tag = "1")]
    pub cluster_id: u32,
    #[prost(uint32, tag = "2")]
    pub flags: u32,
}

#[derive(Clone, PartialEq, Message)]
pub struct CreateAttributeParams {
    #[prost(uint32, tag = "1")]
    pub attribute_id: u32,
    #[prost(uint32, tag = "2")]
    pub flags: u32,
    #[prost(message, optional, tag = "3")]
    pub val: Option<TypedValue>,
    #[prost(message, optional, tag = "4")]
    pub bounds_min: Option<Value>,
    #[prost(message, optional, tag = "5")]
    pub bounds_max: Option<Value>,
    /// Only meaningful for string and octet types
    #[prost(uint32, optional, tag = "6")]
    pub max_val_size: Option<u32>,
}

#[derive(Clone, PartialEq, Message)]
pub struct CreateCommandParams {
    #[prost(uint32, tag = "1")]
    pub cluster_id: u32,
    #[prost(uint32, tag = "2")]
    pub command_id: u32,
    #[prost(uint32, tag = "3")]
    pub flags: u32,
}

#[derive(Clone, PartialEq, Message)]
pub struct CreateEventParams {
    #[prost(uint32, tag = "1")]
    pub event_id: u32,
}

#[derive(Clone, PartialEq, Message)]
pub struct EndpointAddDeviceTypeParams {
    #[prost(uint32, tag = "1")]
    pub device_type_id: u32,
    #[prost(uint32, tag = "2")]
    pub device_type_version: u32,
}

/// Value descriptor: a [`crate::data_model::value::ValueType`] tag and an
/// optional payload.
#[derive(Clone, PartialEq, Message)]
pub struct TypedValue {
    #[prost(int32, tag = "1")]
    pub r#type: i32,
    #[prost(message, optional, tag = "2")]
    pub val: Option<Value>,
}

#[derive(Clone, PartialEq, Message)]
pub struct Value {
    #[prost(oneof = "value::Kind", tags = "1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13")]
    pub kind: Option<value::Kind>,
}

pub mod value {
    use super::*;

    /// Narrow integers travel in the smallest protobuf type that holds them.
    /// Bitmaps and enums share the unsigned field of their width.
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Kind {
        #[prost(bool, tag = "1")]
        B(bool),
        #[prost(int32, tag = "2")]
        I8(i32),
        #[prost(uint32, tag = "3")]
        U8(u32),
        #[prost(int32, tag = "4")]
        I16(i32),
        #[prost(uint32, tag = "5")]
        U16(u32),
        #[prost(int32, tag = "6")]
        I32(i32),
        #[prost(uint32, tag = "7")]
        U32(u32),
        #[prost(int64, tag = "8")]
        I64(i64),
        #[prost(uint64, tag = "9")]
        U64(u64),
        #[prost(float, tag = "10")]
        F(f32),
        #[prost(string, tag = "11")]
        CharString(String),
        #[prost(bytes = "vec", tag = "12")]
        OctetString(Vec<u8>),
        #[prost(message, tag = "13")]
        A(ArrayValue),
    }
}

impl Value {
    pub fn new(kind: value::Kind) -> Self {
        Self { kind: Some(kind) }
    }
}

/// Pre-encoded array elements and their count.
#[derive(Clone, PartialEq, Message)]
pub struct ArrayValue {
    #[prost(bytes = "vec", tag = "1")]
    pub elements: Vec<u8>,
    #[prost(uint32, tag = "2")]
    pub n: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    CreateEndpoint,
    CreateCluster,
    CreateAttribute,
    CreateCommand,
    CreateEvent,
    AddDeviceTypeToEndpoint,
}

/// One decoded message, ready to be applied by the model builder.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedCommand {
    CreateEndpoint(CreateEndpointParams),
    CreateCluster(CreateClusterParams),
    CreateAttribute(CreateAttributeParams),
    CreateCommand(CreateCommandParams),
    CreateEvent(CreateEventParams),
    AddDeviceTypeToEndpoint(EndpointAddDeviceTypeParams),
}

impl DecodedCommand {
    /// Deserialize a framed payload. A payload that is not a function call,
    /// or one whose parameters are unset or of an unknown kind, is rejected.
    pub fn decode(payload: &[u8]) -> Result<Self, DecodeError> {
        let call = FunctionCall::decode(payload)?;
        call.params.map(Self::from).ok_or(DecodeError::MissingParams)
    }

    pub fn kind(&self) -> CommandKind {
        match self {
            DecodedCommand::CreateEndpoint(_) => CommandKind::CreateEndpoint,
            DecodedCommand::CreateCluster(_) => CommandKind::CreateCluster,
            DecodedCommand::CreateAttribute(_) => CommandKind::CreateAttribute,
            DecodedCommand::CreateCommand(_) => CommandKind::CreateCommand,
            DecodedCommand::CreateEvent(_) => CommandKind::CreateEvent,
            DecodedCommand::AddDeviceTypeToEndpoint(_) => CommandKind::AddDeviceTypeToEndpoint,
        }
    }

    pub fn encode_length_delimited(&self, out: &mut impl BufMut) -> Result<(), prost::EncodeError> {
        FunctionCall::from(self.clone()).encode_length_delimited(out)
    }

    pub fn create_endpoint(endpoint_id: u32, flags: u32) -> Self {
        Self::CreateEndpoint(CreateEndpointParams { endpoint_id, flags })
    }

    pub fn create_cluster(cluster_id: u32, flags: u32) -> Self {
        Self::CreateCluster(CreateClusterParams { cluster_id, flags })
    }

    pub fn create_command(cluster_id: u32, command_id: u32, flags: u32) -> Self {
        Self::CreateCommand(CreateCommandParams {
            cluster_id,
            command_id,
            flags,
        })
    }

    pub fn create_event(event_id: u32) -> Self {
        Self::CreateEvent(CreateEventParams { event_id })
    }

    pub fn add_device_type(device_type_id: u32, device_type_version: u32) -> Self {
        Self::AddDeviceTypeToEndpoint(EndpointAddDeviceTypeParams {
            device_type_id,
            device_type_version,
        })
    }
}

impl From<function_call::Params> for DecodedCommand {
    fn from(params: function_call::Params) -> Self {
        use function_call::Params;
        match params {
            Params::CreateEndpointParams(p) => Self::CreateEndpoint(p),
            Params::CreateClusterParams(p) => Self::CreateCluster(p),
            Params::CreateAttributeParams(p) => Self::CreateAttribute(p),
            Params::CreateCommandParams(p) => Self::CreateCommand(p),
            Params::CreateEventParams(p) => Self::CreateEvent(p),
            Params::EndpointAddDeviceTypeParams(p) => Self::AddDeviceTypeToEndpoint(p),
        }
    }
}

impl From<DecodedCommand> for FunctionCall {
    fn from(command: DecodedCommand) -> Self {
        use function_call::Params;
        let params = match command {
            DecodedCommand::CreateEndpoint(p) => Params::CreateEndpointParams(p),
            DecodedCommand::CreateCluster(p) => Params::CreateClusterParams(p),
            DecodedCommand::CreateAttribute(p) => Params::CreateAttributeParams(p),
            DecodedCommand::CreateCommand(p) => Params::CreateCommandParams(p),
            DecodedCommand::CreateEvent(p) => Params::CreateEventParams(p),
            DecodedCommand::AddDeviceTypeToEndpoint(p) => Params::EndpointAddDeviceTypeParams(p),
        };
        Self {
            params: Some(params),
        }
    }
}
