//! The device model tree: Node -> Endpoint -> Cluster -> {Attribute, Command, Event}.
//!
//! Objects live in vectors owned by their parent and are addressed by
//! handles (indices). Handles stay valid for the lifetime of the node since
//! nothing is ever removed.

use bitflags::bitflags;
use tracing::warn;

use crate::{
    config::DataModelLimits,
    error::{ApplyError, Entity, ValueError},
};

use self::value::{AttrValue, Bounds};

pub mod hooks;
pub mod value;

bitflags! {
    #[derive(Copy, Clone, Default, Debug, PartialEq, Eq, Hash)]
    pub struct EndpointFlags: u32 {
        const DESTROYABLE = 0x01;
        const BRIDGE = 0x02;
    }
}

bitflags! {
    #[derive(Copy, Clone, Default, Debug, PartialEq, Eq, Hash)]
    pub struct ClusterFlags: u32 {
        const INIT_FUNCTION = 0x01;
        const ATTRIBUTE_CHANGED_FUNCTION = 0x02;
        const SHUTDOWN_FUNCTION = 0x04;
        const PRE_ATTRIBUTE_CHANGED_FUNCTION = 0x08;
        const SERVER = 0x40;
        const CLIENT = 0x80;
    }
}

bitflags! {
    #[derive(Copy, Clone, Default, Debug, PartialEq, Eq, Hash)]
    pub struct AttributeFlags: u32 {
        const WRITABLE = 0x01;
        const NONVOLATILE = 0x02;
        const MIN_MAX = 0x04;
        const MUST_USE_TIMED_WRITE = 0x08;
        const EXTERNAL_STORAGE = 0x10;
        const SINGLETON = 0x20;
        /// The only flag the value codec looks at
        const NULLABLE = 0x40;
    }
}

bitflags! {
    #[derive(Copy, Clone, Default, Debug, PartialEq, Eq, Hash)]
    pub struct CommandFlags: u32 {
        const CUSTOM = 0x01;
        const ACCEPTED = 0x02;
        const GENERATED = 0x04;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EndpointHandle(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClusterHandle {
    endpoint: usize,
    cluster: usize,
}

impl ClusterHandle {
    pub const fn endpoint(&self) -> EndpointHandle {
        EndpointHandle(self.endpoint)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttributeHandle {
    cluster: ClusterHandle,
    attribute: usize,
}

impl AttributeHandle {
    pub const fn cluster(&self) -> ClusterHandle {
        self.cluster
    }
}

/// Node (7.8), the root of the tree. Built fresh for every interpretation.
#[derive(Debug, Clone, Default)]
pub struct Node {
    endpoints: Vec<Endpoint>,
    limits: DataModelLimits,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint {
    /// Assigned in creation order
    pub id: u16,
    pub flags: EndpointFlags,
    pub device_types: Vec<DeviceType>,
    pub clusters: Vec<Cluster>,
}

/// Device Type (7.15)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceType {
    pub device_type: u32,
    pub device_revision: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    pub id: u32,
    pub flags: ClusterFlags,
    pub attributes: Vec<Attribute>,
    pub commands: Vec<Command>,
    pub events: Vec<Event>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub id: u32,
    pub flags: AttributeFlags,
    pub value: AttrValue,
    pub bounds: Option<Bounds>,
    /// Storage ceiling for string and octet values
    pub max_size: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    pub id: u32,
    pub flags: CommandFlags,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub id: u32,
}

impl Node {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: DataModelLimits) -> Self {
        Self {
            endpoints: Vec::new(),
            limits,
        }
    }

    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    pub fn endpoint(&self, handle: EndpointHandle) -> Option<&Endpoint> {
        self.endpoints.get(handle.0)
    }

    pub fn endpoint_mut(&mut self, handle: EndpointHandle) -> Option<&mut Endpoint> {
        self.endpoints.get_mut(handle.0)
    }

    pub fn cluster(&self, handle: ClusterHandle) -> Option<&Cluster> {
        self.endpoints
            .get(handle.endpoint)
            .and_then(|e| e.clusters.get(handle.cluster))
    }

    pub fn cluster_mut(&mut self, handle: ClusterHandle) -> Option<&mut Cluster> {
        self.endpoints
            .get_mut(handle.endpoint)
            .and_then(|e| e.clusters.get_mut(handle.cluster))
    }

    pub fn attribute(&self, handle: AttributeHandle) -> Option<&Attribute> {
        self.cluster(handle.cluster)
            .and_then(|c| c.attributes.get(handle.attribute))
    }

    pub fn attribute_mut(&mut self, handle: AttributeHandle) -> Option<&mut Attribute> {
        self.cluster_mut(handle.cluster)
            .and_then(|c| c.attributes.get_mut(handle.attribute))
    }

    /// Create an endpoint with the next free id. Returns `None` once the
    /// endpoint limit is reached.
    pub fn create_endpoint(&mut self, flags: EndpointFlags) -> Option<EndpointHandle> {
        if self.endpoints.len() >= self.limits.max_endpoints {
            warn!(max = self.limits.max_endpoints, "endpoint limit reached");
            return None;
        }
        let id = u16::try_from(self.endpoints.len()).ok()?;
        self.endpoints.push(Endpoint {
            id,
            flags,
            device_types: Vec::new(),
            clusters: Vec::new(),
        });
        Some(EndpointHandle(self.endpoints.len() - 1))
    }

    /// Create a cluster on an endpoint. An existing cluster with the same id
    /// is returned as-is.
    pub fn create_cluster(
        &mut self,
        endpoint: EndpointHandle,
        id: u32,
        flags: ClusterFlags,
    ) -> Option<ClusterHandle> {
        let ep = self.endpoints.get_mut(endpoint.0)?;
        let index = match ep.clusters.iter().position(|c| c.id == id) {
            Some(index) => {
                warn!(cluster_id = id, endpoint_id = ep.id, "cluster already exists");
                index
            }
            None => {
                ep.clusters.push(Cluster {
                    id,
                    flags,
                    attributes: Vec::new(),
                    commands: Vec::new(),
                    events: Vec::new(),
                });
                ep.clusters.len() - 1
            }
        };
        Some(ClusterHandle {
            endpoint: endpoint.0,
            cluster: index,
        })
    }

    /// Create an attribute on a cluster. An existing attribute with the same
    /// id is returned unchanged.
    pub fn create_attribute(
        &mut self,
        cluster: ClusterHandle,
        id: u32,
        flags: AttributeFlags,
        value: AttrValue,
        max_size: Option<u32>,
    ) -> Option<AttributeHandle> {
        let c = self.cluster_mut(cluster)?;
        let index = match c.attributes.iter().position(|a| a.id == id) {
            Some(index) => {
                warn!(attribute_id = id, cluster_id = c.id, "attribute already exists");
                index
            }
            None => {
                c.attributes.push(Attribute {
                    id,
                    flags,
                    value,
                    bounds: None,
                    max_size,
                });
                c.attributes.len() - 1
            }
        };
        Some(AttributeHandle {
            cluster,
            attribute: index,
        })
    }

    /// Attach bounds to an attribute. Both ends must have the type of the
    /// attribute value.
    pub fn add_bounds(&mut self, attribute: AttributeHandle, bounds: Bounds) -> Result<(), ApplyError> {
        let attr = self
            .attribute_mut(attribute)
            .ok_or(ApplyError::UnknownHandle)?;
        let value_type = attr.value.value_type();
        if !value_type.supports_bounds()
            || bounds.min.value_type() != value_type
            || bounds.max.value_type() != value_type
        {
            return Err(ValueError::BoundsType(value_type).into());
        }
        attr.bounds = Some(bounds);
        Ok(())
    }

    pub fn create_event(&mut self, cluster: ClusterHandle, id: u32) -> Option<&Event> {
        let c = self.cluster_mut(cluster)?;
        Some(c.create_event(id))
    }

    pub fn add_device_type(
        &mut self,
        endpoint: EndpointHandle,
        device_type: u32,
        device_revision: u32,
    ) -> Result<(), ApplyError> {
        let max = self.limits.max_device_types;
        let ep = self
            .endpoints
            .get_mut(endpoint.0)
            .ok_or(ApplyError::UnknownHandle)?;
        if ep.device_types.len() >= max {
            warn!(endpoint_id = ep.id, max, "device type limit reached");
            return Err(ApplyError::Allocation(Entity::DeviceType(device_type)));
        }
        ep.device_types.push(DeviceType {
            device_type,
            device_revision,
        });
        Ok(())
    }
}

impl Endpoint {
    pub fn cluster(&self, id: u32) -> Option<&Cluster> {
        self.clusters.iter().find(|c| c.id == id)
    }
}

impl Cluster {
    pub fn attribute(&self, id: u32) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.id == id)
    }

    pub fn command(&self, id: u32) -> Option<&Command> {
        self.commands.iter().find(|c| c.id == id)
    }

    pub fn event(&self, id: u32) -> Option<&Event> {
        self.events.iter().find(|e| e.id == id)
    }

    /// Record a command. Registering the same id twice merges the flags.
    pub fn create_command(&mut self, id: u32, flags: CommandFlags) -> &Command {
        let index = match self.commands.iter().position(|c| c.id == id) {
            Some(index) => {
                self.commands[index].flags |= flags;
                index
            }
            None => {
                self.commands.push(Command { id, flags });
                self.commands.len() - 1
            }
        };
        &self.commands[index]
    }

    pub fn create_event(&mut self, id: u32) -> &Event {
        let index = match self.events.iter().position(|e| e.id == id) {
            Some(index) => index,
            None => {
                self.events.push(Event { id });
                self.events.len() - 1
            }
        };
        &self.events[index]
    }
}
