//! Applies decoded commands to a node, one at a time.

use tracing::{debug, error};

use crate::{
    data_model::{
        hooks::{ClusterHooks, CommandRegistration},
        value::{self, ValueType},
        AttributeFlags, ClusterFlags, ClusterHandle, CommandFlags, EndpointFlags, EndpointHandle,
        Node,
    },
    error::{ApplyError, Entity},
    message::command::{
        CreateAttributeParams, CreateClusterParams, CreateCommandParams, CreateEndpointParams,
        CreateEventParams, DecodedCommand, EndpointAddDeviceTypeParams,
    },
};

/// The endpoint and cluster the next commands apply to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    pub endpoint: Option<EndpointHandle>,
    pub cluster: Option<ClusterHandle>,
}

pub struct ModelBuilder<H> {
    node: Node,
    cursor: Cursor,
    hooks: H,
}

impl<H: ClusterHooks> ModelBuilder<H> {
    pub fn new(node: Node, hooks: H) -> Self {
        Self {
            node,
            cursor: Cursor::default(),
            hooks,
        }
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Hand over the tree. The cursor goes away with the builder.
    pub fn finish(self) -> Node {
        self.node
    }

    /// Apply one command. A failed command never leaves a half-set cursor:
    /// the slot it would have set is cleared.
    pub fn apply(&mut self, command: &DecodedCommand) -> Result<(), ApplyError> {
        match command {
            DecodedCommand::CreateEndpoint(p) => self.create_endpoint(p),
            DecodedCommand::CreateCluster(p) => self.create_cluster(p),
            DecodedCommand::CreateAttribute(p) => self.create_attribute(p),
            DecodedCommand::CreateCommand(p) => self.create_command(p),
            DecodedCommand::CreateEvent(p) => self.create_event(p),
            DecodedCommand::AddDeviceTypeToEndpoint(p) => self.add_device_type(p),
        }
    }

    fn create_endpoint(&mut self, params: &CreateEndpointParams) -> Result<(), ApplyError> {
        self.cursor.endpoint = None;
        let flags = EndpointFlags::from_bits_retain(params.flags);
        let Some(handle) = self.node.create_endpoint(flags) else {
            error!(
                endpoint_id = params.endpoint_id,
                "failed to create endpoint"
            );
            return Err(ApplyError::Allocation(Entity::Endpoint));
        };
        self.cursor.endpoint = Some(handle);
        debug!(endpoint_id = params.endpoint_id, "created endpoint");
        Ok(())
    }

    fn create_cluster(&mut self, params: &CreateClusterParams) -> Result<(), ApplyError> {
        self.cursor.cluster = None;
        let endpoint = self.cursor.endpoint.ok_or(ApplyError::NoCurrentEndpoint)?;
        let flags = ClusterFlags::from_bits_retain(params.flags);
        let handle = self
            .node
            .create_cluster(endpoint, params.cluster_id, flags)
            .ok_or(ApplyError::Allocation(Entity::Cluster(params.cluster_id)))?;
        debug!(cluster_id = params.cluster_id, "created cluster");

        let cluster = self
            .node
            .cluster_mut(handle)
            .ok_or(ApplyError::UnknownHandle)?;
        self.hooks
            .plugin_init(cluster)
            .map_err(|source| ApplyError::PluginInit {
                cluster_id: params.cluster_id,
                source,
            })?;
        self.cursor.cluster = Some(handle);
        Ok(())
    }

    fn create_attribute(&mut self, params: &CreateAttributeParams) -> Result<(), ApplyError> {
        let cluster = self.cursor.cluster.ok_or(ApplyError::NoCurrentCluster)?;
        let flags = AttributeFlags::from_bits_retain(params.flags);
        let nullable = flags.contains(AttributeFlags::NULLABLE);

        let descriptor = params.val.as_ref();
        let value_type = ValueType::from_raw(descriptor.map_or(0, |v| v.r#type))?;
        let present = descriptor
            .and_then(|v| v.val.as_ref())
            .and_then(|v| v.kind.as_ref());

        let attr_value = value::resolve_value(value_type, present, nullable)?;
        let max_size = value::resolve_max_size(&attr_value, params.max_val_size)?;
        let handle = self
            .node
            .create_attribute(cluster, params.attribute_id, flags, attr_value, max_size)
            .ok_or(ApplyError::Allocation(Entity::Attribute(params.attribute_id)))?;
        debug!(
            attribute_id = params.attribute_id,
            ?value_type,
            "created attribute"
        );

        // Bounds only accompany an explicit value
        if let (Some(_), Some(min), Some(max)) = (present, &params.bounds_min, &params.bounds_max) {
            let bounds =
                value::resolve_bounds(value_type, min.kind.as_ref(), max.kind.as_ref(), nullable)?;
            self.node.add_bounds(handle, bounds)?;
        }
        Ok(())
    }

    fn create_command(&mut self, params: &CreateCommandParams) -> Result<(), ApplyError> {
        let handle = self.cursor.cluster.ok_or(ApplyError::NoCurrentCluster)?;
        let cluster = self
            .node
            .cluster_mut(handle)
            .ok_or(ApplyError::UnknownHandle)?;
        let registration = CommandRegistration {
            cluster_id: params.cluster_id,
            command_id: params.command_id,
            flags: CommandFlags::from_bits_retain(params.flags),
        };
        self.hooks
            .register_command(cluster, &registration)
            .map_err(|source| ApplyError::CommandRegistration {
                cluster_id: params.cluster_id,
                command_id: params.command_id,
                source,
            })?;
        cluster.create_command(registration.command_id, registration.flags);
        Ok(())
    }

    fn create_event(&mut self, params: &CreateEventParams) -> Result<(), ApplyError> {
        let cluster = self.cursor.cluster.ok_or(ApplyError::NoCurrentCluster)?;
        self.node
            .create_event(cluster, params.event_id)
            .ok_or(ApplyError::Allocation(Entity::Event(params.event_id)))?;
        debug!(event_id = params.event_id, "created event");
        Ok(())
    }

    fn add_device_type(&mut self, params: &EndpointAddDeviceTypeParams) -> Result<(), ApplyError> {
        let endpoint = self.cursor.endpoint.ok_or(ApplyError::NoCurrentEndpoint)?;
        self.node.add_device_type(
            endpoint,
            params.device_type_id,
            params.device_type_version,
        )?;
        debug!(
            device_type_id = params.device_type_id,
            "added device type to endpoint"
        );
        Ok(())
    }
}
