//! Side effects the device model runtime performs while the tree is built.
//!
//! Creating a cluster runs the cluster's plugin init, and every command is
//! registered with the runtime before it is recorded on its cluster. Both are
//! injected so the builder can run without a real runtime.

use crate::error::HookError;

use super::{Cluster, CommandFlags};

/// Arguments of a command registration as they appear in the stream. The
/// cluster id is the one the stream names, which is not checked against the
/// current cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandRegistration {
    pub cluster_id: u32,
    pub command_id: u32,
    pub flags: CommandFlags,
}

pub trait ClusterHooks {
    /// Called once the cluster exists on its endpoint.
    fn plugin_init(&mut self, _cluster: &mut Cluster) -> Result<(), HookError> {
        Ok(())
    }

    /// Called before the command is recorded. An error leaves the cluster
    /// without the command.
    fn register_command(
        &mut self,
        _cluster: &mut Cluster,
        _command: &CommandRegistration,
    ) -> Result<(), HookError> {
        Ok(())
    }
}

impl<T> ClusterHooks for &mut T
where
    T: ClusterHooks + ?Sized,
{
    fn plugin_init(&mut self, cluster: &mut Cluster) -> Result<(), HookError> {
        (**self).plugin_init(cluster)
    }

    fn register_command(
        &mut self,
        cluster: &mut Cluster,
        command: &CommandRegistration,
    ) -> Result<(), HookError> {
        (**self).register_command(cluster, command)
    }
}

/// Accepts every cluster and command.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

impl ClusterHooks for NoopHooks {}
