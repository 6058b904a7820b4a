//! Turns a data model blob into a device model tree.
//!
//! Messages are framed and decoded in order and each decoded command is
//! applied to the tree being built. Framing and decoding errors abort the
//! whole blob since nothing after them can be trusted. A command that fails
//! to apply is logged, recorded and skipped.

use tracing::{debug, error, info, instrument, warn};

use crate::{
    config::InterpreterConfig,
    data_model::{hooks::ClusterHooks, Node},
    error::{ApplyError, InterpretError},
    message::{command::CommandKind, command::DecodedCommand, Frames},
};

use self::builder::ModelBuilder;

pub mod builder;

/// A command that was skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandFailure {
    /// Position of the message in the blob, starting at 0
    pub index: usize,
    pub kind: CommandKind,
    pub error: ApplyError,
}

#[derive(Debug, Clone)]
pub struct Interpretation {
    pub node: Node,
    pub failures: Vec<CommandFailure>,
}

impl Interpretation {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct Interpreter<H> {
    config: InterpreterConfig,
    hooks: H,
}

impl<H: ClusterHooks> Interpreter<H> {
    pub fn new(hooks: H) -> Self {
        Self::with_config(InterpreterConfig::default(), hooks)
    }

    pub fn with_config(config: InterpreterConfig, hooks: H) -> Self {
        Self { config, hooks }
    }

    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    pub fn into_hooks(self) -> H {
        self.hooks
    }

    /// Interpret a whole blob. An empty blob gives an empty node.
    #[instrument(level = "debug", skip(self, data), fields(len = data.len()))]
    pub fn interpret(&mut self, data: &[u8]) -> Result<Interpretation, InterpretError> {
        let mut builder = ModelBuilder::new(Node::with_limits(self.config.limits), &mut self.hooks);
        let mut failures = Vec::new();

        let mut frames = Frames::new(data);
        let mut index = 0;
        while let Some(framed) = frames.next() {
            let framed = framed.map_err(|source| {
                let offset = frames.offset();
                error!(index, offset, %source, "failed to read length-prefixed data");
                InterpretError::Framing {
                    index,
                    offset,
                    source,
                }
            })?;
            let command = DecodedCommand::decode(framed.payload).map_err(|source| {
                error!(index, offset = framed.offset, %source, "failed to unpack message");
                InterpretError::Decode {
                    index,
                    offset: framed.offset,
                    source,
                }
            })?;
            let kind = command.kind();
            debug!(index, ?kind, len = framed.payload.len(), "applying command");

            if let Err(e) = builder.apply(&command) {
                if self.config.abort_on_command_failure {
                    error!(index, ?kind, error = %e, "command failed, aborting");
                    return Err(InterpretError::Command {
                        index,
                        kind,
                        source: e,
                    });
                }
                warn!(index, ?kind, error = %e, "command failed, skipping");
                failures.push(CommandFailure {
                    index,
                    kind,
                    error: e,
                });
            }
            index += 1;
        }

        let node = builder.finish();
        info!(
            messages = index,
            endpoints = node.endpoints().len(),
            failures = failures.len(),
            "data model interpreted"
        );
        Ok(Interpretation { node, failures })
    }
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;

    use super::{builder::tests::RecordingHooks, *};
    use crate::{
        config::DataModelLimits,
        data_model::{
            hooks::NoopHooks,
            value::{AttrValue, Scalar},
        },
        error::{DecodeError, Entity, FramingError},
        message::{command::value::Kind, StreamWriter},
    };

    fn blob(commands: &[DecodedCommand]) -> Vec<u8> {
        let mut writer = StreamWriter::new();
        for command in commands {
            writer.push(command).unwrap();
        }
        writer.finish().to_vec()
    }

    fn on_off_light() -> Vec<DecodedCommand> {
        vec![
            DecodedCommand::create_endpoint(0, 0),
            DecodedCommand::add_device_type(0x0016, 1),
            DecodedCommand::create_cluster(0x001d, 0x40),
            builder::tests::attribute(0x0000, 0, 4, None),
            DecodedCommand::create_endpoint(1, 0),
            DecodedCommand::add_device_type(0x0100, 3),
            DecodedCommand::create_cluster(0x0006, 0x41),
            builder::tests::attribute(0x0000, 0, 1, Some(Kind::B(true))),
            DecodedCommand::create_command(0x0006, 0x00, 0x02),
            DecodedCommand::create_command(0x0006, 0x01, 0x02),
            DecodedCommand::create_command(0x0006, 0x02, 0x02),
        ]
    }

    #[test]
    fn test_empty_blob() {
        let out = Interpreter::new(NoopHooks).interpret(&[]).unwrap();
        assert!(out.node.endpoints().is_empty());
        assert!(out.is_complete());
    }

    #[test]
    fn test_interpret_light() {
        let data = blob(&on_off_light());
        let out = Interpreter::new(NoopHooks).interpret(&data).unwrap();
        assert!(out.is_complete(), "{:?}", out.failures);

        let endpoints = out.node.endpoints();
        assert_eq!(endpoints.len(), 2);
        assert_eq!(endpoints[1].device_types[0].device_type, 0x0100);
        let on_off = endpoints[1].cluster(0x0006).unwrap();
        assert_eq!(
            on_off.attribute(0x0000).unwrap().value,
            AttrValue::Boolean(Scalar::NonNullable(true))
        );
        assert_eq!(on_off.commands.len(), 3);
    }

    #[test]
    fn test_single_endpoint_message() {
        // len 2, field 1 (endpoint params) of length 0
        let out = Interpreter::new(NoopHooks)
            .interpret(&hex!("02 0a 00"))
            .unwrap();
        assert_eq!(out.node.endpoints().len(), 1);
    }

    #[test]
    fn test_failed_command_is_skipped() {
        let mut hooks = RecordingHooks {
            failing_clusters: vec![0x0006],
            ..Default::default()
        };
        let data = blob(&on_off_light());
        let out = Interpreter::new(&mut hooks).interpret(&data).unwrap();

        // The failed cluster leaves no current cluster for the attribute and
        // the three commands after it
        assert_eq!(
            out.failures.iter().map(|f| f.index).collect::<Vec<_>>(),
            vec![6, 7, 8, 9, 10]
        );
        assert_eq!(out.failures[0].kind, CommandKind::CreateCluster);
        assert_eq!(out.failures[1].error, ApplyError::NoCurrentCluster);
        assert_eq!(out.node.endpoints().len(), 2);
        assert!(out.node.endpoints()[0].cluster(0x001d).is_some());
        assert!(!hooks.calls.iter().any(|c| c.starts_with("register_command")));
    }

    #[test]
    fn test_commands_after_a_failure_still_apply() {
        let data = blob(&[
            DecodedCommand::create_endpoint(0, 0),
            DecodedCommand::create_command(0x0006, 0x00, 0x02),
            DecodedCommand::create_cluster(0x0006, 0x40),
            builder::tests::attribute(0x0000, 0, 1, Some(Kind::B(false))),
        ]);
        let out = Interpreter::new(NoopHooks).interpret(&data).unwrap();
        assert_eq!(
            out.failures,
            vec![CommandFailure {
                index: 1,
                kind: CommandKind::CreateCommand,
                error: ApplyError::NoCurrentCluster,
            }]
        );
        let on_off = out.node.endpoints()[0].cluster(0x0006).unwrap();
        assert!(on_off.commands.is_empty());
        assert_eq!(
            on_off.attribute(0x0000).unwrap().value,
            AttrValue::Boolean(Scalar::NonNullable(false))
        );
    }

    #[test]
    fn test_abort_on_command_failure() {
        let data = blob(&[
            DecodedCommand::create_cluster(0x0006, 0),
            DecodedCommand::create_endpoint(0, 0),
        ]);
        let config = InterpreterConfig::default().abort_on_command_failure(true);
        let err = Interpreter::with_config(config, NoopHooks)
            .interpret(&data)
            .unwrap_err();
        assert_eq!(
            err,
            InterpretError::Command {
                index: 0,
                kind: CommandKind::CreateCluster,
                source: ApplyError::NoCurrentEndpoint,
            }
        );
    }

    #[test]
    fn test_limits_come_from_config() {
        let data = blob(&[
            DecodedCommand::create_endpoint(0, 0),
            DecodedCommand::create_endpoint(1, 0),
        ]);
        let config = InterpreterConfig::default().with_limits(DataModelLimits {
            max_endpoints: 1,
            ..Default::default()
        });
        let out = Interpreter::with_config(config, NoopHooks)
            .interpret(&data)
            .unwrap();
        assert_eq!(out.node.endpoints().len(), 1);
        assert_eq!(
            out.failures,
            vec![CommandFailure {
                index: 1,
                kind: CommandKind::CreateEndpoint,
                error: ApplyError::Allocation(Entity::Endpoint),
            }]
        );
    }

    #[test]
    fn test_truncated_blob_is_fatal() {
        let mut data = blob(&on_off_light());
        data.truncate(data.len() - 1);
        let mut hooks = RecordingHooks::default();
        let err = Interpreter::new(&mut hooks).interpret(&data).unwrap_err();
        assert!(matches!(
            err,
            InterpretError::Framing {
                index: 10,
                source: FramingError::Truncated { .. },
                ..
            }
        ));
        // Earlier messages were applied before the error surfaced
        assert_eq!(hooks.calls.len(), 4);
    }

    #[test]
    fn test_bad_prefix_reports_offset() {
        let mut data = blob(&[DecodedCommand::create_endpoint(0, 0)]);
        let offset = data.len();
        data.extend_from_slice(&hex!("ff ff ff ff ff"));
        let err = Interpreter::new(NoopHooks).interpret(&data).unwrap_err();
        assert_eq!(
            err,
            InterpretError::Framing {
                index: 1,
                offset,
                source: FramingError::MalformedPrefix { scanned: 5 },
            }
        );
    }

    #[test]
    fn test_undecodable_payload_is_fatal() {
        // A function call with no parameters
        let err = Interpreter::new(NoopHooks)
            .interpret(&hex!("00"))
            .unwrap_err();
        assert_eq!(
            err,
            InterpretError::Decode {
                index: 0,
                offset: 0,
                source: DecodeError::MissingParams,
            }
        );

        // Field 1 claims 5 bytes but the payload holds 1
        let err = Interpreter::new(NoopHooks)
            .interpret(&hex!("03 0a 05 08"))
            .unwrap_err();
        assert!(matches!(
            err,
            InterpretError::Decode {
                source: DecodeError::Protobuf(_),
                ..
            }
        ));
    }

    #[test]
    fn test_each_run_builds_a_fresh_tree() {
        let data = blob(&[DecodedCommand::create_endpoint(0, 0)]);
        let mut interpreter = Interpreter::new(NoopHooks);
        interpreter.interpret(&data).unwrap();
        let out = interpreter.interpret(&data).unwrap();
        assert_eq!(out.node.endpoints().len(), 1);
        assert_eq!(out.node.endpoints()[0].id, 0);
    }
}
