//! Resolve the blob of the running slot, then rebuild the device from it.

use matter_data_model_interpreter::{
    data_model::{
        hooks::{ClusterHooks, CommandRegistration},
        value::{AttrValue, Scalar},
        Cluster, ClusterFlags,
    },
    error::HookError,
    message::{
        command::{value::Kind, CreateAttributeParams, DecodedCommand, TypedValue, Value},
        StreamWriter,
    },
    storage::MemoryStorage,
    DataModelManager, DataModelStorage, Interpreter,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Counts what the runtime was asked to do.
#[derive(Default)]
struct Runtime {
    server_clusters: usize,
    commands: Vec<(u32, u32)>,
}

impl ClusterHooks for Runtime {
    fn plugin_init(&mut self, cluster: &mut Cluster) -> Result<(), HookError> {
        if cluster.flags.contains(ClusterFlags::SERVER) {
            self.server_clusters += 1;
        }
        Ok(())
    }

    fn register_command(
        &mut self,
        _cluster: &mut Cluster,
        command: &CommandRegistration,
    ) -> Result<(), HookError> {
        self.commands.push((command.cluster_id, command.command_id));
        Ok(())
    }
}

fn level_attribute(current: u32) -> DecodedCommand {
    DecodedCommand::CreateAttribute(CreateAttributeParams {
        attribute_id: 0x0000,
        // nullable
        flags: 0x40,
        val: Some(TypedValue {
            r#type: 8,
            val: Some(Value::new(Kind::U8(current))),
        }),
        bounds_min: Some(Value::new(Kind::U8(1))),
        bounds_max: Some(Value::new(Kind::U8(254))),
        max_val_size: None,
    })
}

fn dimmable_light() -> Vec<u8> {
    let mut writer = StreamWriter::new();
    for command in [
        DecodedCommand::create_endpoint(0, 0),
        DecodedCommand::add_device_type(0x0016, 1),
        DecodedCommand::create_cluster(0x0028, 0x40),
        DecodedCommand::create_endpoint(1, 0),
        DecodedCommand::add_device_type(0x0101, 3),
        DecodedCommand::create_cluster(0x0006, 0x40),
        DecodedCommand::create_command(0x0006, 0x00, 0x02),
        DecodedCommand::create_command(0x0006, 0x01, 0x02),
        DecodedCommand::create_cluster(0x0008, 0x40),
        level_attribute(128),
        DecodedCommand::create_command(0x0008, 0x00, 0x02),
        DecodedCommand::create_event(0x00),
    ] {
        writer.push(&command).unwrap();
    }
    writer.finish().to_vec()
}

#[test]
fn first_boot_of_new_slot() {
    init_tracing();
    let storage = MemoryStorage::new().with_entry("ota_0_dm", &dimmable_light());
    let mut manager = DataModelManager::new(storage);
    let running = || Some("ota_1".to_string());

    let blob = manager.load_running_partition(&running).unwrap();
    assert_eq!(blob, dimmable_light());
    assert_eq!(
        manager.storage().get_data_model("ota_1_dm").unwrap(),
        dimmable_light()
    );
    assert!(!manager.storage().contains_key("ota_0_dm"));

    let mut runtime = Runtime::default();
    let out = Interpreter::new(&mut runtime).interpret(&blob).unwrap();
    assert!(out.is_complete(), "{:?}", out.failures);

    let light = &out.node.endpoints()[1];
    assert_eq!(light.device_types[0].device_type, 0x0101);
    let level = light.cluster(0x0008).unwrap().attribute(0x0000).unwrap();
    assert_eq!(level.value, AttrValue::UInt8(Scalar::Nullable(Some(128))));
    let bounds = level.bounds.as_ref().unwrap();
    assert_eq!(bounds.min, AttrValue::UInt8(Scalar::Nullable(Some(1))));
    assert_eq!(runtime.server_clusters, 3);
    assert_eq!(runtime.commands, vec![(6, 0), (6, 1), (8, 0)]);
}

#[test]
fn nothing_to_interpret() {
    init_tracing();
    let mut manager = DataModelManager::new(MemoryStorage::new());
    let blob = manager.data_model_binary("ota_1");
    assert!(blob.is_empty());

    let mut runtime = Runtime::default();
    let out = Interpreter::new(&mut runtime).interpret(&blob).unwrap();
    assert!(out.node.endpoints().is_empty());
    assert_eq!(runtime.server_clusters, 0);
}
