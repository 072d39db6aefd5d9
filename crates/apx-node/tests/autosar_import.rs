mod common;

use apx_node::{DataType, NodeBuilder, NodeError, Port, PortDirection};
use common::TestComponent;

#[test]
fn import_preserves_ports_and_directions() {
    common::init_logger();
    let component = TestComponent::new("LightController")
        .with_type("OffOn_T", "C(0,3)", Some(r#"VT("Off","On","Error","NotAvailable")"#))
        .with_type("Percent_T", "C(0,255)", None)
        .with_require("HeadLightSwitch", "OffOn_T", Some("=3"))
        .with_require("Brightness", "Percent_T", None)
        .with_provide("HeadLightStatus", "OffOn_T", Some("=0"));

    let mut builder = NodeBuilder::unnamed();
    builder.import_autosar_swc(&component).unwrap();
    let node = builder.finalize().unwrap();

    assert_eq!(node.name(), "LightController");
    let require: Vec<&str> = node.require_ports().iter().map(|p| p.name()).collect();
    assert_eq!(require, vec!["HeadLightSwitch", "Brightness"]);
    let provide: Vec<&str> = node.provide_ports().iter().map(|p| p.name()).collect();
    assert_eq!(provide, vec!["HeadLightStatus"]);

    let switch = node.find_port(PortDirection::Require, "HeadLightSwitch").unwrap();
    assert_eq!(
        node.resolve_descriptor(switch.descriptor()).unwrap().to_string(),
        "C(0,3)"
    );
    let (_, off_on) = node.types().find("OffOn_T").unwrap();
    assert_eq!(off_on.attributes().value_table.len(), 4);
    assert_eq!(node.init_data(PortDirection::Require), &[3, 0]);
}

#[test]
fn explicit_node_name_wins() {
    let component = TestComponent::new("Swc").with_provide("Out", "S_T", None).with_type("S_T", "S", None);
    let mut builder = NodeBuilder::new("Renamed");
    builder.import_autosar_swc(&component).unwrap();
    assert_eq!(builder.finalize().unwrap().name(), "Renamed");
}

#[test]
fn shared_types_are_reused_across_components() {
    let first = TestComponent::new("A")
        .with_type("Mode_T", "C(0,15)", None)
        .with_provide("ModeOut", "Mode_T", None);
    let second = TestComponent::new("B")
        .with_type("Mode_T", "C(0,15)", None)
        .with_require("ModeIn", "Mode_T", None);

    let mut builder = NodeBuilder::unnamed();
    builder.import_autosar_swc(&first).unwrap();
    builder.import_autosar_swc(&second).unwrap();
    assert_eq!(builder.name(), Some("A"));
    assert_eq!(builder.types().len(), 1);
}

#[test]
fn conflicting_port_names_fail_import() {
    let component = TestComponent::new("Swc")
        .with_type("Mode_T", "C(0,15)", None)
        .with_provide("Mode", "Mode_T", None)
        .with_provide("Mode", "Mode_T", None);
    let mut builder = NodeBuilder::unnamed();
    assert!(matches!(
        builder.import_autosar_swc(&component),
        Err(NodeError::DuplicatePortName { .. })
    ));
    assert!(builder.find_port(PortDirection::Provide, "Mode").is_none());
}

#[test]
fn conflicting_type_definition_is_rejected() {
    common::init_logger();
    let mut builder = NodeBuilder::new("N");
    builder.append(DataType::new("Mode_T", "C(0,15)").unwrap()).unwrap();
    builder
        .append(Port::provide("Status", r#"T["Mode_T"]"#, Some("=0")).unwrap())
        .unwrap();

    let component = TestComponent::new("Swc")
        .with_type("Mode_T", "C(0,1000)", None)
        .with_require("Wide", "Mode_T", Some("=1000"));
    assert_eq!(
        builder.import_autosar_swc(&component),
        Err(NodeError::DuplicateTypeName {
            name: "Mode_T".to_string()
        })
    );
    assert!(builder.find_port(PortDirection::Require, "Wide").is_none());

    let node = builder.finalize().unwrap();
    let (_, mode) = node.types().find("Mode_T").unwrap();
    assert_eq!(mode.signature(), "C(0,15)");
    assert_eq!(node.require_buffer_size(), 0);
}

#[test]
fn conflicting_value_table_is_rejected() {
    let mut builder = NodeBuilder::new("N");
    builder
        .append(
            DataType::new("OffOn_T", "C(0,1)")
                .unwrap()
                .with_attributes(r#"VT("Off","On")"#)
                .unwrap(),
        )
        .unwrap();
    let component = TestComponent::new("Swc")
        .with_type("OffOn_T", "C(0,1)", Some(r#"VT("Aus","An")"#))
        .with_provide("Light", "OffOn_T", None);
    assert!(matches!(
        builder.import_autosar_swc(&component),
        Err(NodeError::DuplicateTypeName { name }) if name == "OffOn_T"
    ));
}

#[test]
fn identical_type_declared_with_index_reference_is_reused() {
    let mut builder = NodeBuilder::new("N");
    builder.append(DataType::new("Mode_T", "C(0,3)").unwrap()).unwrap();
    builder
        .append(DataType::new("Pair_T", r#"{"a"T[0]"b"C(0,7)}"#).unwrap())
        .unwrap();

    let component = TestComponent::new("Swc")
        .with_type("Mode_T", "C(0,3)", None)
        .with_type("Pair_T", r#"{"a"T["Mode_T"]"b"C(0,7)}"#, None)
        .with_require("Pair", "Pair_T", None);
    builder.import_autosar_swc(&component).unwrap();

    let node = builder.finalize().unwrap();
    assert_eq!(node.types().len(), 2);
    assert_eq!(node.require_buffer_size(), 2);
}

#[test]
fn conflicting_dependency_is_rejected() {
    let mut builder = NodeBuilder::new("N");
    builder.append(DataType::new("Mode_T", "C(0,3)").unwrap()).unwrap();
    let component = TestComponent::new("Swc")
        .with_type("Mode_T", "C(0,7)", None)
        .with_type("Pair_T", r#"{"a"T["Mode_T"]}"#, None)
        .with_provide("Pair", "Pair_T", None);
    assert!(matches!(
        builder.import_autosar_swc(&component),
        Err(NodeError::DuplicateTypeName { name }) if name == "Mode_T"
    ));
    assert!(builder.types().find("Pair_T").is_none());
}
