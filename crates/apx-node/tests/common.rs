// Shared helpers for the node model integration tests
#![allow(dead_code)]

use apx_node::{ComponentDataType, ComponentPort, SoftwareComponent};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// In-memory software component used as an import source.
#[derive(Debug, Default)]
pub struct TestComponent {
    pub name: String,
    pub provide: Vec<ComponentPort>,
    pub require: Vec<ComponentPort>,
    pub types: Vec<ComponentDataType>,
}

impl TestComponent {
    pub fn new(name: &str) -> Self {
        TestComponent {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn with_type(mut self, name: &str, signature: &str, attributes: Option<&str>) -> Self {
        self.types.push(ComponentDataType {
            name: name.to_string(),
            signature: signature.to_string(),
            attributes: attributes.map(str::to_string),
        });
        self
    }

    pub fn with_provide(mut self, name: &str, type_name: &str, attributes: Option<&str>) -> Self {
        self.provide.push(component_port(name, type_name, attributes));
        self
    }

    pub fn with_require(mut self, name: &str, type_name: &str, attributes: Option<&str>) -> Self {
        self.require.push(component_port(name, type_name, attributes));
        self
    }
}

fn component_port(name: &str, type_name: &str, attributes: Option<&str>) -> ComponentPort {
    ComponentPort {
        name: name.to_string(),
        type_name: type_name.to_string(),
        attributes: attributes.map(str::to_string),
    }
}

impl SoftwareComponent for TestComponent {
    fn name(&self) -> &str {
        &self.name
    }

    fn provide_ports(&self) -> &[ComponentPort] {
        &self.provide
    }

    fn require_ports(&self) -> &[ComponentPort] {
        &self.require
    }

    fn data_type(&self, name: &str) -> Option<&ComponentDataType> {
        self.types.iter().find(|t| t.name == name)
    }
}
