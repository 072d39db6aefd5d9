use crate::data_type::DataType;
use crate::error::{NodeError, NodeResult};
use crate::port::{Port, PortDirection};
use crate::registry::{TypeId, TypeRegistry};
use crate::value::{check_init_value, warn_truncated_ranges};
use apx_layout::{LayoutComputer, LayoutError, PortSignal, PortSlot};
use apx_syntax::{Literal, TypeDescriptor};
use indexmap::IndexMap;

/// Anything that can be appended to a node under construction.
#[derive(Debug, Clone)]
pub enum NodeElement {
    DataType(DataType),
    Port(Port),
}

impl From<DataType> for NodeElement {
    fn from(data_type: DataType) -> Self {
        NodeElement::DataType(data_type)
    }
}

impl From<Port> for NodeElement {
    fn from(port: Port) -> Self {
        NodeElement::Port(port)
    }
}

/// A node that is still open for appending data types and ports.
///
/// Every append validates eagerly. [`finalize`](NodeBuilder::finalize)
/// consumes the builder and computes the layout, so a node can be finalized
/// only once and nothing can be appended afterwards:
///
/// ```compile_fail
/// use apx_node::NodeBuilder;
///
/// let builder = NodeBuilder::new("N");
/// let node = builder.finalize().unwrap();
/// let again = builder.finalize();
/// ```
///
/// ```compile_fail
/// use apx_node::{DataType, NodeBuilder};
///
/// let node = NodeBuilder::new("N").finalize().unwrap();
/// node.append_type(DataType::new("Mode_T", "C(0,15)").unwrap());
/// ```
#[derive(Debug, Clone, Default)]
pub struct NodeBuilder {
    name: Option<String>,
    types: TypeRegistry,
    provide_ports: IndexMap<String, Port>,
    require_ports: IndexMap<String, Port>,
}

impl NodeBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        NodeBuilder {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Creates a node whose name is taken from the first imported software
    /// component.
    pub fn unnamed() -> Self {
        Self::default()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub(crate) fn set_name_if_missing(&mut self, name: &str) {
        if self.name.is_none() {
            self.name = Some(name.to_string());
        }
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    pub fn append(&mut self, element: impl Into<NodeElement>) -> NodeResult<()> {
        match element.into() {
            NodeElement::DataType(data_type) => self.append_type(data_type).map(|_| ()),
            NodeElement::Port(port) => self.append_port(port),
        }
    }

    pub fn append_type(&mut self, data_type: DataType) -> NodeResult<TypeId> {
        warn_truncated_ranges(data_type.name(), data_type.descriptor());
        self.types.declare(data_type)
    }

    /// Appends a port after checking its name, its type references and its
    /// init value. Queued ports take no init value.
    pub fn append_port(&mut self, port: Port) -> NodeResult<()> {
        let ports = match port.direction() {
            PortDirection::Provide => &mut self.provide_ports,
            PortDirection::Require => &mut self.require_ports,
        };
        if ports.contains_key(port.name()) {
            return Err(NodeError::DuplicatePortName {
                name: port.name().to_string(),
                direction: port.direction(),
            });
        }
        self.types.check_references(port.descriptor())?;
        if let Some(value) = port.init_value() {
            if port.queue_length().is_some() {
                return Err(NodeError::DefaultValueTypeMismatch {
                    port: port.name().to_string(),
                    expected: "no init value for a queued port".to_string(),
                    found: value.kind_name().to_string(),
                });
            }
            check_init_value(&self.types, port.name(), port.descriptor(), value)?;
        }
        warn_truncated_ranges(port.name(), port.descriptor());
        log::debug!(
            "appended {} port `{}` {}",
            port.direction(),
            port.name(),
            port.descriptor()
        );
        ports.insert(port.name().to_string(), port);
        Ok(())
    }

    pub fn find_port(&self, direction: PortDirection, name: &str) -> Option<&Port> {
        match direction {
            PortDirection::Provide => self.provide_ports.get(name),
            PortDirection::Require => self.require_ports.get(name),
        }
    }

    /// Freezes the node and computes its provide and require buffer layouts.
    pub fn finalize(self) -> NodeResult<Node> {
        let name = self.name.ok_or(NodeError::MissingNodeName)?;
        let types = self.types;

        let mut computer = LayoutComputer::new(&types);
        let mut type_widths = Vec::with_capacity(types.len());
        for (_, data_type) in types.iter() {
            type_widths.push(computer.packed_width(data_type.descriptor())?);
        }
        let provide = DirectionLayout::compute(&mut computer, self.provide_ports)?;
        let require = DirectionLayout::compute(&mut computer, self.require_ports)?;
        drop(computer);

        log::info!(
            "finalized node `{}`: {} data types, {} provide ports ({} bytes), {} require ports ({} bytes)",
            name,
            types.len(),
            provide.ports.len(),
            provide.size,
            require.ports.len(),
            require.size
        );

        Ok(Node {
            name,
            types,
            type_widths,
            provide,
            require,
        })
    }
}

/// A port of a finalized node together with its place in the buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodePort {
    port: Port,
    slot: PortSlot,
}

impl NodePort {
    pub fn port(&self) -> &Port {
        &self.port
    }

    pub fn name(&self) -> &str {
        self.port.name()
    }

    pub fn direction(&self) -> PortDirection {
        self.port.direction()
    }

    pub fn descriptor(&self) -> &TypeDescriptor {
        self.port.descriptor()
    }

    pub fn init_value(&self) -> Option<&Literal> {
        self.port.init_value()
    }

    pub fn queue_length(&self) -> Option<u32> {
        self.port.queue_length()
    }

    /// Byte offset inside the buffer of the port's direction.
    pub fn offset(&self) -> u32 {
        self.slot.offset
    }

    /// Packed width in bytes, including the counter of a queued port.
    pub fn width(&self) -> u32 {
        self.slot.width
    }
}

#[derive(Debug, Clone, Default)]
struct DirectionLayout {
    ports: Vec<NodePort>,
    size: u32,
    init_data: Vec<u8>,
}

impl DirectionLayout {
    fn compute(
        computer: &mut LayoutComputer<'_, TypeRegistry>,
        ports: IndexMap<String, Port>,
    ) -> Result<Self, LayoutError> {
        let signals: Vec<PortSignal<'_>> = ports
            .values()
            .map(|p| {
                PortSignal::new(p.name(), p.descriptor())
                    .with_init_value(p.init_value())
                    .with_queue_length(p.queue_length())
            })
            .collect();
        let layout = computer.compute_signal_layout(signals.iter().copied())?;
        let init_data = computer.pack_init_data(signals)?;
        let ports = ports
            .into_values()
            .zip(layout.slots)
            .map(|(port, slot)| NodePort { port, slot })
            .collect();
        Ok(DirectionLayout {
            ports,
            size: layout.size,
            init_data,
        })
    }
}

/// An immutable node with its computed layout.
///
/// Provide and require ports live in separate buffers; within each buffer the
/// ports are packed densely in append order starting at offset zero.
#[derive(Debug, Clone)]
pub struct Node {
    name: String,
    types: TypeRegistry,
    type_widths: Vec<u32>,
    provide: DirectionLayout,
    require: DirectionLayout,
}

impl Node {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    /// Packed width of a declared data type.
    pub fn type_width(&self, id: TypeId) -> Option<u32> {
        self.type_widths.get(id.index()).copied()
    }

    /// Packed width of any descriptor whose references resolve in this node.
    pub fn packed_width(&self, descriptor: &TypeDescriptor) -> Result<u32, LayoutError> {
        LayoutComputer::new(&self.types).packed_width(descriptor)
    }

    /// Follows references to the effective descriptor.
    pub fn resolve_descriptor<'a>(&'a self, descriptor: &'a TypeDescriptor) -> NodeResult<&'a TypeDescriptor> {
        self.types.resolve_descriptor(descriptor)
    }

    fn layout(&self, direction: PortDirection) -> &DirectionLayout {
        match direction {
            PortDirection::Provide => &self.provide,
            PortDirection::Require => &self.require,
        }
    }

    pub fn ports(&self, direction: PortDirection) -> &[NodePort] {
        &self.layout(direction).ports
    }

    pub fn provide_ports(&self) -> &[NodePort] {
        self.ports(PortDirection::Provide)
    }

    pub fn require_ports(&self) -> &[NodePort] {
        self.ports(PortDirection::Require)
    }

    pub fn buffer_size(&self, direction: PortDirection) -> u32 {
        self.layout(direction).size
    }

    pub fn provide_buffer_size(&self) -> u32 {
        self.buffer_size(PortDirection::Provide)
    }

    pub fn require_buffer_size(&self) -> u32 {
        self.buffer_size(PortDirection::Require)
    }

    /// Initial bytes of the buffer of `direction`.
    pub fn init_data(&self, direction: PortDirection) -> &[u8] {
        &self.layout(direction).init_data
    }

    pub fn find_port(&self, direction: PortDirection, name: &str) -> Option<&NodePort> {
        self.ports(direction).iter().find(|p| p.name() == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mode_node() -> NodeBuilder {
        let mut builder = NodeBuilder::new("N");
        builder.append(DataType::new("Mode_T", "C(0,15)").unwrap()).unwrap();
        builder
            .append(Port::provide("Status", r#"T["Mode_T"]"#, Some("=0")).unwrap())
            .unwrap();
        builder
            .append(Port::require("Mode", r#"T["Mode_T"]"#, Some("=15")).unwrap())
            .unwrap();
        builder
    }

    #[test]
    fn test_separate_buffers() {
        let node = mode_node().finalize().unwrap();
        assert_eq!(node.provide_buffer_size(), 1);
        assert_eq!(node.require_buffer_size(), 1);
        assert_eq!(node.find_port(PortDirection::Provide, "Status").unwrap().offset(), 0);
        assert_eq!(node.find_port(PortDirection::Require, "Mode").unwrap().offset(), 0);
        assert_eq!(node.init_data(PortDirection::Require), &[15]);
        assert_eq!(node.type_width(TypeId(0)), Some(1));
    }

    #[test]
    fn test_port_directions_are_separate_namespaces() {
        let mut builder = mode_node();
        builder.append(Port::provide("Mode", "S", None).unwrap()).unwrap();
        assert_eq!(
            builder.append(Port::provide("Mode", "C", None).unwrap()),
            Err(NodeError::DuplicatePortName {
                name: "Mode".to_string(),
                direction: PortDirection::Provide,
            })
        );
    }

    #[test]
    fn test_port_with_unknown_type() {
        let mut builder = NodeBuilder::new("N");
        assert_eq!(
            builder.append(Port::provide("Status", r#"T["Mode_T"]"#, None).unwrap()),
            Err(NodeError::UnknownTypeReference {
                reference: r#"T["Mode_T"]"#.to_string()
            })
        );
        assert!(builder.find_port(PortDirection::Provide, "Status").is_none());
    }

    #[test]
    fn test_unnamed_node_cannot_finalize() {
        assert_eq!(
            NodeBuilder::unnamed().finalize().unwrap_err(),
            NodeError::MissingNodeName
        );
    }

    #[test]
    fn test_queued_port_layout() {
        let mut builder = mode_node();
        builder
            .append(Port::provide("Events", r#"T["Mode_T"]"#, Some("Q[4]")).unwrap())
            .unwrap();
        let node = builder.finalize().unwrap();
        let events = node.find_port(PortDirection::Provide, "Events").unwrap();
        assert_eq!(events.queue_length(), Some(4));
        assert_eq!((events.offset(), events.width()), (1, 1 + 4));
        assert_eq!(node.init_data(PortDirection::Provide), &[0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_queued_port_rejects_init_value() {
        let mut builder = NodeBuilder::new("N");
        assert_eq!(
            builder.append(Port::require("Events", "C(0,7)", Some("=1, Q[4]")).unwrap()),
            Err(NodeError::DefaultValueTypeMismatch {
                port: "Events".to_string(),
                expected: "no init value for a queued port".to_string(),
                found: "integer".to_string(),
            })
        );
    }

    #[test]
    fn test_unbiased_range_keeps_span_width() {
        let mut builder = NodeBuilder::new("N");
        builder
            .append(Port::require("Offset", "C(1000,1010)", Some("=1005")).unwrap())
            .unwrap();
        let node = builder.finalize().unwrap();
        assert_eq!(node.require_buffer_size(), 1);
        assert_eq!(node.init_data(PortDirection::Require), &[(1005 & 0xFF) as u8]);
    }

    #[test]
    fn test_empty_node() {
        let node = NodeBuilder::new("Empty").finalize().unwrap();
        assert_eq!(node.provide_buffer_size(), 0);
        assert!(node.provide_ports().is_empty());
        assert!(node.init_data(PortDirection::Provide).is_empty());
    }
}
