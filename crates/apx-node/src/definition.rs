//! Rebuilding nodes from APX text.

use crate::data_type::DataType;
use crate::error::{NodeError, NodeResult};
use crate::node::{Node, NodeBuilder};
use crate::port::{Port, PortDirection};
use apx_syntax::{parse_definition, NodeDeclaration};

impl NodeBuilder {
    /// Reads the block of exactly one node from APX text, as written into the
    /// generated C source or a single-node context.
    ///
    /// ```
    /// use apx_node::NodeBuilder;
    ///
    /// let text = "APX/1.2\nN\"N\"\nT\"Mode_T\"C(0,15)\nP\"Status\"T[0]:=0\n";
    /// let node = NodeBuilder::from_apx_text(text)?.finalize()?;
    /// assert_eq!(node.provide_buffer_size(), 1);
    /// # Ok::<(), apx_node::NodeError>(())
    /// ```
    pub fn from_apx_text(text: &str) -> NodeResult<NodeBuilder> {
        let mut nodes = parse_definition(text)?.nodes;
        if nodes.len() != 1 {
            return Err(NodeError::ExpectedSingleNode { found: nodes.len() });
        }
        let declaration = nodes.remove(0);
        NodeBuilder::from_declaration(declaration)
    }

    /// Builds a node from one parsed node block, appending its types and ports
    /// in declaration order.
    pub fn from_declaration(declaration: NodeDeclaration) -> NodeResult<NodeBuilder> {
        let mut builder = NodeBuilder::new(declaration.name);
        for ty in declaration.types {
            builder.append_type(DataType::from_parts(ty.name, ty.descriptor, ty.attributes))?;
        }
        let directions = [
            (PortDirection::Provide, declaration.provide_ports),
            (PortDirection::Require, declaration.require_ports),
        ];
        for (direction, ports) in directions {
            for port in ports {
                builder.append_port(Port::from_parts(direction, port.name, port.descriptor, port.attributes))?;
            }
        }
        Ok(builder)
    }
}

/// Reads and finalizes every node block of an APX text, in order.
pub fn parse_nodes(text: &str) -> NodeResult<Vec<Node>> {
    let definition = parse_definition(text)?;
    log::debug!(
        "read APX/{} text with {} node(s)",
        definition.version,
        definition.nodes.len()
    );
    definition
        .nodes
        .into_iter()
        .map(|declaration| NodeBuilder::from_declaration(declaration)?.finalize())
        .collect()
}
