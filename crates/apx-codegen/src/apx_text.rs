//! APX text: the line-oriented interface definition shared by the generated
//! C sources and the context artifact.
//!
//! ```text
//! APX/1.2
//! N"TestNode"
//! T"Mode_T"C(0,15)
//! P"Status"T[0]:=0
//! R"Mode"T[0]:=15
//!
//! ```

use crate::config::{GeneratorConfig, ReferenceStyle};
use apx_node::{Node, NodePort, TypeRegistry};
use apx_syntax::{TypeDescriptor, TypeRef};
use std::fmt::Write as _;

/// Renders the header line followed by the block of one node.
pub fn node_definition(node: &Node, config: &GeneratorConfig) -> String {
    let mut out = header(config);
    write_node_block(&mut out, node, config.reference_style);
    out
}

pub fn header(config: &GeneratorConfig) -> String {
    format!("APX/{}\n", config.apx_version)
}

/// Appends the `N`, `T`, `P` and `R` lines of a node and the terminating blank line.
pub fn write_node_block(out: &mut String, node: &Node, style: ReferenceStyle) {
    let types = node.types();
    let _ = writeln!(out, "N{}", quoted(node.name()));
    for (_, data_type) in types.iter() {
        let _ = write!(
            out,
            "T{}{}",
            quoted(data_type.name()),
            styled(types, data_type.descriptor(), style)
        );
        if !data_type.attributes().is_empty() {
            let _ = write!(out, ":{}", data_type.attributes());
        }
        out.push('\n');
    }
    for port in node.provide_ports().iter().chain(node.require_ports()) {
        write_port_line(out, types, port, style);
    }
    out.push('\n');
}

fn write_port_line(out: &mut String, types: &TypeRegistry, port: &NodePort, style: ReferenceStyle) {
    let _ = write!(
        out,
        "{}{}{}",
        port.direction().code(),
        quoted(port.name()),
        styled(types, port.descriptor(), style)
    );
    if !port.port().attributes().is_empty() {
        let _ = write!(out, ":{}", port.port().attributes());
    }
    out.push('\n');
}

/// Rewrites every reference of `descriptor` into the requested style.
fn styled(types: &TypeRegistry, descriptor: &TypeDescriptor, style: ReferenceStyle) -> TypeDescriptor {
    descriptor.map_references(&mut |type_ref| {
        let Ok(id) = types.lookup(type_ref) else {
            return type_ref.clone();
        };
        match style {
            ReferenceStyle::Index => TypeRef::Index(id.index()),
            ReferenceStyle::Name => match types.get(id) {
                Some(data_type) => TypeRef::Name(data_type.name().to_string()),
                None => type_ref.clone(),
            },
        }
    })
}

fn quoted(name: &str) -> String {
    format!("\"{}\"", name.replace('\\', "\\\\").replace('"', "\\\""))
}
