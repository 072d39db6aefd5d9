use crate::port::PortDirection;
use apx_layout::LayoutError;
use apx_syntax::SignatureError;
use miette::Diagnostic;
use thiserror::Error;

/// Errors raised while building or finalizing a node.
#[derive(Debug, Error, Diagnostic, Clone, PartialEq, Eq)]
pub enum NodeError {
    /// A data signature or attribute string failed to parse.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Signature(#[from] SignatureError),

    /// Width computation or init data packing failed during finalize.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Layout(#[from] LayoutError),

    /// A data type with the same name is already declared in the node.
    #[error("Duplicate data type: `{name}` is already declared in this node")]
    #[diagnostic(code(apx_node::duplicate_type_name))]
    DuplicateTypeName { name: String },

    /// A type reference names a data type that has not been declared.
    #[error("Unknown type reference: {reference} does not name a declared data type")]
    #[diagnostic(
        code(apx_node::unknown_type_reference),
        help("Data types must be appended before the ports and types that reference them")
    )]
    UnknownTypeReference { reference: String },

    /// A data type refers to itself or to a data type declared after it.
    #[error("Forward reference: data type `{type_name}` refers to {reference}, which is not declared before it")]
    #[diagnostic(code(apx_node::forward_reference_not_allowed))]
    ForwardReferenceNotAllowed { type_name: String, reference: String },

    /// Two ports of the same direction share a name.
    #[error("Duplicate port: a {direction} port named `{name}` already exists")]
    #[diagnostic(code(apx_node::duplicate_port_name))]
    DuplicatePortName {
        name: String,
        direction: PortDirection,
    },

    /// The init value has the right shape but lies outside the type's bounds.
    #[error("Init value {value} of port `{port}` is out of range; expected {bounds}")]
    #[diagnostic(code(apx_node::default_value_out_of_range))]
    DefaultValueOutOfRange {
        port: String,
        value: String,
        bounds: String,
    },

    /// The init value does not have the shape of the port's type.
    #[error("Init value of port `{port}` does not match its type: expected {expected}, found {found}")]
    #[diagnostic(code(apx_node::default_value_type_mismatch))]
    DefaultValueTypeMismatch {
        port: String,
        expected: String,
        found: String,
    },

    /// An APX text handed to a single-node reader declares zero or several nodes.
    #[error("Expected exactly one node in the APX text, found {found}")]
    #[diagnostic(
        code(apx_node::expected_single_node),
        help("Use `apx_node::parse_nodes` to read a text with several node blocks")
    )]
    ExpectedSingleNode { found: usize },

    #[error("Node has no name")]
    #[diagnostic(
        code(apx_node::missing_node_name),
        help("Create the node with `NodeBuilder::new(name)` or import a software component before finalizing")
    )]
    MissingNodeName,
}

pub type NodeResult<T> = Result<T, NodeError>;
