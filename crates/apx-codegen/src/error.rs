use apx_node::NodeError;
use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while generating artifacts.
#[derive(Debug, Error, Diagnostic)]
pub enum CodegenError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Node(#[from] NodeError),

    /// A `direct_write` entry does not name a provide port of the node.
    #[error("Unknown port: `{name}` is not a provide port of node `{node}`")]
    #[diagnostic(
        code(apx_codegen::unknown_port_name),
        help("Only provide ports can be generated with direct write")
    )]
    UnknownPortName { node: String, name: String },

    /// A queued port is listed in `direct_write`.
    #[error("Queued port `{name}` of node `{node}` cannot be generated with direct write")]
    #[diagnostic(
        code(apx_codegen::direct_write_queued_port),
        help("Queued ports append to the shadow buffer; remove the port from direct_write")
    )]
    DirectWriteQueuedPort { node: String, name: String },

    /// A name that ends up in generated C code is not a valid C identifier.
    #[error("Invalid {kind} `{name}`: not a C identifier")]
    #[diagnostic(
        code(apx_codegen::invalid_identifier),
        help("C identifiers start with a letter or `_` followed by letters, digits or `_`")
    )]
    InvalidIdentifier { kind: &'static str, name: String },

    /// A node with the same name is already part of the context.
    #[error("Duplicate node: a node named `{name}` is already part of this context")]
    #[diagnostic(code(apx_codegen::duplicate_node_name))]
    DuplicateNodeName { name: String },

    #[error("I/O error on {}: {source}", path.display())]
    #[diagnostic(code(apx_codegen::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The generator configuration could not be parsed.
    #[error("Invalid generator configuration: {0}")]
    #[diagnostic(
        code(apx_codegen::config),
        help("Check the TOML syntax and the names of the configuration keys")
    )]
    Config(String),
}

impl CodegenError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CodegenError::Io {
            path: path.into(),
            source,
        }
    }
}

// Conversion from toml::de::Error to CodegenError
impl From<toml::de::Error> for CodegenError {
    fn from(err: toml::de::Error) -> Self {
        CodegenError::Config(err.to_string())
    }
}

pub type CodegenResult<T> = Result<T, CodegenError>;
