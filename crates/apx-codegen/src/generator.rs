use crate::apx_text;
use crate::cgen::CodegenCtx;
use crate::config::GeneratorConfig;
use crate::error::{CodegenError, CodegenResult};
use crate::writer::{write_artifacts, Artifact};
use apx_node::{Node, PortDirection};
use apx_syntax::TypeDescriptor;
use indexmap::IndexSet;
use std::path::{Path, PathBuf};

/// Per-call options of [`NodeGenerator::generate`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateOptions {
    /// Base name of the generated files and symbols; defaults to the node name.
    pub name: Option<String>,
    /// Header names included verbatim by the generated header.
    pub includes: Vec<String>,
    /// Provide ports whose accessors write straight to the transport buffer.
    pub direct_write: Vec<String>,
}

impl GenerateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn includes<I, S>(mut self, includes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.includes = includes.into_iter().map(Into::into).collect();
        self
    }

    pub fn direct_write<I, S>(mut self, ports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.direct_write = ports.into_iter().map(Into::into).collect();
        self
    }
}

/// Header and source of one node, rendered but not yet written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedSource {
    pub header: Artifact,
    pub source: Artifact,
}

/// Generates the C bindings of finalized nodes.
///
/// Only a finalized [`Node`] can be passed in; a builder is rejected at
/// compile time:
///
/// ```compile_fail
/// use apx_codegen::{GenerateOptions, NodeGenerator};
/// use apx_node::NodeBuilder;
///
/// let builder = NodeBuilder::new("N");
/// NodeGenerator::new().render(&builder, &GenerateOptions::new());
/// ```
#[derive(Debug, Clone, Default)]
pub struct NodeGenerator {
    config: GeneratorConfig,
}

impl NodeGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: GeneratorConfig) -> Self {
        NodeGenerator { config }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Renders header and source in memory.
    ///
    /// Every name that becomes part of a C symbol must be a C identifier: the
    /// base name, the file prefix, data type, port and record field names, and
    /// value table labels.
    pub fn render(&self, node: &Node, options: &GenerateOptions) -> CodegenResult<GeneratedSource> {
        let direct_write = resolve_direct_write(node, &options.direct_write)?;
        let name = options.name.as_deref().unwrap_or(node.name());
        check_identifiers(node, name, &self.config.file_prefix)?;
        let definition = apx_text::node_definition(node, &self.config);

        let mut ctx = CodegenCtx::new(node, &self.config, name, &options.includes, &direct_write, &definition);
        let header = Artifact::new(ctx.header_file_name(), ctx.emit_header()?);
        let source = Artifact::new(ctx.source_file_name(), ctx.emit_source()?);
        log::debug!(
            "rendered bindings for node `{}` as `{}` ({} direct write ports)",
            node.name(),
            name,
            direct_write.len()
        );
        Ok(GeneratedSource { header, source })
    }

    /// Renders the bindings of `node` and writes them into `output_dir`.
    /// Nothing is written unless rendering succeeds.
    pub fn generate(
        &self,
        output_dir: impl AsRef<Path>,
        node: &Node,
        options: &GenerateOptions,
    ) -> CodegenResult<Vec<PathBuf>> {
        let generated = self.render(node, options)?;
        write_artifacts(output_dir.as_ref(), &[generated.header, generated.source])
    }
}

/// Validates the direct write list against the node's provide ports. Repeated
/// names are accepted and collapse to one entry.
fn resolve_direct_write(node: &Node, names: &[String]) -> CodegenResult<IndexSet<String>> {
    let mut ports = IndexSet::new();
    for name in names {
        let Some(port) = node.find_port(PortDirection::Provide, name) else {
            return Err(CodegenError::UnknownPortName {
                node: node.name().to_string(),
                name: name.clone(),
            });
        };
        if port.queue_length().is_some() {
            return Err(CodegenError::DirectWriteQueuedPort {
                node: node.name().to_string(),
                name: name.clone(),
            });
        }
        if !ports.insert(name.clone()) {
            log::warn!("port `{}` is listed more than once in direct_write", name);
        }
    }
    Ok(ports)
}

fn check_identifiers(node: &Node, name: &str, file_prefix: &str) -> CodegenResult<()> {
    check_identifier("node name", name)?;
    if !file_prefix.is_empty() {
        check_identifier("file prefix", file_prefix)?;
    }
    for (_, data_type) in node.types().iter() {
        check_identifier("data type name", data_type.name())?;
        check_field_names(data_type.descriptor())?;
        for label in &data_type.attributes().value_table {
            check_identifier("value table label", label)?;
        }
    }
    for port in node.provide_ports().iter().chain(node.require_ports()) {
        check_identifier("port name", port.name())?;
        check_field_names(port.descriptor())?;
    }
    Ok(())
}

fn check_field_names(descriptor: &TypeDescriptor) -> CodegenResult<()> {
    match descriptor {
        TypeDescriptor::Record(fields) => {
            for field in fields {
                check_identifier("record field name", &field.name)?;
                check_field_names(&field.ty)?;
            }
            Ok(())
        }
        TypeDescriptor::Array { element, .. } => check_field_names(element),
        _ => Ok(()),
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`
fn check_identifier(kind: &'static str, name: &str) -> CodegenResult<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(CodegenError::InvalidIdentifier {
            kind,
            name: name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_c_identifiers() {
        for name in ["Mode_T", "_x", "a1", "ApxNode_"] {
            assert!(check_identifier("name", name).is_ok(), "{:?}", name);
        }
        for name in ["", "1a", "Not Available", "a-b", "é"] {
            assert!(
                matches!(check_identifier("name", name), Err(CodegenError::InvalidIdentifier { .. })),
                "{:?}",
                name
            );
        }
    }
}
