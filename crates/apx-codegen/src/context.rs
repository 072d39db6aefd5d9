use crate::apx_text;
use crate::config::{GeneratorConfig, ReferenceStyle};
use crate::error::{CodegenError, CodegenResult};
use crate::writer::{write_artifacts, Artifact};
use apx_node::{Node, NodeBuilder, NodeError};
use apx_syntax::{parse_definition, NodeDeclaration, TypeRef};
use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// An ordered set of finalized nodes, emitted together as one APX artifact.
///
/// Nodes are shared: the same node can be generated on its own and also be
/// part of any number of contexts.
#[derive(Debug, Clone, Default)]
pub struct Context {
    config: GeneratorConfig,
    nodes: IndexMap<String, Arc<Node>>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: GeneratorConfig) -> Self {
        Context {
            config,
            nodes: IndexMap::new(),
        }
    }

    /// Reads a context artifact back: the version of the header line becomes
    /// the configured APX version and every node block is rebuilt and
    /// finalized. When every reference in the text is by name, the context
    /// renders names again; otherwise it renders indices.
    pub fn from_apx_text(text: &str) -> CodegenResult<Context> {
        let definition = parse_definition(text).map_err(NodeError::from)?;
        let reference_style = if uses_only_name_references(&definition.nodes) {
            ReferenceStyle::Name
        } else {
            ReferenceStyle::Index
        };
        let mut context = Context::with_config(GeneratorConfig {
            apx_version: definition.version,
            reference_style,
            ..GeneratorConfig::default()
        });
        for declaration in definition.nodes {
            let node = NodeBuilder::from_declaration(declaration)?.finalize()?;
            context.append(node)?;
        }
        log::debug!("read context with {} nodes", context.len());
        Ok(context)
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Adds a node. Node names are unique within a context.
    pub fn append(&mut self, node: impl Into<Arc<Node>>) -> CodegenResult<&mut Self> {
        let node = node.into();
        if self.nodes.contains_key(node.name()) {
            return Err(CodegenError::DuplicateNodeName {
                name: node.name().to_string(),
            });
        }
        log::debug!("added node `{}` to context", node.name());
        self.nodes.insert(node.name().to_string(), node);
        Ok(self)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Arc<Node>> + '_ {
        self.nodes.values()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The combined APX text: one header line, then every node block in
    /// append order.
    pub fn render(&self) -> String {
        let mut out = apx_text::header(&self.config);
        for node in self.nodes.values() {
            apx_text::write_node_block(&mut out, node, self.config.reference_style);
        }
        out
    }

    /// Writes the combined APX text to `<output_dir>/<context_file>`.
    pub fn generate_apx(&self, output_dir: impl AsRef<Path>) -> CodegenResult<PathBuf> {
        let output_dir = output_dir.as_ref();
        let artifact = Artifact::new(self.config.context_file.clone(), self.render());
        write_artifacts(output_dir, &[artifact])?;
        log::info!("generated APX context with {} nodes", self.nodes.len());
        Ok(output_dir.join(&self.config.context_file))
    }
}

fn uses_only_name_references(nodes: &[NodeDeclaration]) -> bool {
    let mut any = false;
    let mut only_names = true;
    for node in nodes {
        let descriptors = node
            .types
            .iter()
            .map(|t| &t.descriptor)
            .chain(node.provide_ports.iter().chain(&node.require_ports).map(|p| &p.descriptor));
        for descriptor in descriptors {
            descriptor.for_each_reference(&mut |type_ref| {
                any = true;
                only_names &= matches!(type_ref, TypeRef::Name(_));
            });
        }
    }
    any && only_names
}
