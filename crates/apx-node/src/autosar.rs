//! Import boundary for AUTOSAR software components.
//!
//! A component is consumed as an opaque source of named ports whose types are
//! looked up by name in the component's own type system. Imported types and
//! ports become ordinary [`DataType`]s and [`Port`]s of the target node.

use crate::data_type::DataType;
use crate::error::{NodeError, NodeResult};
use crate::node::NodeBuilder;
use crate::port::{Port, PortDirection};
use apx_syntax::{
    parse_port_attributes, parse_signature, parse_type_attributes, SignatureError, TypeAttributes,
    TypeDescriptor, TypeRef,
};
use miette::SourceSpan;
use std::collections::HashSet;

/// Data type as published by a software component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentDataType {
    pub name: String,
    /// APX data signature; may reference other types of the component by name.
    pub signature: String,
    /// Type attribute string such as `VT("Off","On")`.
    pub attributes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentPort {
    pub name: String,
    pub type_name: String,
    /// Port attribute string such as `=0`.
    pub attributes: Option<String>,
}

pub trait SoftwareComponent {
    fn name(&self) -> &str;

    fn provide_ports(&self) -> &[ComponentPort];

    fn require_ports(&self) -> &[ComponentPort];

    /// Looks up a data type of the component's type system.
    fn data_type(&self, name: &str) -> Option<&ComponentDataType>;
}

impl NodeBuilder {
    /// Imports the ports of a software component together with every data
    /// type they depend on.
    ///
    /// Types already declared in the node under the same name are reused if
    /// they have the same definition; a different definition is reported as
    /// [`NodeError::DuplicateTypeName`]. Either everything is imported or, on
    /// error, the node is left unchanged.
    pub fn import_autosar_swc<C: SoftwareComponent + ?Sized>(&mut self, component: &C) -> NodeResult<()> {
        let mut staged = self.clone();
        staged.set_name_if_missing(component.name());

        let directions = [
            (PortDirection::Provide, component.provide_ports()),
            (PortDirection::Require, component.require_ports()),
        ];
        for (direction, ports) in directions {
            for port in ports {
                let mut visiting = HashSet::new();
                staged.import_type(component, &port.type_name, &mut visiting)?;
                let attributes = match &port.attributes {
                    Some(text) => parse_port_attributes(text)?,
                    None => Default::default(),
                };
                let descriptor = TypeDescriptor::Reference(TypeRef::Name(port.type_name.clone()));
                staged.append_port(Port::from_parts(direction, port.name.clone(), descriptor, attributes))?;
            }
        }

        log::info!(
            "imported software component `{}`: {} provide ports, {} require ports",
            component.name(),
            component.provide_ports().len(),
            component.require_ports().len()
        );
        *self = staged;
        Ok(())
    }

    /// Declares `name` after its dependencies, depth first.
    ///
    /// A type the node already declares under the same name is reused when
    /// its descriptor and attributes match the component's definition.
    fn import_type<C: SoftwareComponent + ?Sized>(
        &mut self,
        component: &C,
        name: &str,
        visiting: &mut HashSet<String>,
    ) -> NodeResult<()> {
        let Some(source) = component.data_type(name) else {
            self.types().lookup(&TypeRef::Name(name.to_string()))?;
            return Ok(());
        };
        if !visiting.insert(name.to_string()) {
            return Err(NodeError::ForwardReferenceNotAllowed {
                type_name: name.to_string(),
                reference: TypeRef::Name(name.to_string()).to_string(),
            });
        }

        let descriptor = parse_component_signature(&source.signature)?;
        let attributes = match &source.attributes {
            Some(text) => parse_type_attributes(text)?,
            None => TypeAttributes::default(),
        };
        for type_ref in descriptor.references() {
            if let TypeRef::Name(dependency) = type_ref {
                self.import_type(component, dependency, visiting)?;
            }
        }
        visiting.remove(name);

        if let Some((_, existing)) = self.types().find(name) {
            let existing_descriptor = self.named_references(existing.descriptor());
            if existing_descriptor != descriptor || existing.attributes() != &attributes {
                log::warn!(
                    "data type `{}` of component `{}` is {} but the node declares {}",
                    name,
                    component.name(),
                    descriptor,
                    existing_descriptor
                );
                return Err(NodeError::DuplicateTypeName {
                    name: name.to_string(),
                });
            }
            log::debug!("reusing data type `{}` for component `{}`", name, component.name());
            return Ok(());
        }
        self.append_type(DataType::from_parts(name, descriptor, attributes))?;
        Ok(())
    }

    /// Rewrites index references of a declared descriptor into names, so it
    /// can be compared with a component signature.
    fn named_references(&self, descriptor: &TypeDescriptor) -> TypeDescriptor {
        let types = self.types();
        descriptor.map_references(&mut |type_ref| {
            match types.lookup(type_ref).ok().and_then(|id| types.get(id)) {
                Some(target) => TypeRef::Name(target.name().to_string()),
                None => type_ref.clone(),
            }
        })
    }
}

/// Component types live in their own type system, so positions of the node's
/// type list mean nothing there. Only `T["Name"]` references are accepted.
fn parse_component_signature(signature: &str) -> NodeResult<TypeDescriptor> {
    let descriptor = parse_signature(signature)?;
    if descriptor.references().iter().any(|r| matches!(r, TypeRef::Index(_))) {
        return Err(SignatureError::InvalidSignature {
            message: "index references are not allowed in component signatures; reference types by name"
                .to_string(),
            src: signature.to_string(),
            span: SourceSpan::new(0.into(), signature.len()),
        }
        .into());
    }
    Ok(descriptor)
}
