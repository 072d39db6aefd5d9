use apx_syntax::{
    parse_port_attributes, parse_signature, Literal, PortAttributes, SignatureError, TypeDescriptor,
};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PortDirection {
    Provide,
    Require,
}

impl PortDirection {
    /// Line prefix used for ports of this direction in APX text.
    pub fn code(self) -> char {
        match self {
            PortDirection::Provide => 'P',
            PortDirection::Require => 'R',
        }
    }
}

impl fmt::Display for PortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortDirection::Provide => write!(f, "provide"),
            PortDirection::Require => write!(f, "require"),
        }
    }
}

/// A provide or require port before layout.
///
/// Reference-typed ports keep their `T[...]` descriptor; the effective type is
/// always looked up through the owning node's registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Port {
    name: String,
    direction: PortDirection,
    descriptor: TypeDescriptor,
    attributes: PortAttributes,
}

impl Port {
    /// Creates a port from a signature and an optional attribute string such
    /// as `"=0"` or `"=3, P"`.
    pub fn new(
        direction: PortDirection,
        name: impl Into<String>,
        signature: &str,
        attributes: Option<&str>,
    ) -> Result<Self, SignatureError> {
        let descriptor = parse_signature(signature)?;
        let attributes = match attributes {
            Some(text) => parse_port_attributes(text)?,
            None => PortAttributes::default(),
        };
        Ok(Self::from_parts(direction, name, descriptor, attributes))
    }

    /// ```
    /// use apx_node::{Port, PortDirection};
    ///
    /// let port = Port::provide("Status", r#"T["Mode_T"]"#, Some("=0")).unwrap();
    /// assert_eq!(port.direction(), PortDirection::Provide);
    /// ```
    pub fn provide(name: impl Into<String>, signature: &str, attributes: Option<&str>) -> Result<Self, SignatureError> {
        Self::new(PortDirection::Provide, name, signature, attributes)
    }

    pub fn require(name: impl Into<String>, signature: &str, attributes: Option<&str>) -> Result<Self, SignatureError> {
        Self::new(PortDirection::Require, name, signature, attributes)
    }

    pub fn from_parts(
        direction: PortDirection,
        name: impl Into<String>,
        descriptor: TypeDescriptor,
        attributes: PortAttributes,
    ) -> Self {
        Port {
            name: name.into(),
            direction,
            descriptor,
            attributes,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn direction(&self) -> PortDirection {
        self.direction
    }

    /// Declared descriptor, possibly a reference.
    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    pub fn attributes(&self) -> &PortAttributes {
        &self.attributes
    }

    pub fn init_value(&self) -> Option<&Literal> {
        self.attributes.init_value.as_ref()
    }

    pub fn is_parameter(&self) -> bool {
        self.attributes.is_parameter
    }

    /// Capacity of a queued port, from its `Q[N]` attribute.
    pub fn queue_length(&self) -> Option<u32> {
        self.attributes.queue_length
    }
}
