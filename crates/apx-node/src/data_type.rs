use apx_syntax::{parse_signature, parse_type_attributes, SignatureError, TypeAttributes, TypeDescriptor};

/// A named data type, declared once per node and referenced from ports and
/// other data types with `T["Name"]` or `T[index]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataType {
    name: String,
    descriptor: TypeDescriptor,
    attributes: TypeAttributes,
}

impl DataType {
    /// Parses `signature` into a new data type.
    ///
    /// ```
    /// use apx_node::DataType;
    ///
    /// let mode = DataType::new("Mode_T", "C(0,15)").unwrap();
    /// assert_eq!(mode.signature(), "C(0,15)");
    /// ```
    pub fn new(name: impl Into<String>, signature: &str) -> Result<Self, SignatureError> {
        Ok(Self::from_parts(name, parse_signature(signature)?, TypeAttributes::default()))
    }

    pub fn from_parts(name: impl Into<String>, descriptor: TypeDescriptor, attributes: TypeAttributes) -> Self {
        DataType {
            name: name.into(),
            descriptor,
            attributes,
        }
    }

    /// Attaches a type attribute string such as `VT("Off","On")`.
    pub fn with_attributes(mut self, attributes: &str) -> Result<Self, SignatureError> {
        self.attributes = parse_type_attributes(attributes)?;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    pub fn attributes(&self) -> &TypeAttributes {
        &self.attributes
    }

    /// Canonical signature text.
    pub fn signature(&self) -> String {
        self.descriptor.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_table_attribute() {
        let ty = DataType::new("OffOn_T", "C(0,3)")
            .unwrap()
            .with_attributes(r#"VT("Off", "On", "Error", "NotAvailable")"#)
            .unwrap();
        assert_eq!(ty.attributes().value_table.len(), 4);
        assert_eq!(ty.signature(), "C(0,3)");
    }

    #[test]
    fn test_invalid_signature() {
        assert!(matches!(
            DataType::new("Bad_T", "C(0,15"),
            Err(SignatureError::InvalidSignature { .. })
        ));
        assert!(matches!(
            DataType::new("Bad_T", "C(15,0)"),
            Err(SignatureError::InvalidRange { .. })
        ));
        assert!(matches!(
            DataType::new("Bad_T", "X"),
            Err(SignatureError::UnknownTypeCode { .. })
        ));
    }
}
