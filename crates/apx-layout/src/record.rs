use crate::{LayoutComputer, LayoutError, TypeResolver};
use apx_syntax::{RecordField, TypeDescriptor};

impl<'r, R: TypeResolver + ?Sized> LayoutComputer<'r, R> {
    /// Computes the packed width of a record: its fields are concatenated
    /// without padding.
    pub(crate) fn compute_record_width(
        &mut self,
        ty: &TypeDescriptor,
        fields: &[RecordField],
    ) -> Result<u32, LayoutError> {
        let mut width = 0u32;
        for field in fields {
            let field_width = self.packed_width(&field.ty)?;
            width = width
                .checked_add(field_width)
                .ok_or_else(|| LayoutError::WidthOverflow(ty.to_string()))?;
        }
        Ok(width)
    }

    /// Byte offset of every field relative to the start of the record.
    pub fn record_field_offsets(&mut self, fields: &[RecordField]) -> Result<Vec<u32>, LayoutError> {
        let mut offsets = Vec::with_capacity(fields.len());
        let mut offset = 0u32;
        for field in fields {
            offsets.push(offset);
            offset += self.packed_width(&field.ty)?;
        }
        Ok(offsets)
    }
}

#[cfg(test)]
mod tests {
    use crate::testing::VecResolver;
    use crate::LayoutComputer;
    use apx_syntax::{parse_signature, TypeDescriptor};

    #[test]
    fn test_record_is_dense() {
        let resolver = VecResolver::new(&[("Mode_T", "C(0,3)")]);
        let ty = parse_signature(r#"{"Id"C(0,1000)"Mode"T["Mode_T"]"Value"S"Tag"a[3]}"#).unwrap();
        let mut computer = LayoutComputer::new(&resolver);
        assert_eq!(computer.packed_width(&ty), Ok(2 + 1 + 4 + 3));

        let fields = match &ty {
            TypeDescriptor::Record(fields) => fields,
            other => panic!("Expected record, got {:?}", other),
        };
        assert_eq!(computer.record_field_offsets(fields), Ok(vec![0, 2, 3, 7]));
    }
}
