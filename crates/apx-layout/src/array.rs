use crate::{LayoutComputer, LayoutError, TypeResolver};
use apx_syntax::TypeDescriptor;

impl<'r, R: TypeResolver + ?Sized> LayoutComputer<'r, R> {
    /// Computes the packed width of a fixed-size array. Elements follow each
    /// other without stride padding.
    pub(crate) fn compute_array_width(
        &mut self,
        ty: &TypeDescriptor,
        element: &TypeDescriptor,
        len: u32,
    ) -> Result<u32, LayoutError> {
        let element_width = self.packed_width(element)?;
        element_width
            .checked_mul(len)
            .ok_or_else(|| LayoutError::WidthOverflow(ty.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use crate::testing::VecResolver;
    use crate::{LayoutComputer, LayoutError};
    use apx_syntax::parse_signature;

    #[test]
    fn test_array_width() {
        let resolver = VecResolver::new(&[]);
        let mut computer = LayoutComputer::new(&resolver);
        assert_eq!(computer.packed_width(&parse_signature("C(0,1000)[3]").unwrap()), Ok(6));
        assert_eq!(computer.packed_width(&parse_signature("S[2][2]").unwrap()), Ok(16));
        assert_eq!(computer.packed_width(&parse_signature("a[4][3]").unwrap()), Ok(12));
    }

    #[test]
    fn test_array_width_overflow() {
        let resolver = VecResolver::new(&[]);
        let mut computer = LayoutComputer::new(&resolver);
        let ty = parse_signature("S[4294967295]").unwrap();
        assert_eq!(
            computer.packed_width(&ty),
            Err(LayoutError::WidthOverflow("S[4294967295]".to_string()))
        );
    }
}
