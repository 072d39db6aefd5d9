use apx_syntax::{TypeDescriptor, TypeRef, SCALAR_WIDTH};
use miette::Diagnostic;
use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;

mod array;
mod pack;
mod record;
mod signal;

// Publicly export key types
pub use signal::{queue_header_width, PortSignal, PortSlot, SignalLayout};

/// Errors that can occur during layout computation.
#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("Type reference {reference} does not resolve to a declared data type")]
    #[diagnostic(code(apx_layout::unresolved_reference))]
    UnresolvedReference { reference: String },

    #[error("Port `{port}` has an unresolved type: {reference}")]
    #[diagnostic(code(apx_layout::unresolved_port_type))]
    UnresolvedPortType { port: String, reference: String },

    #[error("Type recursion detected through data type #{0}")]
    #[diagnostic(code(apx_layout::type_recursion))]
    TypeRecursion(usize),

    #[error("Packed width of `{0}` exceeds 32 bits")]
    #[diagnostic(code(apx_layout::width_overflow))]
    WidthOverflow(String),

    #[error("Init value of kind {found} cannot be packed as {expected}")]
    #[diagnostic(code(apx_layout::init_value_shape))]
    InitValueShape {
        expected: &'static str,
        found: &'static str,
    },
}

/// Looks up the named data type a reference points at.
///
/// The returned index identifies the data type for caching and recursion
/// detection; it must be stable for the lifetime of the resolver.
pub trait TypeResolver {
    fn resolve(&self, type_ref: &TypeRef) -> Option<(usize, &TypeDescriptor)>;
}

/// Computes packed widths and buffer layouts for the types of one node.
///
/// Widths of named data types are cached by resolver index, so a type that is
/// referenced by many ports is only measured once.
pub struct LayoutComputer<'r, R: TypeResolver + ?Sized> {
    resolver: &'r R,

    /// Cache of named type index to packed width
    named_widths: FxHashMap<usize, u32>,

    /// Used to detect recursion in type definitions
    processing_layout: FxHashSet<usize>,
}

impl<'r, R: TypeResolver + ?Sized> LayoutComputer<'r, R> {
    pub fn new(resolver: &'r R) -> Self {
        LayoutComputer {
            resolver,
            named_widths: FxHashMap::default(),
            processing_layout: FxHashSet::default(),
        }
    }

    /// Packed width in bytes of a descriptor: the range width for `C(min,max)`,
    /// the code's width for fixed-width integers, 1 for `b`, 4 for `S`, N code
    /// units for strings, the sum of the fields for records, N times the
    /// element for arrays and the target's width for references.
    pub fn packed_width(&mut self, ty: &TypeDescriptor) -> Result<u32, LayoutError> {
        match ty {
            TypeDescriptor::IntegerRange(range) => Ok(range.packed_width()),
            TypeDescriptor::Integer(int) => Ok(int.ty.width()),
            TypeDescriptor::Bool => Ok(1),
            TypeDescriptor::Scalar => Ok(SCALAR_WIDTH),
            TypeDescriptor::String { len } => Ok(*len),
            TypeDescriptor::Text { unit, len } => unit
                .width()
                .checked_mul(*len)
                .ok_or_else(|| LayoutError::WidthOverflow(ty.to_string())),
            TypeDescriptor::Record(fields) => self.compute_record_width(ty, fields),
            TypeDescriptor::Array { element, len } => self.compute_array_width(ty, element, *len),
            TypeDescriptor::Reference(type_ref) => self.compute_reference_width(type_ref),
        }
    }

    /// Follows a reference to its target descriptor.
    pub fn resolve(&self, type_ref: &TypeRef) -> Result<(usize, &'r TypeDescriptor), LayoutError> {
        let resolver: &'r R = self.resolver;
        resolver
            .resolve(type_ref)
            .ok_or_else(|| LayoutError::UnresolvedReference {
                reference: type_ref.to_string(),
            })
    }

    fn compute_reference_width(&mut self, type_ref: &TypeRef) -> Result<u32, LayoutError> {
        let (index, target) = self.resolve(type_ref)?;
        if let Some(width) = self.named_widths.get(&index) {
            return Ok(*width);
        }
        if !self.processing_layout.insert(index) {
            return Err(LayoutError::TypeRecursion(index));
        }
        let result = self.packed_width(target);
        self.processing_layout.remove(&index);
        let width = result?;
        self.named_widths.insert(index, width);
        Ok(width)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use apx_syntax::parse_signature;

    /// Resolver over a plain list of `(name, signature)` pairs.
    pub struct VecResolver {
        pub types: Vec<(String, TypeDescriptor)>,
    }

    impl VecResolver {
        pub fn new(types: &[(&str, &str)]) -> Self {
            VecResolver {
                types: types
                    .iter()
                    .map(|(name, sig)| (name.to_string(), parse_signature(sig).unwrap()))
                    .collect(),
            }
        }
    }

    impl TypeResolver for VecResolver {
        fn resolve(&self, type_ref: &TypeRef) -> Option<(usize, &TypeDescriptor)> {
            match type_ref {
                TypeRef::Name(name) => self
                    .types
                    .iter()
                    .position(|(n, _)| n == name)
                    .map(|i| (i, &self.types[i].1)),
                TypeRef::Index(i) => self.types.get(*i).map(|(_, ty)| (*i, ty)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::VecResolver;
    use super::*;
    use apx_syntax::parse_signature;

    fn width_of(resolver: &VecResolver, sig: &str) -> Result<u32, LayoutError> {
        LayoutComputer::new(resolver).packed_width(&parse_signature(sig).unwrap())
    }

    #[test]
    fn test_primitive_widths() {
        let resolver = VecResolver::new(&[]);
        assert_eq!(width_of(&resolver, "C(0,15)"), Ok(1));
        assert_eq!(width_of(&resolver, "C(0,1000)"), Ok(2));
        assert_eq!(width_of(&resolver, "C(0,100000)"), Ok(4));
        assert_eq!(width_of(&resolver, "S"), Ok(4));
        assert_eq!(width_of(&resolver, "a[10]"), Ok(10));
    }

    #[test]
    fn test_fixed_width_codes() {
        let resolver = VecResolver::new(&[]);
        for (sig, width) in [
            ("c", 1),
            ("B", 1),
            ("b", 1),
            ("s", 2),
            ("l", 4),
            ("L", 4),
            ("q", 8),
            ("Q(0,10)", 8),
            ("A[6]", 6),
            ("u[6]", 12),
            ("U[3]", 12),
            ("s[4]", 8),
        ] {
            assert_eq!(width_of(&resolver, sig), Ok(width), "width of {}", sig);
        }
    }

    #[test]
    fn test_reference_width_follows_target() {
        let resolver = VecResolver::new(&[("Mode_T", "C(0,15)"), ("Speed_T", "C(0,65535)")]);
        assert_eq!(width_of(&resolver, r#"T["Mode_T"]"#), Ok(1));
        assert_eq!(width_of(&resolver, "T[1]"), Ok(2));
    }

    #[test]
    fn test_unresolved_reference() {
        let resolver = VecResolver::new(&[]);
        assert_eq!(
            width_of(&resolver, r#"T["Missing"]"#),
            Err(LayoutError::UnresolvedReference {
                reference: r#"T["Missing"]"#.to_string()
            })
        );
    }

    #[test]
    fn test_recursive_types_are_detected() {
        let resolver = VecResolver::new(&[("A", r#"{"next"T["A"]}"#)]);
        assert_eq!(width_of(&resolver, r#"T["A"]"#), Err(LayoutError::TypeRecursion(0)));
    }
}
