use crate::data_type::DataType;
use crate::error::{NodeError, NodeResult};
use apx_layout::TypeResolver;
use apx_syntax::{TypeDescriptor, TypeRef};
use indexmap::IndexMap;

/// Stable handle of a data type inside its node. Equals the type's position
/// in declaration order, which is also its `T[index]` reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub(crate) usize);

impl TypeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Arena of the data types of one node, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: IndexMap<String, DataType>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a data type. Every reference inside its descriptor must name a
    /// data type declared earlier, which keeps the reference graph acyclic.
    pub fn declare(&mut self, data_type: DataType) -> NodeResult<TypeId> {
        if self.types.contains_key(data_type.name()) {
            return Err(NodeError::DuplicateTypeName {
                name: data_type.name().to_string(),
            });
        }
        let own_index = self.types.len();
        for type_ref in data_type.descriptor().references() {
            let is_forward = match type_ref {
                TypeRef::Name(name) => name == data_type.name(),
                TypeRef::Index(index) => *index >= own_index,
            };
            if is_forward {
                return Err(NodeError::ForwardReferenceNotAllowed {
                    type_name: data_type.name().to_string(),
                    reference: type_ref.to_string(),
                });
            }
            self.lookup(type_ref)?;
        }
        log::debug!(
            "declared data type #{} `{}` {}",
            own_index,
            data_type.name(),
            data_type.descriptor()
        );
        self.types.insert(data_type.name().to_string(), data_type);
        Ok(TypeId(own_index))
    }

    /// Resolves a reference to the declared data type it names.
    pub fn lookup(&self, type_ref: &TypeRef) -> NodeResult<TypeId> {
        let index = match type_ref {
            TypeRef::Name(name) => self.types.get_index_of(name.as_str()),
            TypeRef::Index(index) => Some(*index).filter(|i| *i < self.types.len()),
        };
        index.map(TypeId).ok_or_else(|| NodeError::UnknownTypeReference {
            reference: type_ref.to_string(),
        })
    }

    /// Checks that every reference nested in `descriptor` resolves.
    pub fn check_references(&self, descriptor: &TypeDescriptor) -> NodeResult<()> {
        for type_ref in descriptor.references() {
            self.lookup(type_ref)?;
        }
        Ok(())
    }

    pub fn get(&self, id: TypeId) -> Option<&DataType> {
        self.types.get_index(id.0).map(|(_, ty)| ty)
    }

    pub fn find(&self, name: &str) -> Option<(TypeId, &DataType)> {
        self.types
            .get_full(name)
            .map(|(index, _, ty)| (TypeId(index), ty))
    }

    /// Follows references until a non-reference descriptor is reached.
    pub fn resolve_descriptor<'a>(&'a self, mut descriptor: &'a TypeDescriptor) -> NodeResult<&'a TypeDescriptor> {
        while let TypeDescriptor::Reference(type_ref) = descriptor {
            let id = self.lookup(type_ref)?;
            descriptor = self.types[id.0].descriptor();
        }
        Ok(descriptor)
    }

    pub fn iter(&self) -> impl Iterator<Item = (TypeId, &DataType)> + '_ {
        self.types.values().enumerate().map(|(i, ty)| (TypeId(i), ty))
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl TypeResolver for TypeRegistry {
    fn resolve(&self, type_ref: &TypeRef) -> Option<(usize, &TypeDescriptor)> {
        let id = self.lookup(type_ref).ok()?;
        self.get(id).map(|ty| (id.0, ty.descriptor()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(types: &[(&str, &str)]) -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        for (name, sig) in types {
            registry.declare(DataType::new(*name, sig).unwrap()).unwrap();
        }
        registry
    }

    #[test]
    fn test_declare_and_lookup() {
        let registry = registry(&[("Mode_T", "C(0,15)"), ("Speed_T", "C(0,65535)")]);
        assert_eq!(registry.lookup(&TypeRef::Name("Speed_T".into())), Ok(TypeId(1)));
        assert_eq!(registry.lookup(&TypeRef::Index(0)), Ok(TypeId(0)));
        assert_eq!(registry.find("Mode_T").map(|(id, _)| id), Some(TypeId(0)));
    }

    #[test]
    fn test_duplicate_type_name() {
        let mut registry = registry(&[("Mode_T", "C(0,15)")]);
        assert_eq!(
            registry.declare(DataType::new("Mode_T", "S").unwrap()),
            Err(NodeError::DuplicateTypeName {
                name: "Mode_T".to_string()
            })
        );
    }

    #[test]
    fn test_unknown_type_reference() {
        let registry = registry(&[]);
        assert_eq!(
            registry.lookup(&TypeRef::Name("Missing_T".into())),
            Err(NodeError::UnknownTypeReference {
                reference: r#"T["Missing_T"]"#.to_string()
            })
        );
        assert!(registry.lookup(&TypeRef::Index(0)).is_err());
    }

    #[test]
    fn test_references_must_point_backwards() {
        let mut registry = registry(&[("Mode_T", "C(0,15)")]);
        registry
            .declare(DataType::new("Pair_T", r#"{"a"T["Mode_T"]"b"T[0]}"#).unwrap())
            .unwrap();

        assert_eq!(
            registry.declare(DataType::new("Self_T", r#"{"next"T["Self_T"]}"#).unwrap()),
            Err(NodeError::ForwardReferenceNotAllowed {
                type_name: "Self_T".to_string(),
                reference: r#"T["Self_T"]"#.to_string(),
            })
        );
        assert_eq!(
            registry.declare(DataType::new("Ahead_T", "T[2]").unwrap()),
            Err(NodeError::ForwardReferenceNotAllowed {
                type_name: "Ahead_T".to_string(),
                reference: "T[2]".to_string(),
            })
        );
        assert!(matches!(
            registry.declare(DataType::new("Later_T", r#"T["NotYet_T"]"#).unwrap()),
            Err(NodeError::UnknownTypeReference { .. })
        ));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_resolve_descriptor_follows_chains() {
        let registry = registry(&[("A", "C(0,7)"), ("B", r#"T["A"]"#), ("C", "T[1]")]);
        let start = TypeDescriptor::Reference(TypeRef::Name("C".into()));
        assert_eq!(
            registry.resolve_descriptor(&start).unwrap().to_string(),
            "C(0,7)"
        );
    }
}
