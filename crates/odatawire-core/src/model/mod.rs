//! Schema catalog: named types, their properties and keys, containers and
//! operations. Built once through [`CatalogBuilder`] and read-only after.

mod builder;


// re-exports
pub use builder::{CatalogBuilder, OperationDecl, TypeDecl};

use crate::error::SchemaError;
use derive_more::Display;
use odatawire_primitives::PrimitiveKind;
use std::collections::HashMap;

///
/// TypeId
///
/// Index of a named type inside its catalog. Only the catalog hands these
/// out, so a `TypeId` is always valid for the catalog that produced it.
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct TypeId(usize);

impl TypeId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

///
/// TypeRef
///
/// A declared type as it appears on a property, parameter or collection
/// element.
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
#[remain::sorted]
pub enum TypeRef {
    Collection(Box<Self>),
    EntityReference(TypeId),
    Named(TypeId),
    Primitive(PrimitiveKind),
    /// A type string the catalog could not resolve; reports kind `None`.
    Unresolved(String),
    Untyped,
}

impl TypeRef {
    #[must_use]
    pub fn collection(element: Self) -> Self {
        Self::Collection(Box::new(element))
    }

    #[must_use]
    pub const fn element(&self) -> Option<&Self> {
        match self {
            Self::Collection(element) => Some(element),
            _ => None,
        }
    }
}

///
/// TypeKind
///
/// Coarse kind of a declared type; the dispatch key for coercion and
/// parameter writing.
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
#[remain::sorted]
pub enum TypeKind {
    Collection,
    Complex,
    Entity,
    EntityReference,
    Enum,
    None,
    Primitive,
    TypeDefinition,
    Untyped,
}

///
/// SchemaTypeKind
///

#[derive(Clone, Debug, Eq, PartialEq)]
#[remain::sorted]
pub enum SchemaTypeKind {
    Complex,
    Entity,
    Enum { members: Vec<String> },
    TypeDefinition { underlying: PrimitiveKind },
}

///
/// SchemaType
///

#[derive(Clone, Debug)]
pub struct SchemaType {
    pub id: TypeId,
    pub namespace: String,
    pub name: String,
    pub full_name: String,
    pub kind: SchemaTypeKind,
    pub base: Option<TypeId>,
    pub is_abstract: bool,
    pub properties: Vec<StructuralProperty>,
    pub navigation: Vec<NavigationProperty>,
    pub key: Option<Vec<String>>,
}

impl SchemaType {
    #[must_use]
    pub const fn is_entity(&self) -> bool {
        matches!(self.kind, SchemaTypeKind::Entity)
    }

    /// Key declared on this type itself (not inherited).
    #[must_use]
    pub fn declared_key(&self) -> Option<&[String]> {
        self.key.as_deref()
    }

    #[must_use]
    pub const fn type_kind(&self) -> TypeKind {
        match self.kind {
            SchemaTypeKind::Complex => TypeKind::Complex,
            SchemaTypeKind::Entity => TypeKind::Entity,
            SchemaTypeKind::Enum { .. } => TypeKind::Enum,
            SchemaTypeKind::TypeDefinition { .. } => TypeKind::TypeDefinition,
        }
    }
}

///
/// StructuralProperty
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StructuralProperty {
    pub name: String,
    pub type_ref: TypeRef,
}

///
/// NavigationProperty
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NavigationProperty {
    pub name: String,
    pub target: TypeId,
    pub is_collection: bool,
}

impl NavigationProperty {
    #[must_use]
    pub fn type_ref(&self) -> TypeRef {
        let target = TypeRef::Named(self.target);

        if self.is_collection {
            TypeRef::collection(target)
        } else {
            target
        }
    }
}

///
/// EntitySet
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EntitySet {
    pub name: String,
    pub entity_type: TypeId,
}

///
/// Singleton
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Singleton {
    pub name: String,
    pub entity_type: TypeId,
}

///
/// OperationKind
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum OperationKind {
    Action,
    Function,
}

///
/// Operation
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Operation {
    pub name: String,
    pub full_name: String,
    pub kind: OperationKind,
    pub parameters: Vec<OperationParameter>,
    pub return_type: Option<TypeRef>,
}

///
/// OperationParameter
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OperationParameter {
    pub name: String,
    pub type_ref: TypeRef,
}

///
/// LinkedCollection
///
/// The container that addresses instances of an entity type.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct LinkedCollection<'a> {
    pub name: &'a str,
    pub is_singleton: bool,
}

///
/// SchemaCatalog
///

#[derive(Clone, Debug, Default)]
pub struct SchemaCatalog {
    types: Vec<SchemaType>,
    by_name: HashMap<String, TypeId>,
    entity_sets: Vec<EntitySet>,
    singletons: Vec<Singleton>,
    operations: Vec<Operation>,
}

impl SchemaCatalog {
    #[must_use]
    pub fn types(&self) -> &[SchemaType] {
        &self.types
    }

    #[must_use]
    pub fn get(&self, id: TypeId) -> &SchemaType {
        &self.types[id.0]
    }

    /// Find a type by qualified name, or by bare name when that is unique.
    #[must_use]
    pub fn find_type(&self, name: &str) -> Option<&SchemaType> {
        if let Some(id) = self.by_name.get(name) {
            return Some(self.get(*id));
        }

        let mut matches = self.types.iter().filter(|ty| ty.name == name);
        match (matches.next(), matches.next()) {
            (Some(ty), None) => Some(ty),
            _ => None,
        }
    }

    #[must_use]
    pub fn entity_sets(&self) -> &[EntitySet] {
        &self.entity_sets
    }

    #[must_use]
    pub fn singletons(&self) -> &[Singleton] {
        &self.singletons
    }

    #[must_use]
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn actions(&self) -> impl Iterator<Item = &Operation> {
        self.operations
            .iter()
            .filter(|op| op.kind == OperationKind::Action)
    }

    #[must_use]
    pub fn kind_of(&self, type_ref: &TypeRef) -> TypeKind {
        match type_ref {
            TypeRef::Collection(_) => TypeKind::Collection,
            TypeRef::EntityReference(_) => TypeKind::EntityReference,
            TypeRef::Named(id) => self.get(*id).type_kind(),
            TypeRef::Primitive(_) => TypeKind::Primitive,
            TypeRef::Unresolved(_) => TypeKind::None,
            TypeRef::Untyped => TypeKind::Untyped,
        }
    }

    /// Qualified wire name of a type reference, e.g. `Collection(Shop.Order)`.
    #[must_use]
    pub fn type_name(&self, type_ref: &TypeRef) -> String {
        match type_ref {
            TypeRef::Collection(element) => format!("Collection({})", self.type_name(element)),
            TypeRef::EntityReference(id) => format!("Ref({})", self.get(*id).full_name),
            TypeRef::Named(id) => self.get(*id).full_name.clone(),
            TypeRef::Primitive(kind) => kind.edm_name().to_string(),
            TypeRef::Unresolved(raw) => raw.clone(),
            TypeRef::Untyped => "Edm.Untyped".to_string(),
        }
    }

    /// The type itself followed by its base chain, most derived first.
    ///
    /// Traversal is bounded by the number of types in the catalog.
    #[must_use]
    pub fn ancestors(&self, id: TypeId) -> Ancestors<'_> {
        Ancestors {
            catalog: self,
            next: Some(id),
            remaining: self.types.len(),
        }
    }

    /// Structural properties including inherited ones, base type first.
    #[must_use]
    pub fn structural_properties(&self, id: TypeId) -> Vec<&StructuralProperty> {
        let mut chain: Vec<_> = self.ancestors(id).collect();
        chain.reverse();

        chain.into_iter().flat_map(|ty| &ty.properties).collect()
    }

    /// Navigation properties including inherited ones, base type first.
    #[must_use]
    pub fn navigation_properties(&self, id: TypeId) -> Vec<&NavigationProperty> {
        let mut chain: Vec<_> = self.ancestors(id).collect();
        chain.reverse();

        chain.into_iter().flat_map(|ty| &ty.navigation).collect()
    }

    /// First type in the chain (starting at `id`) that declares a key.
    #[must_use]
    pub fn key_owner(&self, id: TypeId) -> Option<&SchemaType> {
        self.ancestors(id).find(|ty| ty.declared_key().is_some())
    }

    /// Key properties of an entity type, in declared key order.
    pub fn key_properties(&self, id: TypeId) -> Result<Vec<&StructuralProperty>, SchemaError> {
        let owner = self.key_owner(id).ok_or_else(|| SchemaError::MissingKey {
            type_name: self.get(id).full_name.clone(),
        })?;
        let properties = self.structural_properties(owner.id);

        owner
            .declared_key()
            .unwrap_or_default()
            .iter()
            .map(|key| {
                properties
                    .iter()
                    .copied()
                    .find(|p| p.name == *key)
                    .ok_or_else(|| SchemaError::UnknownKeyProperty {
                        type_name: owner.full_name.clone(),
                        property: key.clone(),
                    })
            })
            .collect()
    }

    /// Entity set or singleton serving `id`, searched from `id` up its
    /// base chain. Entity sets win over singletons at the same level.
    pub fn linked_collection(&self, id: TypeId) -> Result<LinkedCollection<'_>, SchemaError> {
        for ty in self.ancestors(id) {
            if let Some(set) = self.entity_sets.iter().find(|s| s.entity_type == ty.id) {
                return Ok(LinkedCollection {
                    name: &set.name,
                    is_singleton: false,
                });
            }
            if let Some(single) = self.singletons.iter().find(|s| s.entity_type == ty.id) {
                return Ok(LinkedCollection {
                    name: &single.name,
                    is_singleton: true,
                });
            }
        }

        Err(SchemaError::MissingLinkedCollection {
            type_name: self.get(id).full_name.clone(),
        })
    }
}

///
/// Ancestors
///

pub struct Ancestors<'a> {
    catalog: &'a SchemaCatalog,
    next: Option<TypeId>,
    remaining: usize,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a SchemaType;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        if self.remaining == 0 {
            self.next = None;
            return None;
        }
        self.remaining -= 1;

        let ty = self.catalog.get(id);
        self.next = ty.base;

        Some(ty)
    }
}
