use crate::{
    error::SchemaError,
    model::{
        EntitySet, NavigationProperty, Operation, OperationKind, OperationParameter,
        SchemaCatalog, SchemaType, SchemaTypeKind, Singleton, StructuralProperty, TypeId, TypeRef,
    },
};
use odatawire_primitives::PrimitiveKind;
use std::collections::HashMap;

///
/// CatalogBuilder
///
/// Declarative front door for a [`SchemaCatalog`]. Type references are
/// plain EDM type strings and are only resolved in [`Self::build`], so
/// declarations may appear in any order.
///

#[derive(Clone, Debug)]
pub struct CatalogBuilder {
    namespace: String,
    types: Vec<TypeDecl>,
    entity_sets: Vec<(String, String)>,
    singletons: Vec<(String, String)>,
    operations: Vec<OperationDecl>,
}

impl CatalogBuilder {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            types: Vec::new(),
            entity_sets: Vec::new(),
            singletons: Vec::new(),
            operations: Vec::new(),
        }
    }

    pub fn entity_type(&mut self, name: impl Into<String>) -> &mut TypeDecl {
        self.push_type(name.into(), DeclKind::Entity)
    }

    pub fn complex_type(&mut self, name: impl Into<String>) -> &mut TypeDecl {
        self.push_type(name.into(), DeclKind::Complex)
    }

    pub fn enum_type(&mut self, name: impl Into<String>, members: &[&str]) -> &mut TypeDecl {
        let members = members.iter().map(ToString::to_string).collect();

        self.push_type(name.into(), DeclKind::Enum(members))
    }

    pub fn type_definition(
        &mut self,
        name: impl Into<String>,
        underlying: PrimitiveKind,
    ) -> &mut TypeDecl {
        self.push_type(name.into(), DeclKind::TypeDefinition(underlying))
    }

    pub fn entity_set(
        &mut self,
        name: impl Into<String>,
        entity_type: impl Into<String>,
    ) -> &mut Self {
        self.entity_sets.push((name.into(), entity_type.into()));
        self
    }

    pub fn singleton(&mut self, name: impl Into<String>, entity_type: impl Into<String>) -> &mut Self {
        self.singletons.push((name.into(), entity_type.into()));
        self
    }

    pub fn action(&mut self, name: impl Into<String>) -> &mut OperationDecl {
        self.push_operation(name.into(), OperationKind::Action)
    }

    pub fn function(&mut self, name: impl Into<String>) -> &mut OperationDecl {
        self.push_operation(name.into(), OperationKind::Function)
    }

    fn push_type(&mut self, name: String, kind: DeclKind) -> &mut TypeDecl {
        self.types.push(TypeDecl {
            name,
            kind,
            base: None,
            is_abstract: false,
            key: None,
            properties: Vec::new(),
            navigation: Vec::new(),
        });

        let last = self.types.len() - 1;
        &mut self.types[last]
    }

    fn push_operation(&mut self, name: String, kind: OperationKind) -> &mut OperationDecl {
        self.operations.push(OperationDecl {
            name,
            kind,
            parameters: Vec::new(),
            return_type: None,
        });

        let last = self.operations.len() - 1;
        &mut self.operations[last]
    }

    fn qualify(&self, name: &str) -> String {
        if name.contains('.') {
            name.to_string()
        } else {
            format!("{}.{name}", self.namespace)
        }
    }

    /// Resolve every type string and validate the result.
    pub fn build(&self) -> Result<SchemaCatalog, SchemaError> {
        let mut by_name = HashMap::new();
        for (index, decl) in self.types.iter().enumerate() {
            by_name.entry(self.qualify(&decl.name)).or_insert(TypeId(index));
        }

        let resolver = TypeStrings {
            builder: self,
            by_name: &by_name,
            decls: &self.types,
        };

        let types = self
            .types
            .iter()
            .enumerate()
            .map(|(index, decl)| resolver.schema_type(TypeId(index), decl))
            .collect::<Result<Vec<_>, _>>()?;

        let entity_sets = self
            .entity_sets
            .iter()
            .map(|(name, ty)| {
                resolver
                    .entity(ty, name)
                    .map(|entity_type| EntitySet {
                        name: name.clone(),
                        entity_type,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let singletons = self
            .singletons
            .iter()
            .map(|(name, ty)| {
                resolver
                    .entity(ty, name)
                    .map(|entity_type| Singleton {
                        name: name.clone(),
                        entity_type,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let operations = self
            .operations
            .iter()
            .map(|decl| Operation {
                name: decl.name.clone(),
                full_name: self.qualify(&decl.name),
                kind: decl.kind,
                parameters: decl
                    .parameters
                    .iter()
                    .map(|(name, ty)| OperationParameter {
                        name: name.clone(),
                        type_ref: resolver.parse(ty),
                    })
                    .collect(),
                return_type: decl.return_type.as_deref().map(|ty| resolver.parse(ty)),
            })
            .collect();

        let catalog = SchemaCatalog {
            types,
            by_name,
            entity_sets,
            singletons,
            operations,
        };
        validate(&catalog)?;

        Ok(catalog)
    }
}

///
/// TypeDecl
///

#[derive(Clone, Debug)]
pub struct TypeDecl {
    name: String,
    kind: DeclKind,
    base: Option<String>,
    is_abstract: bool,
    key: Option<Vec<String>>,
    properties: Vec<(String, String)>,
    navigation: Vec<(String, String)>,
}

impl TypeDecl {
    pub fn base(&mut self, name: impl Into<String>) -> &mut Self {
        self.base = Some(name.into());
        self
    }

    pub const fn abstract_type(&mut self) -> &mut Self {
        self.is_abstract = true;
        self
    }

    pub fn key(&mut self, names: &[&str]) -> &mut Self {
        self.key = Some(names.iter().map(ToString::to_string).collect());
        self
    }

    pub fn property(&mut self, name: impl Into<String>, type_str: impl Into<String>) -> &mut Self {
        self.properties.push((name.into(), type_str.into()));
        self
    }

    /// Declare a navigation property; `type_str` is `NS.Entity` or
    /// `Collection(NS.Entity)`.
    pub fn navigation(&mut self, name: impl Into<String>, type_str: impl Into<String>) -> &mut Self {
        self.navigation.push((name.into(), type_str.into()));
        self
    }
}

#[derive(Clone, Debug)]
enum DeclKind {
    Complex,
    Entity,
    Enum(Vec<String>),
    TypeDefinition(PrimitiveKind),
}

///
/// OperationDecl
///

#[derive(Clone, Debug)]
pub struct OperationDecl {
    name: String,
    kind: OperationKind,
    parameters: Vec<(String, String)>,
    return_type: Option<String>,
}

impl OperationDecl {
    pub fn parameter(&mut self, name: impl Into<String>, type_str: impl Into<String>) -> &mut Self {
        self.parameters.push((name.into(), type_str.into()));
        self
    }

    pub fn returns(&mut self, type_str: impl Into<String>) -> &mut Self {
        self.return_type = Some(type_str.into());
        self
    }
}

// Type string resolution against the declared names.
struct TypeStrings<'b> {
    builder: &'b CatalogBuilder,
    by_name: &'b HashMap<String, TypeId>,
    decls: &'b [TypeDecl],
}

impl TypeStrings<'_> {
    fn lookup(&self, name: &str) -> Option<TypeId> {
        self.by_name.get(&self.builder.qualify(name)).copied()
    }

    fn is_entity(&self, id: TypeId) -> bool {
        matches!(self.decls[id.0].kind, DeclKind::Entity)
    }

    fn parse(&self, raw: &str) -> TypeRef {
        let text = raw.trim();

        if let Some(inner) = wrapped(text, "Collection(") {
            return TypeRef::collection(self.parse(inner));
        }
        if let Some(inner) = wrapped(text, "Ref(") {
            return match self.lookup(inner.trim()) {
                Some(id) if self.is_entity(id) => TypeRef::EntityReference(id),
                _ => TypeRef::Unresolved(text.to_string()),
            };
        }
        if text == "Edm.Untyped" {
            return TypeRef::Untyped;
        }
        if let Some(kind) = text
            .strip_prefix("Edm.")
            .and_then(PrimitiveKind::from_edm_name)
        {
            return TypeRef::Primitive(kind);
        }

        self.lookup(text)
            .map_or_else(|| TypeRef::Unresolved(text.to_string()), TypeRef::Named)
    }

    fn entity(&self, raw: &str, referenced_by: &str) -> Result<TypeId, SchemaError> {
        self.lookup(raw)
            .filter(|id| self.is_entity(*id))
            .ok_or_else(|| SchemaError::UnknownType {
                name: raw.to_string(),
                referenced_by: referenced_by.to_string(),
            })
    }

    fn schema_type(&self, id: TypeId, decl: &TypeDecl) -> Result<SchemaType, SchemaError> {
        let full_name = self.builder.qualify(&decl.name);
        let (namespace, name) = full_name
            .rsplit_once('.')
            .map_or((String::new(), full_name.clone()), |(ns, n)| {
                (ns.to_string(), n.to_string())
            });

        let base = decl
            .base
            .as_deref()
            .map(|base| {
                self.lookup(base).ok_or_else(|| SchemaError::UnknownType {
                    name: base.to_string(),
                    referenced_by: full_name.clone(),
                })
            })
            .transpose()?;

        let properties = decl
            .properties
            .iter()
            .map(|(name, ty)| StructuralProperty {
                name: name.clone(),
                type_ref: self.parse(ty),
            })
            .collect();

        let navigation = decl
            .navigation
            .iter()
            .map(|(nav, ty)| {
                let referenced_by = format!("{full_name}.{nav}");
                let (target, is_collection) = match self.parse(ty) {
                    TypeRef::Named(target) => (target, false),
                    TypeRef::Collection(element) => match *element {
                        TypeRef::Named(target) => (target, true),
                        _ => return Err(unknown(ty, referenced_by)),
                    },
                    _ => return Err(unknown(ty, referenced_by)),
                };
                if !self.is_entity(target) {
                    return Err(unknown(ty, referenced_by));
                }

                Ok(NavigationProperty {
                    name: nav.clone(),
                    target,
                    is_collection,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let kind = match &decl.kind {
            DeclKind::Complex => SchemaTypeKind::Complex,
            DeclKind::Entity => SchemaTypeKind::Entity,
            DeclKind::Enum(members) => SchemaTypeKind::Enum {
                members: members.clone(),
            },
            DeclKind::TypeDefinition(underlying) => SchemaTypeKind::TypeDefinition {
                underlying: *underlying,
            },
        };

        Ok(SchemaType {
            id,
            namespace,
            name,
            full_name,
            kind,
            base,
            is_abstract: decl.is_abstract,
            properties,
            navigation,
            key: decl.key.clone(),
        })
    }
}

fn wrapped<'t>(text: &'t str, prefix: &str) -> Option<&'t str> {
    text.strip_prefix(prefix)?.strip_suffix(')')
}

fn unknown(name: &str, referenced_by: String) -> SchemaError {
    SchemaError::UnknownType {
        name: name.to_string(),
        referenced_by,
    }
}

// Post-resolution checks: acyclic base chains, keys naming real properties.
fn validate(catalog: &SchemaCatalog) -> Result<(), SchemaError> {
    for ty in &catalog.types {
        let mut next = ty.base;
        let mut steps = 0;

        while let Some(id) = next {
            steps += 1;
            if id == ty.id || steps > catalog.types.len() {
                return Err(SchemaError::InheritanceCycle {
                    type_name: ty.full_name.clone(),
                });
            }
            next = catalog.get(id).base;
        }
    }

    for ty in catalog.types.iter().filter(|ty| ty.declared_key().is_some()) {
        catalog.key_properties(ty.id)?;
    }

    Ok(())
}
