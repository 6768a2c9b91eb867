//! TypeCoercer: host value + declared type -> protocol value.

mod primitive;


// re-exports
pub use primitive::coerce_primitive;

use crate::{
    MAX_VALUE_DEPTH,
    convert::ConverterRegistry,
    error::{CoerceError, ErrorClass, ErrorOrigin, InternalError, NameKind, ResolveError, SchemaError},
    model::{SchemaCatalog, SchemaTypeKind, TypeId, TypeRef},
    obs::sink::{self, MetricsEvent},
    payload::{ODataProperty, ODataValue},
    value::HostValue,
};
use odatawire_primitives::PrimitiveKind;
use odatawire_utils::{NameMatch, NameResolver};

///
/// TypeCoercer
///
/// Recursive, side-effect free conversion dispatched on the declared
/// type's kind. Entities are not coercion targets; entry building owns them.
///

#[derive(Clone, Copy, Debug)]
pub struct TypeCoercer<'a> {
    catalog: &'a SchemaCatalog,
    resolver: NameResolver<'a>,
    converters: Option<&'a ConverterRegistry>,
}

impl<'a> TypeCoercer<'a> {
    #[must_use]
    pub const fn new(catalog: &'a SchemaCatalog, resolver: NameResolver<'a>) -> Self {
        Self {
            catalog,
            resolver,
            converters: None,
        }
    }

    #[must_use]
    pub const fn with_converters(mut self, converters: Option<&'a ConverterRegistry>) -> Self {
        self.converters = converters;
        self
    }

    #[must_use]
    pub const fn catalog(&self) -> &'a SchemaCatalog {
        self.catalog
    }

    #[must_use]
    pub const fn resolver(&self) -> &NameResolver<'a> {
        &self.resolver
    }

    /// Coerce `value` to `type_ref`. Null passes through for every kind.
    pub fn coerce(&self, type_ref: &TypeRef, value: &HostValue) -> Result<ODataValue, InternalError> {
        self.coerce_at(type_ref, value, 0)
    }

    fn coerce_at(
        &self,
        type_ref: &TypeRef,
        value: &HostValue,
        depth: usize,
    ) -> Result<ODataValue, InternalError> {
        if depth > MAX_VALUE_DEPTH {
            return Err(too_deep());
        }
        if value.is_null() {
            return Ok(ODataValue::Null);
        }

        let coerced = match type_ref {
            TypeRef::Primitive(kind) => self.primitive(*kind, type_ref, value)?,
            TypeRef::Named(id) => self.named(*id, type_ref, value, depth)?,
            TypeRef::Collection(element) => self.collection(type_ref, element, value, depth)?,
            TypeRef::EntityReference(_) => return Err(self.not_a_target(type_ref)),
            TypeRef::Unresolved(_) => self.custom(type_ref, value)?,
            TypeRef::Untyped => self.infer(value, depth)?,
        };

        sink::record(MetricsEvent::ValueCoerced {
            kind: self.catalog.kind_of(type_ref),
        });

        Ok(coerced)
    }

    fn named(
        &self,
        id: TypeId,
        type_ref: &TypeRef,
        value: &HostValue,
        depth: usize,
    ) -> Result<ODataValue, InternalError> {
        let ty = self.catalog.get(id);

        match &ty.kind {
            SchemaTypeKind::Complex => self.complex(id, type_ref, value, depth),
            SchemaTypeKind::Entity => Err(self.not_a_target(type_ref)),
            SchemaTypeKind::Enum { members } => {
                let text = value
                    .display_text()
                    .ok_or_else(|| self.unsupported(value, type_ref))?;
                // numeric values and flag combinations pass through as written
                let member = self
                    .resolver
                    .best_name(members.iter().map(String::as_str), text.trim())
                    .found()
                    .map_or(text, str::to_string);

                Ok(ODataValue::Enum {
                    type_name: Some(ty.full_name.clone()),
                    value: member,
                })
            }
            SchemaTypeKind::TypeDefinition { underlying } => {
                self.primitive(*underlying, type_ref, value)
            }
        }
    }

    // Declared properties drive the walk; host keys with no declared
    // counterpart are dropped.
    fn complex(
        &self,
        id: TypeId,
        type_ref: &TypeRef,
        value: &HostValue,
        depth: usize,
    ) -> Result<ODataValue, InternalError> {
        let map = value
            .as_map()
            .ok_or_else(|| self.unsupported(value, type_ref))?;
        let ty = self.catalog.get(id);

        let mut properties = Vec::new();
        for declared in self.catalog.structural_properties(id) {
            let host = match self
                .resolver
                .best_match(map, |(key, _)| key.as_str(), &declared.name)
            {
                NameMatch::Found { item, .. } => &item.1,
                NameMatch::Ambiguous { candidates, .. } => {
                    return Err(ResolveError::UnresolvableName {
                        kind: NameKind::Property,
                        name: declared.name.clone(),
                        owner: ty.full_name.clone(),
                        candidates: candidates.iter().map(|(key, _)| key.clone()).collect(),
                    }
                    .into());
                }
                NameMatch::NotFound => continue,
            };

            let coerced = self.coerce_at(&declared.type_ref, host, depth + 1)?;
            properties.push(ODataProperty::new(declared.name.clone(), coerced));
        }

        Ok(ODataValue::Complex {
            type_name: Some(ty.full_name.clone()),
            properties,
        })
    }

    fn collection(
        &self,
        type_ref: &TypeRef,
        element: &TypeRef,
        value: &HostValue,
        depth: usize,
    ) -> Result<ODataValue, InternalError> {
        let items = value
            .as_list()
            .ok_or_else(|| self.unsupported(value, type_ref))?
            .iter()
            .map(|item| self.coerce_at(element, item, depth + 1))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ODataValue::Collection {
            type_name: Some(self.catalog.type_name(type_ref)),
            items,
        })
    }

    // Primitive table first; a registered converter gets the last word.
    fn primitive(
        &self,
        kind: PrimitiveKind,
        type_ref: &TypeRef,
        value: &HostValue,
    ) -> Result<ODataValue, InternalError> {
        if let Some(primitive) = coerce_primitive(kind, value) {
            return Ok(ODataValue::Primitive(primitive));
        }

        self.custom(type_ref, value)
    }

    fn custom(&self, type_ref: &TypeRef, value: &HostValue) -> Result<ODataValue, InternalError> {
        match self.converters.and_then(|registry| registry.convert(value)) {
            Some(result) => result.map_err(InternalError::from),
            None => Err(self.unsupported(value, type_ref)),
        }
    }

    // Untyped slots keep the host value's natural shape.
    fn infer(&self, value: &HostValue, depth: usize) -> Result<ODataValue, InternalError> {
        if depth > MAX_VALUE_DEPTH {
            return Err(too_deep());
        }

        let inferred = match value {
            HostValue::Null => ODataValue::Null,
            HostValue::Enum(member) => ODataValue::Enum {
                type_name: member.type_name.clone(),
                value: member.member.clone(),
            },
            HostValue::List(items) => ODataValue::Collection {
                type_name: None,
                items: items
                    .iter()
                    .map(|item| self.infer(item, depth + 1))
                    .collect::<Result<Vec<_>, _>>()?,
            },
            HostValue::Map(map) => ODataValue::Complex {
                type_name: None,
                properties: map
                    .iter()
                    .map(|(key, item)| {
                        self.infer(item, depth + 1)
                            .map(|value| ODataProperty::new(key.clone(), value))
                    })
                    .collect::<Result<Vec<_>, _>>()?,
            },
            HostValue::Tagged(tagged) => match self.converters.and_then(|r| r.convert(value)) {
                Some(result) => result?,
                None => self.infer(&tagged.value, depth + 1)?,
            },
            scalar => {
                let primitive = scalar
                    .shape()
                    .and_then(|shape| coerce_primitive(shape.primitive_kind(), scalar))
                    .ok_or_else(|| self.unsupported(scalar, &TypeRef::Untyped))?;

                ODataValue::Primitive(primitive)
            }
        };

        Ok(inferred)
    }

    fn unsupported(&self, value: &HostValue, type_ref: &TypeRef) -> InternalError {
        CoerceError::unsupported(value.type_label(), self.catalog.type_name(type_ref)).into()
    }

    fn not_a_target(&self, type_ref: &TypeRef) -> InternalError {
        SchemaError::UnsupportedSchemaKind {
            kind: self.catalog.kind_of(type_ref),
            element: self.catalog.type_name(type_ref),
        }
        .into()
    }
}

fn too_deep() -> InternalError {
    InternalError::new(
        ErrorClass::Unsupported,
        ErrorOrigin::Coerce,
        format!("value nesting exceeds {MAX_VALUE_DEPTH} levels"),
    )
}
