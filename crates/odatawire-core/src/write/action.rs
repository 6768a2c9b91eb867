use crate::{
    error::{CoerceError, InternalError, NameKind, ResolveError, SchemaError},
    format::ODataWriter,
    model::{Operation, OperationParameter, TypeId, TypeKind, TypeRef},
    patch::EntityView,
    payload::ODataValue,
    resolve::resolve_member,
    value::{EntityData, HostValue},
    write::{EntryBuilder, WriteContext},
};

///
/// ActionParameterWriter
///
/// Writes an action body: one parameter scope, each supplied value written
/// under the declared parameter it resolves to.
///

#[derive(Clone, Copy, Debug)]
pub struct ActionParameterWriter<'a> {
    context: WriteContext<'a>,
}

impl<'a> ActionParameterWriter<'a> {
    #[must_use]
    pub const fn new(context: WriteContext<'a>) -> Self {
        Self { context }
    }

    /// Fuzzy lookup among the catalog's actions.
    pub fn resolve_action(&self, name: &str) -> Result<&'a Operation, ResolveError> {
        resolve_member(
            &self.context.resolver,
            self.context.catalog.actions(),
            |op| op.name.as_str(),
            NameKind::Action,
            name,
            "actions",
        )
    }

    pub fn write(
        &self,
        writer: &mut ODataWriter,
        action: &Operation,
        parameters: &EntityData,
    ) -> Result<(), InternalError> {
        writer.start_parameters()?;

        let mut written: Vec<(&OperationParameter, &str)> = Vec::new();
        for (name, value) in parameters {
            let declared = resolve_member(
                &self.context.resolver,
                &action.parameters,
                |p| p.name.as_str(),
                NameKind::Parameter,
                name,
                &action.name,
            )?;

            if let Some((_, earlier)) = written.iter().find(|(p, _)| std::ptr::eq(*p, declared)) {
                return Err(ResolveError::UnresolvableName {
                    kind: NameKind::Parameter,
                    name: declared.name.clone(),
                    owner: action.name.clone(),
                    candidates: vec![(*earlier).to_string(), name.clone()],
                }
                .into());
            }
            written.push((declared, name.as_str()));

            self.write_parameter(writer, declared, value)?;
        }

        writer.end_parameters()
    }

    fn write_parameter(
        &self,
        writer: &mut ODataWriter,
        parameter: &OperationParameter,
        value: &HostValue,
    ) -> Result<(), InternalError> {
        let name = parameter.name.as_str();
        let type_ref = &parameter.type_ref;

        if value.is_null() {
            return writer.write_parameter_value(name, &ODataValue::Null);
        }

        match self.context.catalog.kind_of(type_ref) {
            TypeKind::Primitive
            | TypeKind::TypeDefinition
            | TypeKind::Complex
            | TypeKind::Enum
            | TypeKind::None => {
                let coerced = self.context.coercer().coerce(type_ref, value)?;
                writer.write_parameter_value(name, &coerced)
            }
            TypeKind::Entity => {
                let id = self.entity_id(type_ref)?;

                writer.start_parameter(name)?;
                self.write_entry(writer, id, type_ref, value)?;
                writer.end_parameter()
            }
            TypeKind::Collection => {
                let element = type_ref.element().unwrap_or(&TypeRef::Untyped);
                let items = value
                    .as_list()
                    .ok_or_else(|| self.unsupported(value, type_ref))?;

                writer.start_parameter(name)?;
                if self.context.catalog.kind_of(element) == TypeKind::Entity {
                    let id = self.entity_id(element)?;
                    writer.start_feed()?;
                    for item in items {
                        self.write_entry(writer, id, element, item)?;
                    }
                    writer.end_feed()?;
                } else {
                    let coercer = self.context.coercer();
                    let type_name = self.context.catalog.type_name(type_ref);
                    writer.start_collection(Some(&type_name))?;
                    for item in items {
                        writer.write_item(&coercer.coerce(element, item)?)?;
                    }
                    writer.end_collection()?;
                }
                writer.end_parameter()
            }
            TypeKind::EntityReference | TypeKind::Untyped => Err(self.unsupported_kind(type_ref)),
        }
    }

    fn write_entry(
        &self,
        writer: &mut ODataWriter,
        id: TypeId,
        type_ref: &TypeRef,
        value: &HostValue,
    ) -> Result<(), InternalError> {
        let data = value
            .as_map()
            .ok_or_else(|| self.unsupported(value, type_ref))?;
        let view = EntityView::full(self.context.catalog, id);

        EntryBuilder::new(self.context).write(writer, &view, data)
    }

    fn entity_id(&self, type_ref: &TypeRef) -> Result<TypeId, InternalError> {
        match type_ref {
            TypeRef::Named(id) => Ok(*id),
            _ => Err(self.unsupported_kind(type_ref)),
        }
    }

    fn unsupported(&self, value: &HostValue, type_ref: &TypeRef) -> InternalError {
        CoerceError::unsupported(value.type_label(), self.context.catalog.type_name(type_ref)).into()
    }

    fn unsupported_kind(&self, type_ref: &TypeRef) -> InternalError {
        let catalog = self.context.catalog;

        SchemaError::UnsupportedSchemaKind {
            kind: catalog.kind_of(type_ref),
            element: catalog.type_name(type_ref),
        }
        .into()
    }
}
