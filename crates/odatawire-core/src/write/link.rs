use crate::{
    RELATED_NAMESPACE,
    error::{ErrorClass, ErrorOrigin, InternalError, NameKind, ResolveError},
    format::ODataWriter,
    model::{NavigationProperty, TypeId},
    payload::{ODataEntityReferenceLink, ODataNavigationLink, ODataValue, literal::key_literal},
    resolve::resolve_member,
    value::{EntityData, HostValue},
    write::{LinkGroup, ReferenceLink, WriteContext},
};

///
/// LinkWriter
///
/// Turns linked instances into reference URIs: `$<id>` for instances
/// created earlier in the batch, otherwise `<collection><key>` made
/// absolute against the base URI.
///

#[derive(Clone, Copy, Debug)]
pub struct LinkWriter<'a> {
    context: WriteContext<'a>,
}

impl<'a> LinkWriter<'a> {
    #[must_use]
    pub const fn new(context: WriteContext<'a>) -> Self {
        Self { context }
    }

    /// Fuzzy lookup of a navigation property declared on `owner` or one of
    /// its ancestors.
    pub fn resolve_navigation(&self, owner: TypeId, name: &str) -> Result<&'a NavigationProperty, ResolveError> {
        let catalog = self.context.catalog;

        resolve_member(
            &self.context.resolver,
            catalog.navigation_properties(owner),
            |n| n.name.as_str(),
            NameKind::Navigation,
            name,
            &catalog.get(owner).full_name,
        )
    }

    #[must_use]
    pub fn navigation_link(&self, navigation: &NavigationProperty) -> ODataNavigationLink {
        let target = &self.context.catalog.get(navigation.target).full_name;

        ODataNavigationLink {
            name: navigation.name.clone(),
            is_collection: navigation.is_collection,
            target_type: target.clone(),
            url: format!("{RELATED_NAMESPACE}{target}"),
        }
    }

    /// Write one navigation link holding the group's reference links.
    /// Placeholders are skipped.
    pub fn write_group(&self, writer: &mut ODataWriter, group: &LinkGroup<'_, '_>) -> Result<(), InternalError> {
        writer.start_navigation_link(&self.navigation_link(group.navigation))?;

        for link in &group.links {
            if let Some(url) = self.reference_url(group.navigation.target, link)? {
                writer.write_entity_reference_link(&ODataEntityReferenceLink { url })?;
            }
        }

        writer.end_navigation_link()
    }

    /// URI of one linked instance of `target`, or `None` for a placeholder.
    pub fn reference_url(&self, target: TypeId, link: &ReferenceLink<'_>) -> Result<Option<String>, InternalError> {
        if let Some(content_id) = link.content_id {
            return Ok(Some(content_id.reference()));
        }

        link.link_data
            .map(|data| self.key_uri(target, data))
            .transpose()
    }

    /// `<collection><key literal>` for an instance of `target`, absolute
    /// against the base URI. Singletons take no key segment.
    pub fn key_uri(&self, target: TypeId, data: &EntityData) -> Result<String, InternalError> {
        let catalog = self.context.catalog;
        let linked = catalog.linked_collection(target)?;
        if linked.is_singleton {
            return self.absolute(linked.name);
        }

        let owner = catalog
            .key_owner(target)
            .unwrap_or_else(|| catalog.get(target));
        let coercer = self.context.coercer();

        let mut parts: Vec<(&str, ODataValue)> = Vec::new();
        for key in catalog.key_properties(target)? {
            let (_, value) = resolve_member(
                &self.context.resolver,
                data.iter(),
                |entry: &(String, HostValue)| entry.0.as_str(),
                NameKind::Key,
                &key.name,
                &owner.full_name,
            )?;
            parts.push((key.name.as_str(), coercer.coerce(&key.type_ref, value)?));
        }

        let literal = key_literal(&parts).ok_or_else(|| {
            InternalError::new(
                ErrorClass::Unsupported,
                ErrorOrigin::Coerce,
                format!("key of {} has no literal form", owner.full_name),
            )
        })?;

        self.absolute(&format!("{}{literal}", linked.name))
    }

    /// Resolve `path` against the configured base URI.
    pub fn absolute(&self, path: &str) -> Result<String, InternalError> {
        self.context
            .base_uri
            .join(path)
            .map(String::from)
            .map_err(|err| {
                InternalError::new(
                    ErrorClass::Unsupported,
                    ErrorOrigin::Format,
                    format!("cannot resolve '{path}' against the base uri: {err}"),
                )
            })
    }
}
