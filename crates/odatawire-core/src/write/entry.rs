use crate::{
    batch::ContentId,
    error::{CoerceError, InternalError, NameKind, ResolveError},
    format::ODataWriter,
    model::{NavigationProperty, StructuralProperty},
    patch::{EntityView, ViewMember},
    payload::{ODataEntry, ODataProperty},
    value::{EntityData, HostValue},
    write::{LinkWriter, WriteContext},
};

///
/// ReferenceLink
///
/// One linked instance: its payload, the content-id it was created under
/// earlier in the batch, or neither for an unlink placeholder.
///

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReferenceLink<'d> {
    pub link_data: Option<&'d EntityData>,
    pub content_id: Option<ContentId>,
}

impl ReferenceLink<'_> {
    /// Placeholder carrying no target.
    #[must_use]
    pub const fn placeholder() -> Self {
        Self {
            link_data: None,
            content_id: None,
        }
    }

    #[must_use]
    pub const fn has_target(&self) -> bool {
        self.link_data.is_some() || self.content_id.is_some()
    }
}

///
/// LinkGroup
///

#[derive(Clone, Debug)]
pub struct LinkGroup<'c, 'd> {
    pub navigation: &'c NavigationProperty,
    pub links: Vec<ReferenceLink<'d>>,
}

impl LinkGroup<'_, '_> {
    #[must_use]
    pub fn has_targets(&self) -> bool {
        self.links.iter().any(ReferenceLink::has_target)
    }
}

///
/// EntryDetails
///
/// A payload partitioned against an entity view: resolved structural
/// values in payload order, plus navigation link groups.
///

#[derive(Clone, Debug, Default)]
pub struct EntryDetails<'c, 'd> {
    pub properties: Vec<(&'c StructuralProperty, &'d HostValue)>,
    pub links: Vec<LinkGroup<'c, 'd>>,
}

///
/// EntryBuilder
///

#[derive(Clone, Copy, Debug)]
pub struct EntryBuilder<'a> {
    context: WriteContext<'a>,
}

impl<'a> EntryBuilder<'a> {
    #[must_use]
    pub const fn new(context: WriteContext<'a>) -> Self {
        Self { context }
    }

    /// Partition `data` into structural values and navigation link groups.
    pub fn details<'d>(
        &self,
        view: &EntityView<'a>,
        data: &'d EntityData,
    ) -> Result<EntryDetails<'a, 'd>, InternalError> {
        let owner = view.entity_type().full_name.as_str();
        let resolver = &self.context.resolver;

        let mut details = EntryDetails::default();
        let mut claimed: Vec<(&'a StructuralProperty, &'d str)> = Vec::new();

        for (key, value) in data {
            match view.resolve_key(resolver, key)? {
                ViewMember::Navigation(navigation) => {
                    let links = self.reference_links(navigation, value)?;

                    match details
                        .links
                        .iter_mut()
                        .find(|group| std::ptr::eq(group.navigation, navigation))
                    {
                        Some(group) => group.links.extend(links),
                        None => details.links.push(LinkGroup { navigation, links }),
                    }
                }
                ViewMember::Structural(property) => {
                    // two payload keys folding onto one property
                    if let Some((_, earlier)) = claimed.iter().find(|(p, _)| std::ptr::eq(*p, property)) {
                        return Err(ResolveError::UnresolvableName {
                            kind: NameKind::Property,
                            name: property.name.clone(),
                            owner: owner.to_string(),
                            candidates: vec![(*earlier).to_string(), key.clone()],
                        }
                        .into());
                    }
                    claimed.push((property, key.as_str()));
                    details.properties.push((property, value));
                }
            }
        }

        Ok(details)
    }

    /// Coerce the structural values of `details` into an entry.
    pub fn entry(&self, view: &EntityView<'a>, details: &EntryDetails<'a, '_>) -> Result<ODataEntry, InternalError> {
        let coercer = self.context.coercer();

        let properties = details
            .properties
            .iter()
            .map(|(property, value)| {
                coercer
                    .coerce(&property.type_ref, value)
                    .map(|coerced| ODataProperty::new(property.name.clone(), coerced))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ODataEntry {
            type_name: view.entity_type().full_name.clone(),
            properties,
        })
    }

    /// Write one entry: structural values, then every link group that
    /// carries at least one target.
    pub fn write(&self, writer: &mut ODataWriter, view: &EntityView<'a>, data: &EntityData) -> Result<(), InternalError> {
        let details = self.details(view, data)?;
        let entry = self.entry(view, &details)?;

        writer.start_entry(&entry)?;
        let links = LinkWriter::new(self.context);
        for group in details.links.iter().filter(|group| group.has_targets()) {
            links.write_group(writer, group)?;
        }
        writer.end_entry()?;

        tracing::trace!(
            entity = %entry.type_name,
            properties = entry.properties.len(),
            link_groups = details.links.len(),
            "entry written"
        );

        Ok(())
    }

    fn reference_links<'d>(
        &self,
        navigation: &NavigationProperty,
        value: &'d HostValue,
    ) -> Result<Vec<ReferenceLink<'d>>, InternalError> {
        match value {
            HostValue::Null => Ok(vec![ReferenceLink::placeholder()]),
            HostValue::Map(data) => Ok(vec![self.reference(data)]),
            HostValue::List(items) => items
                .iter()
                .map(|item| match item {
                    HostValue::Null => Ok(ReferenceLink::placeholder()),
                    HostValue::Map(data) => Ok(self.reference(data)),
                    other => Err(self.not_linkable(navigation, other)),
                })
                .collect(),
            other => Err(self.not_linkable(navigation, other)),
        }
    }

    fn reference<'d>(&self, data: &'d EntityData) -> ReferenceLink<'d> {
        ReferenceLink {
            link_data: Some(data),
            content_id: self.context.content_id_for(data),
        }
    }

    fn not_linkable(&self, navigation: &NavigationProperty, value: &HostValue) -> InternalError {
        let target = self.context.catalog.get(navigation.target);

        CoerceError::unsupported(value.type_label(), format!("Ref({})", target.full_name)).into()
    }
}
