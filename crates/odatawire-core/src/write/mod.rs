//! Body builders: entries with their navigation links, reference links, and
//! action parameters. Each drives an [`ODataWriter`](crate::format::ODataWriter)
//! and never touches a message directly.

mod action;
mod entry;
mod link;


// re-exports
pub use action::ActionParameterWriter;
pub use entry::{EntryBuilder, EntryDetails, LinkGroup, ReferenceLink};
pub use link::LinkWriter;

use crate::{batch::ContentId, coerce::TypeCoercer, convert::ConverterRegistry, model::SchemaCatalog, value::EntityData};
use odatawire_config::BaseUri;
use odatawire_utils::NameResolver;
use std::fmt;

/// Lookup of a payload created earlier in the same batch.
pub type ContentIdLookup<'a> = &'a (dyn Fn(&EntityData) -> Option<ContentId> + Sync);

///
/// WriteContext
///
/// Everything one write reads and nothing it mutates.
///

#[derive(Clone, Copy)]
pub struct WriteContext<'a> {
    pub catalog: &'a SchemaCatalog,
    pub resolver: NameResolver<'a>,
    pub base_uri: &'a BaseUri,
    pub converters: Option<&'a ConverterRegistry>,
    pub content_ids: Option<ContentIdLookup<'a>>,
}

impl<'a> WriteContext<'a> {
    #[must_use]
    pub const fn new(catalog: &'a SchemaCatalog, resolver: NameResolver<'a>, base_uri: &'a BaseUri) -> Self {
        Self {
            catalog,
            resolver,
            base_uri,
            converters: None,
            content_ids: None,
        }
    }

    #[must_use]
    pub const fn with_converters(mut self, converters: Option<&'a ConverterRegistry>) -> Self {
        self.converters = converters;
        self
    }

    #[must_use]
    pub const fn with_content_ids(mut self, lookup: Option<ContentIdLookup<'a>>) -> Self {
        self.content_ids = lookup;
        self
    }

    #[must_use]
    pub const fn coercer(&self) -> TypeCoercer<'a> {
        TypeCoercer::new(self.catalog, self.resolver).with_converters(self.converters)
    }

    #[must_use]
    pub fn content_id_for(&self, data: &EntityData) -> Option<ContentId> {
        self.content_ids.and_then(|lookup| lookup(data))
    }
}

impl fmt::Debug for WriteContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriteContext")
            .field("base_uri", &self.base_uri.as_str())
            .field("resolver", &self.resolver)
            .field("converters", &self.converters)
            .field("batched", &self.content_ids.is_some())
            .finish_non_exhaustive()
    }
}
