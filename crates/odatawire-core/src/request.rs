//! Orchestrator: the four write entrypoints.
//!
//! Every entrypoint renders its body completely before any message is
//! touched. A failed build therefore never registers a batch operation or
//! commits a partial body.

use crate::{
    batch::{BatchCoordinator, BatchWriter, OperationRequest},
    convert::ConverterRegistry,
    error::{InternalError, NameKind, ResolveError},
    format::ODataWriter,
    message::{ODataRequestMessage, RequestBody, RequestMessage},
    model::{SchemaCatalog, TypeId},
    obs::sink::{Span, WriteKind},
    patch::EntityView,
    payload::ODataEntityReferenceLink,
    resolve::{lookup_member, resolver_for},
    value::EntityData,
    write::{ActionParameterWriter, ContentIdLookup, EntryBuilder, LinkWriter, WriteContext},
};
use derive_more::Display;
use odatawire_config::WriterConfig;
use odatawire_utils::NameResolver;

///
/// Method
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
#[remain::sorted]
pub enum Method {
    #[display("DELETE")]
    Delete,
    #[display("GET")]
    Get,
    #[display("PATCH")]
    Patch,
    #[display("POST")]
    Post,
    #[display("PUT")]
    Put,
}

impl Method {
    /// Whether entry writes with this verb carry a body.
    #[must_use]
    pub const fn has_entry_body(self) -> bool {
        !matches!(self, Self::Get | Self::Delete)
    }

    /// Create, replace and update verbs.
    #[must_use]
    pub const fn is_mutating(self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch)
    }
}

///
/// EntryRequest
///

#[derive(Clone, Copy, Debug)]
pub struct EntryRequest<'d> {
    pub method: Method,
    /// Entity set, singleton or entity type name.
    pub collection: &'d str,
    /// Pre-built request path and query.
    pub command_text: &'d str,
    pub entry_data: &'d EntityData,
    pub result_required: bool,
}

///
/// LinkRequest
///

#[derive(Clone, Copy, Debug)]
pub struct LinkRequest<'d> {
    pub method: Method,
    /// Path of the source entity, e.g. `Customers(1)`.
    pub entity_path: &'d str,
    pub navigation: &'d str,
    /// Identifier of the linked entity, relative to the base URI.
    pub link_ident: &'d str,
}

///
/// ActionRequest
///

#[derive(Clone, Copy, Debug)]
pub struct ActionRequest<'d> {
    pub action: &'d str,
    pub command_text: &'d str,
    pub parameters: &'d EntityData,
    pub result_required: bool,
}

///
/// RequestWriter
///
/// Entry point of a write. Standalone writers return the finished request
/// body; batched writers hand every body to the coordinator and return
/// nothing.
///

#[derive(Clone, Copy, Debug)]
pub struct RequestWriter<'a, B = BatchWriter> {
    catalog: &'a SchemaCatalog,
    config: &'a WriterConfig,
    resolver: NameResolver<'static>,
    converters: Option<&'a ConverterRegistry>,
    batch: Option<&'a B>,
}

impl<'a> RequestWriter<'a, BatchWriter> {
    #[must_use]
    pub fn new(catalog: &'a SchemaCatalog, config: &'a WriterConfig) -> Self {
        Self {
            catalog,
            config,
            resolver: resolver_for(config),
            converters: None,
            batch: None,
        }
    }
}

impl<'a, B: BatchCoordinator> RequestWriter<'a, B> {
    #[must_use]
    pub fn batched(catalog: &'a SchemaCatalog, config: &'a WriterConfig, batch: &'a B) -> Self {
        Self {
            catalog,
            config,
            resolver: resolver_for(config),
            converters: None,
            batch: Some(batch),
        }
    }

    #[must_use]
    pub const fn with_converters(mut self, converters: &'a ConverterRegistry) -> Self {
        self.converters = Some(converters);
        self
    }

    #[must_use]
    pub const fn is_batch(&self) -> bool {
        self.batch.is_some()
    }

    /// Create, replace, update, read or delete one entity.
    ///
    /// GET and DELETE never carry a body. PATCH declares only the members
    /// present in the payload.
    pub async fn write_entry(&self, request: EntryRequest<'_>) -> Result<Option<RequestBody>, InternalError> {
        let mut span = Span::new(WriteKind::Entry, request.collection, self.is_batch());
        tracing::debug!(
            method = %request.method,
            collection = request.collection,
            batch = self.is_batch(),
            "write entry"
        );

        let operation = OperationRequest {
            method: request.method,
            uri: request.command_text.to_string(),
            collection: Some(request.collection.to_string()),
            entry_data: request
                .method
                .has_entry_body()
                .then(|| request.entry_data.clone()),
            result_required: request.result_required,
        };

        if !request.method.has_entry_body() {
            let result = self.commit(operation, &[], None).await?;
            span.succeed();

            return Ok(result);
        }

        let body = self.render_entry(&request)?;
        span.set_bytes(body.len() as u64);

        let headers = [
            ("Content-Type", self.config.payload_format.content_type()),
            ("Prefer", prefer_header(request.result_required)),
        ];
        let result = self.commit(operation, &headers, Some(body)).await?;
        span.succeed();

        Ok(result)
    }

    /// Add or remove one relationship through its `$ref` path.
    ///
    /// POST and PUT carry the linked entity's absolute id as a reference
    /// link body; DELETE names it in the query instead.
    pub async fn write_link(&self, request: LinkRequest<'_>) -> Result<Option<RequestBody>, InternalError> {
        let mut span = Span::new(WriteKind::Link, request.navigation, self.is_batch());
        tracing::debug!(
            method = %request.method,
            entity = request.entity_path,
            navigation = request.navigation,
            batch = self.is_batch(),
            "write link"
        );
        let links = LinkWriter::new(self.context(None));
        let target = links.absolute(request.link_ident)?;

        let (uri, body) = match request.method {
            Method::Post | Method::Put => {
                let mut writer = ODataWriter::for_config(self.config);
                writer.write_entity_reference_link(&ODataEntityReferenceLink { url: target })?;
                let body = writer.finish()?;

                (format_link_path(request.entity_path, request.navigation, None), Some(body))
            }
            Method::Delete => (
                format_link_path(request.entity_path, request.navigation, Some(&target)),
                None,
            ),
            Method::Get | Method::Patch => (
                format_link_path(request.entity_path, request.navigation, None),
                None,
            ),
        };

        let operation = OperationRequest {
            method: request.method,
            uri,
            collection: None,
            entry_data: None,
            result_required: false,
        };
        let content_type = [("Content-Type", self.config.payload_format.parameters_content_type())];
        let headers: &[(&str, &str)] = if body.is_some() { &content_type } else { &[] };

        if let Some(body) = &body {
            span.set_bytes(body.len() as u64);
        }
        let result = self.commit(operation, headers, body).await?;
        span.succeed();

        Ok(result)
    }

    /// Invoke a function. Functions never carry a body; in batch mode the
    /// operation is registered with its result required.
    pub async fn write_function(&self, command_text: &str) -> Result<Option<RequestBody>, InternalError> {
        let mut span = Span::new(WriteKind::Function, command_text, self.is_batch());
        tracing::debug!(command = command_text, batch = self.is_batch(), "write function");

        let operation = OperationRequest {
            method: Method::Get,
            uri: command_text.to_string(),
            collection: None,
            entry_data: None,
            result_required: true,
        };
        let result = self.commit(operation, &[], None).await?;
        span.succeed();

        Ok(result)
    }

    /// Invoke an action with its parameters as the body.
    pub async fn write_action(&self, request: ActionRequest<'_>) -> Result<Option<RequestBody>, InternalError> {
        let mut span = Span::new(WriteKind::Action, request.action, self.is_batch());
        tracing::debug!(action = request.action, batch = self.is_batch(), "write action");

        let body = self.render_action(&request)?;
        span.set_bytes(body.len() as u64);

        let operation = OperationRequest {
            method: Method::Post,
            uri: request.command_text.to_string(),
            collection: None,
            entry_data: None,
            result_required: request.result_required,
        };
        let headers = [(
            "Content-Type",
            self.config.payload_format.parameters_content_type(),
        )];
        let result = self.commit(operation, &headers, Some(body)).await?;
        span.succeed();

        Ok(result)
    }

    /// Entity type behind an entity set, a singleton, or an entity type
    /// name, in that order.
    pub fn resolve_entity(&self, collection: &str) -> Result<TypeId, ResolveError> {
        let catalog = self.catalog;
        let containers: Vec<(&str, TypeId)> = catalog
            .entity_sets()
            .iter()
            .map(|set| (set.name.as_str(), set.entity_type))
            .chain(
                catalog
                    .singletons()
                    .iter()
                    .map(|singleton| (singleton.name.as_str(), singleton.entity_type)),
            )
            .collect();

        if let Some((_, id)) = lookup_member(
            &self.resolver,
            &containers,
            |entry| entry.0,
            NameKind::Collection,
            collection,
            "container",
        )? {
            return Ok(*id);
        }

        let entity_types = catalog.types().iter().filter(|ty| ty.is_entity());
        let by_full_name = lookup_member(
            &self.resolver,
            entity_types.clone(),
            |ty| ty.full_name.as_str(),
            NameKind::Collection,
            collection,
            "container",
        )?;
        if let Some(ty) = by_full_name {
            return Ok(ty.id);
        }

        lookup_member(
            &self.resolver,
            entity_types,
            |ty| ty.name.as_str(),
            NameKind::Collection,
            collection,
            "container",
        )?
        .map(|ty| ty.id)
        .ok_or_else(|| ResolveError::unresolvable(NameKind::Collection, collection, "container"))
    }

    fn context<'l>(&self, content_ids: Option<ContentIdLookup<'l>>) -> WriteContext<'l>
    where
        'a: 'l,
    {
        WriteContext::new(self.catalog, self.resolver, &self.config.base_uri)
            .with_converters(self.converters)
            .with_content_ids(content_ids)
    }

    fn render_entry(&self, request: &EntryRequest<'_>) -> Result<Vec<u8>, InternalError> {
        let entity = self.resolve_entity(request.collection)?;
        let data = request.entry_data;

        let view = if request.method == Method::Patch {
            EntityView::narrowed(self.catalog, entity, data, &self.resolver)?
        } else {
            EntityView::full(self.catalog, entity)
        };

        let batch = self.batch;
        let lookup = move |linked: &EntityData| batch.and_then(|batch| batch.content_id_for(linked));
        let content_ids = if batch.is_some() {
            Some(&lookup as ContentIdLookup<'_>)
        } else {
            None
        };
        let context = self.context(content_ids);

        let mut writer = ODataWriter::for_config(self.config);
        EntryBuilder::new(context).write(&mut writer, &view, data)?;

        writer.finish()
    }

    fn render_action(&self, request: &ActionRequest<'_>) -> Result<Vec<u8>, InternalError> {
        let parameters = ActionParameterWriter::new(self.context(None));
        let action = parameters.resolve_action(request.action)?;

        let mut writer = ODataWriter::for_config(self.config);
        parameters.write(&mut writer, action, request.parameters)?;

        writer.finish()
    }

    // Batch: register the operation and hand it the body, return nothing.
    // Standalone: return the committed body, if there is one.
    async fn commit(
        &self,
        operation: OperationRequest,
        headers: &[(&str, &str)],
        body: Option<Vec<u8>>,
    ) -> Result<Option<RequestBody>, InternalError> {
        if let Some(batch) = self.batch {
            let mut message = batch.create_operation_message(operation).await?;
            for (name, value) in headers {
                message.set_header(name, value);
            }
            if let Some(body) = body {
                message.commit_body(body).await?;
            }

            return Ok(None);
        }

        let Some(body) = body else {
            tracing::trace!(method = %operation.method, uri = %operation.uri, "bodyless request");
            return Ok(None);
        };

        let mut message = ODataRequestMessage::new();
        for (name, value) in headers {
            message.set_header(name, value);
        }
        message.commit_body(body).await?;

        message.into_body().map(Some)
    }
}

/// `<entity>/<navProp>/$ref`, optionally suffixed `?$id=<linkIdent>`.
#[must_use]
pub fn format_link_path(entity: &str, navigation: &str, link_ident: Option<&str>) -> String {
    let entity = entity.trim_end_matches('/');

    match link_ident {
        Some(ident) => format!("{entity}/{navigation}/$ref?$id={ident}"),
        None => format!("{entity}/{navigation}/$ref"),
    }
}

/// Representation preference for mutating entry writes.
#[must_use]
pub const fn prefer_header(result_required: bool) -> &'static str {
    if result_required {
        "return=representation"
    } else {
        "return=minimal"
    }
}

///
/// TESTS
///
