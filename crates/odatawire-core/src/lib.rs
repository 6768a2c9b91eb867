//! Request serialization core for OData clients: host values are resolved
//! against a schema catalog, coerced into protocol values and written as
//! entries, reference links or operation parameters, either into a
//! standalone message or into a shared batch.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod batch;
pub mod coerce;
pub mod convert;
pub mod error;
pub mod format;
pub mod message;
pub mod model;
pub mod obs;
pub mod patch;
pub mod payload;
pub mod request;
pub mod value;
pub mod write;

pub(crate) mod resolve;

// test
#[cfg(test)]
pub(crate) mod test_fixtures;

///
/// CONSTANTS
///

/// Relation namespace prefix for navigation link relations.
pub const RELATED_NAMESPACE: &str = "http://docs.oasis-open.org/odata/ns/related/";

/// Upper bound on nested value depth accepted by coercion and entry building.
///
/// Host payloads are trees; this only guards against pathological input.
pub const MAX_VALUE_DEPTH: usize = 64;

///
/// Prelude
///
/// Domain vocabulary only: values, schema, and the request entrypoints.
///

pub mod prelude {
    pub use crate::{
        batch::{BatchCoordinator, BatchWriter, ContentId},
        model::{CatalogBuilder, SchemaCatalog, TypeRef},
        request::{EntryRequest, Method, RequestWriter},
        value::{EntityData, HostValue},
    };
}
