//! ## Crate layout
//! - `config`: writer configuration (payload format, base URI, naming).
//! - `core`: host values, schema catalog, coercion, body builders, wire
//!   backends, batching and the request entrypoints.
//! - `primitives`: EDM primitive kinds and the host-shape mapping table.
//! - `utils`: name homogenization, pluralization and fuzzy resolution.
//! - `error`: the public error type.
//!
//! The `prelude` module mirrors what a client needs to write requests.

pub use odatawire_config as config;
pub use odatawire_core as core;
pub use odatawire_primitives as primitives;
pub use odatawire_utils as utils;

pub mod error;

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use error::{Error, ErrorKind, ErrorOrigin};

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        config::{BaseUri, PayloadFormat, WriterConfig},
        core::{
            batch::{BatchCoordinator, BatchWriter, ContentId},
            convert::ConverterRegistry,
            message::RequestBody,
            model::{CatalogBuilder, SchemaCatalog, TypeRef},
            request::{ActionRequest, EntryRequest, LinkRequest, Method, RequestWriter},
            value::{EntityData, HostValue},
        },
        error::Error,
    };
}
