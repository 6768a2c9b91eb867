use derive_more::Display;
use odatawire_config::ConfigError;
use odatawire_core::error::{
    ErrorClass, ErrorOrigin as CoreErrorOrigin, InternalError, SchemaError,
};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

///
/// Error
/// Public error type with a stable kind + origin taxonomy.
///

#[derive(Debug, Deserialize, Serialize, ThisError)]
#[error("{message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            kind,
            origin,
            message: message.into(),
        }
    }
}

impl From<InternalError> for Error {
    fn from(err: InternalError) -> Self {
        let kind = match err.class {
            ErrorClass::Unresolvable => ErrorKind::Write(WriteErrorKind::Unresolvable),
            ErrorClass::Unsupported => ErrorKind::Write(WriteErrorKind::Unsupported),
            ErrorClass::InvariantViolation => ErrorKind::Write(WriteErrorKind::InvalidState),
            ErrorClass::Internal => ErrorKind::Internal,
        };

        Self::new(kind, err.origin.into(), err.message)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::new(ErrorKind::Config, ErrorOrigin::Config, err.to_string())
    }
}

impl From<SchemaError> for Error {
    fn from(err: SchemaError) -> Self {
        Self::new(ErrorKind::Schema, ErrorOrigin::Schema, err.to_string())
    }
}

///
/// ErrorKind
/// Public error taxonomy for callers.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum ErrorKind {
    /// Configuration could not be read or validated.
    Config,

    /// The schema catalog is malformed.
    Schema,

    Write(WriteErrorKind),

    /// The caller cannot remediate this.
    Internal,
}

///
/// WriteErrorKind
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum WriteErrorKind {
    /// A payload, key, parameter or container name matched nothing, or
    /// matched several members equally well.
    Unresolvable,

    /// A value or schema kind has no wire form.
    Unsupported,

    /// Writer or message protocol misuse.
    InvalidState,
}

///
/// ErrorOrigin
/// Public origin taxonomy.
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
#[remain::sorted]
pub enum ErrorOrigin {
    Batch,
    Coerce,
    Config,
    Format,
    Message,
    Resolve,
    Schema,
    Writer,
}

impl From<CoreErrorOrigin> for ErrorOrigin {
    fn from(origin: CoreErrorOrigin) -> Self {
        match origin {
            CoreErrorOrigin::Batch => Self::Batch,
            CoreErrorOrigin::Coerce => Self::Coerce,
            CoreErrorOrigin::Format => Self::Format,
            CoreErrorOrigin::Message => Self::Message,
            CoreErrorOrigin::Resolve => Self::Resolve,
            CoreErrorOrigin::Schema => Self::Schema,
            CoreErrorOrigin::Writer => Self::Writer,
        }
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::*;

    fn catalog() -> SchemaCatalog {
        let mut builder = CatalogBuilder::new("Shop");
        builder
            .entity_type("Product")
            .key(&["Id"])
            .property("Id", "Edm.Int32")
            .property("Name", "Edm.String");
        builder.entity_set("Products", "Product");

        builder.build().expect("catalog builds")
    }

    #[tokio::test]
    async fn write_failures_keep_their_class_and_origin() {
        let catalog = catalog();
        let config = WriterConfig::default();
        let writer = RequestWriter::new(&catalog, &config);
        let data = EntityData::new().with("Colour", "red");

        let err: Error = writer
            .write_entry(EntryRequest {
                method: Method::Post,
                collection: "Products",
                command_text: "Products",
                entry_data: &data,
                result_required: false,
            })
            .await
            .unwrap_err()
            .into();

        assert_eq!(err.kind, ErrorKind::Write(WriteErrorKind::Unresolvable));
        assert_eq!(err.origin, ErrorOrigin::Resolve);
        assert!(err.message.contains("Colour"));
    }

    #[test]
    fn schema_failures_map_to_schema_kind() {
        let mut builder = CatalogBuilder::new("Shop");
        builder.entity_type("Orphan").base("Missing");

        let err: Error = builder.build().unwrap_err().into();

        assert_eq!(err.kind, ErrorKind::Schema);
        assert_eq!(err.origin.to_string(), "Schema");
    }

    #[test]
    fn config_failures_map_to_config_kind() {
        let err: Error = WriterConfig::from_toml_str("base_uri = \"not a uri\"")
            .unwrap_err()
            .into();

        assert_eq!(err.kind, ErrorKind::Config);
        assert_eq!(err.origin, ErrorOrigin::Config);
    }

    #[test]
    fn errors_serialize_with_their_taxonomy() {
        let err = Error::new(
            ErrorKind::Write(WriteErrorKind::Unsupported),
            ErrorOrigin::Coerce,
            "no",
        );

        let json = serde_json::to_value(&err).unwrap();

        assert_eq!(json["kind"], serde_json::json!({ "Write": "Unsupported" }));
        assert_eq!(json["origin"], "Coerce");
    }
}
