use crate::model::TypeKind;
use std::fmt;
use thiserror::Error as ThisError;

///
/// InternalError
///
/// Structured runtime error with a stable internal classification.
/// Every failure of a write funnels through this type; the typed cause (if
/// any) travels in `detail`.
///

#[derive(Debug, ThisError)]
#[error("{message}")]
pub struct InternalError {
    pub class: ErrorClass,
    pub origin: ErrorOrigin,
    pub message: String,

    /// Optional structured error detail.
    /// The variant (if present) must correspond to `origin`.
    pub detail: Option<ErrorDetail>,
}

impl InternalError {
    /// Construct an InternalError without structured detail.
    pub fn new(class: ErrorClass, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            class,
            origin,
            message: message.into(),
            detail: None,
        }
    }

    /// Construct a writer-origin invariant violation.
    pub(crate) fn writer_invariant(message: impl Into<String>) -> Self {
        Self::new(
            ErrorClass::InvariantViolation,
            ErrorOrigin::Writer,
            message.into(),
        )
    }

    /// Construct a format-origin internal error (backend I/O or encoding).
    pub(crate) fn format_internal(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Internal, ErrorOrigin::Format, message.into())
    }

    /// Construct a message-origin invariant violation.
    pub(crate) fn message_invariant(message: impl Into<String>) -> Self {
        Self::new(
            ErrorClass::InvariantViolation,
            ErrorOrigin::Message,
            message.into(),
        )
    }

    /// Construct a message-origin unsupported error.
    pub(crate) fn message_unsupported(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Unsupported, ErrorOrigin::Message, message.into())
    }

    #[must_use]
    pub const fn is_unresolvable(&self) -> bool {
        matches!(self.class, ErrorClass::Unresolvable)
    }

    #[must_use]
    pub const fn is_unsupported(&self) -> bool {
        matches!(self.class, ErrorClass::Unsupported)
    }

    /// Borrow the unresolvable-name detail, if this error carries one.
    #[must_use]
    pub const fn as_unresolvable(&self) -> Option<&ResolveError> {
        match &self.detail {
            Some(ErrorDetail::Resolve(err)) => Some(err),
            _ => None,
        }
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}:{}: {}", self.origin, self.class, self.message)
    }
}

///
/// ErrorDetail
///
/// Structured, origin-specific error detail carried by [`InternalError`].
///

#[derive(Debug, ThisError)]
#[remain::sorted]
pub enum ErrorDetail {
    #[error("{0}")]
    Batch(BatchError),

    #[error("{0}")]
    Coerce(CoerceError),

    #[error("{0}")]
    Resolve(ResolveError),

    #[error("{0}")]
    Schema(SchemaError),

    #[error("{0}")]
    Writer(WriterError),
}

///
/// NameKind
///
/// Which schema member family a name was resolved against.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[remain::sorted]
pub enum NameKind {
    Action,
    Collection,
    Key,
    Navigation,
    Parameter,
    Property,
}

impl fmt::Display for NameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Action => "action",
            Self::Collection => "collection",
            Self::Key => "key property",
            Self::Navigation => "navigation property",
            Self::Parameter => "parameter",
            Self::Property => "property",
        };
        write!(f, "{label}")
    }
}

///
/// ResolveError
///
/// A host-supplied name had no unique schema match.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ResolveError {
    #[error(
        "{kind} [{name}] not found for [{owner}]{}",
        ambiguity_suffix(.candidates)
    )]
    UnresolvableName {
        kind: NameKind,
        name: String,
        owner: String,
        /// Equally ranked matches; empty when nothing matched at all.
        candidates: Vec<String>,
    },
}

impl ResolveError {
    pub(crate) fn unresolvable(kind: NameKind, name: &str, owner: &str) -> Self {
        Self::UnresolvableName {
            kind,
            name: name.to_string(),
            owner: owner.to_string(),
            candidates: Vec::new(),
        }
    }

    /// Name that failed to resolve.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::UnresolvableName { name, .. } => name,
        }
    }

    #[must_use]
    pub fn owner(&self) -> &str {
        match self {
            Self::UnresolvableName { owner, .. } => owner,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> NameKind {
        match self {
            Self::UnresolvableName { kind, .. } => *kind,
        }
    }

    #[must_use]
    pub const fn is_ambiguous(&self) -> bool {
        match self {
            Self::UnresolvableName { candidates, .. } => !candidates.is_empty(),
        }
    }
}

fn ambiguity_suffix(candidates: &[String]) -> String {
    if candidates.is_empty() {
        String::new()
    } else {
        format!(" (ambiguous between {})", candidates.join(", "))
    }
}

impl From<ResolveError> for InternalError {
    fn from(err: ResolveError) -> Self {
        Self {
            class: ErrorClass::Unresolvable,
            origin: ErrorOrigin::Resolve,
            message: err.to_string(),
            detail: Some(ErrorDetail::Resolve(err)),
        }
    }
}

///
/// CoerceError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum CoerceError {
    #[error("converter for [{tag}] failed: {message}")]
    ConverterFailed { tag: String, message: String },

    #[error("conversion is not supported from type {host} to OData type {target}")]
    UnsupportedConversion { host: String, target: String },
}

impl CoerceError {
    pub(crate) fn unsupported(host: impl Into<String>, target: impl Into<String>) -> Self {
        Self::UnsupportedConversion {
            host: host.into(),
            target: target.into(),
        }
    }
}

impl From<CoerceError> for InternalError {
    fn from(err: CoerceError) -> Self {
        let class = match err {
            CoerceError::ConverterFailed { .. } => ErrorClass::Internal,
            CoerceError::UnsupportedConversion { .. } => ErrorClass::Unsupported,
        };

        Self {
            class,
            origin: ErrorOrigin::Coerce,
            message: err.to_string(),
            detail: Some(ErrorDetail::Coerce(err)),
        }
    }
}

///
/// SchemaError
///
/// Catalog construction failures and schema shapes a write cannot handle.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[remain::sorted]
pub enum SchemaError {
    #[error("inheritance cycle through type [{type_name}]")]
    InheritanceCycle { type_name: String },

    #[error("entity type [{type_name}] has no key on itself or any base type")]
    MissingKey { type_name: String },

    #[error("no entity set or singleton serves entity type [{type_name}]")]
    MissingLinkedCollection { type_name: String },

    #[error("type [{type_name}] declares key property [{property}] which does not exist")]
    UnknownKeyProperty { type_name: String, property: String },

    #[error("unknown type [{name}] referenced by [{referenced_by}]")]
    UnknownType { name: String, referenced_by: String },

    #[error("unable to write [{element}] of a type {kind}")]
    UnsupportedSchemaKind { kind: TypeKind, element: String },
}

impl From<SchemaError> for InternalError {
    fn from(err: SchemaError) -> Self {
        let class = match err {
            SchemaError::UnsupportedSchemaKind { .. } => ErrorClass::Unsupported,
            _ => ErrorClass::InvariantViolation,
        };

        Self {
            class,
            origin: ErrorOrigin::Schema,
            message: err.to_string(),
            detail: Some(ErrorDetail::Schema(err)),
        }
    }
}

///
/// WriterError
///
/// Violations of the nested start/content/end writer protocol.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum WriterError {
    #[error("cannot {action} inside {scope}")]
    InvalidTransition { action: &'static str, scope: String },

    #[error("writer was poisoned by an earlier failure")]
    Poisoned,

    #[error("cannot finish with open scope {scope}")]
    UnclosedScope { scope: String },
}

impl From<WriterError> for InternalError {
    fn from(err: WriterError) -> Self {
        Self {
            class: ErrorClass::InvariantViolation,
            origin: ErrorOrigin::Writer,
            message: err.to_string(),
            detail: Some(ErrorDetail::Writer(err)),
        }
    }
}

///
/// BatchError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum BatchError {
    #[error("body of batch operation {content_id} was already committed")]
    BodyAlreadyCommitted { content_id: u64 },

    #[error("batch operation {content_id} is not registered")]
    UnknownOperation { content_id: u64 },
}

impl From<BatchError> for InternalError {
    fn from(err: BatchError) -> Self {
        Self {
            class: ErrorClass::InvariantViolation,
            origin: ErrorOrigin::Batch,
            message: err.to_string(),
            detail: Some(ErrorDetail::Batch(err)),
        }
    }
}

///
/// ErrorClass
/// Internal error taxonomy for runtime classification.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[remain::sorted]
pub enum ErrorClass {
    Internal,
    InvariantViolation,
    Unresolvable,
    Unsupported,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Internal => "internal",
            Self::InvariantViolation => "invariant_violation",
            Self::Unresolvable => "unresolvable",
            Self::Unsupported => "unsupported",
        };
        write!(f, "{label}")
    }
}

///
/// ErrorOrigin
/// Internal origin taxonomy for runtime classification.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[remain::sorted]
pub enum ErrorOrigin {
    Batch,
    Coerce,
    Format,
    Message,
    Resolve,
    Schema,
    Writer,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Batch => "batch",
            Self::Coerce => "coerce",
            Self::Format => "format",
            Self::Message => "message",
            Self::Resolve => "resolve",
            Self::Schema => "schema",
            Self::Writer => "writer",
        };
        write!(f, "{label}")
    }
}

///
/// TESTS
///
