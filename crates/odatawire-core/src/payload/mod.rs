//! Protocol-side values: what coercion produces and what the wire backends
//! consume.

pub mod literal;
pub mod text;

use crate::value::{HostValue, SpatialValue};
use base64::{STANDARD, URL_SAFE};
use derive_more::Display;
use odatawire_primitives::PrimitiveKind;
use rust_decimal::Decimal;
use time::{Date, Duration, OffsetDateTime, Time};
use uuid::Uuid;

///
/// PrimitiveValue
///
/// A value already in the representation of one EDM primitive kind.
///

#[derive(Clone, Debug, PartialEq)]
#[remain::sorted]
pub enum PrimitiveValue {
    Binary(Vec<u8>),
    Boolean(bool),
    Byte(u8),
    Date(Date),
    DateTimeOffset(OffsetDateTime),
    Decimal(Decimal),
    Double(f64),
    Duration(Duration),
    Guid(Uuid),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    SByte(i8),
    Single(f32),
    Spatial(SpatialValue),
    Stream(Vec<u8>),
    String(String),
    TimeOfDay(Time),
}

impl PrimitiveValue {
    #[must_use]
    pub const fn kind(&self) -> PrimitiveKind {
        match self {
            Self::Binary(_) => PrimitiveKind::Binary,
            Self::Boolean(_) => PrimitiveKind::Boolean,
            Self::Byte(_) => PrimitiveKind::Byte,
            Self::Date(_) => PrimitiveKind::Date,
            Self::DateTimeOffset(_) => PrimitiveKind::DateTimeOffset,
            Self::Decimal(_) => PrimitiveKind::Decimal,
            Self::Double(_) => PrimitiveKind::Double,
            Self::Duration(_) => PrimitiveKind::Duration,
            Self::Guid(_) => PrimitiveKind::Guid,
            Self::Int16(_) => PrimitiveKind::Int16,
            Self::Int32(_) => PrimitiveKind::Int32,
            Self::Int64(_) => PrimitiveKind::Int64,
            Self::SByte(_) => PrimitiveKind::SByte,
            Self::Single(_) => PrimitiveKind::Single,
            Self::Spatial(spatial) => spatial.kind,
            Self::Stream(_) => PrimitiveKind::Stream,
            Self::String(_) => PrimitiveKind::String,
            Self::TimeOfDay(_) => PrimitiveKind::TimeOfDay,
        }
    }

    /// Read the value back as the host value of its natural shape.
    #[must_use]
    pub fn to_host(&self) -> HostValue {
        match self {
            Self::Binary(v) => HostValue::Binary(v.clone()),
            Self::Boolean(v) => HostValue::Bool(*v),
            Self::Byte(v) => HostValue::Byte(*v),
            Self::Date(v) => HostValue::Date(*v),
            Self::DateTimeOffset(v) => HostValue::DateTimeOffset(*v),
            Self::Decimal(v) => HostValue::Decimal(*v),
            Self::Double(v) => HostValue::Double(*v),
            Self::Duration(v) => HostValue::Duration(*v),
            Self::Guid(v) => HostValue::Guid(*v),
            Self::Int16(v) => HostValue::Int16(*v),
            Self::Int32(v) => HostValue::Int32(*v),
            Self::Int64(v) => HostValue::Int64(*v),
            Self::SByte(v) => HostValue::SByte(*v),
            Self::Single(v) => HostValue::Single(*v),
            Self::Spatial(v) => HostValue::Spatial(v.clone()),
            Self::Stream(v) => HostValue::Stream(v.clone()),
            Self::String(v) => HostValue::Text(v.clone()),
            Self::TimeOfDay(v) => HostValue::TimeOfDay(*v),
        }
    }

    /// Plain text form used inside XML elements.
    #[must_use]
    pub fn to_plain_text(&self) -> String {
        match self {
            Self::Binary(v) | Self::Stream(v) => base64::encode_config(v, STANDARD),
            _ => self.to_json_text(),
        }
    }

    /// Text form used by the JSON backend for values that travel as
    /// JSON strings (and as the basis for numeric JSON literals).
    #[must_use]
    pub fn to_json_text(&self) -> String {
        match self {
            Self::Binary(v) | Self::Stream(v) => base64::encode_config(v, URL_SAFE),
            Self::Boolean(v) => v.to_string(),
            Self::Byte(v) => v.to_string(),
            Self::Date(v) => text::format_date(*v),
            Self::DateTimeOffset(v) => text::format_datetime(*v),
            Self::Decimal(v) => v.normalize().to_string(),
            Self::Double(v) => float_text(*v),
            Self::Duration(v) => text::format_duration(*v),
            Self::Guid(v) => v.hyphenated().to_string(),
            Self::Int16(v) => v.to_string(),
            Self::Int32(v) => v.to_string(),
            Self::Int64(v) => v.to_string(),
            Self::SByte(v) => v.to_string(),
            Self::Single(v) => {
                if v.is_finite() {
                    v.to_string()
                } else {
                    float_text(f64::from(*v))
                }
            }
            Self::Spatial(v) => v.wkt.clone(),
            Self::String(v) => v.clone(),
            Self::TimeOfDay(v) => text::format_time(*v),
        }
    }
}

// OData spells the IEEE specials INF, -INF and NaN.
pub(crate) fn float_text(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        let text = if value.is_sign_negative() { "-INF" } else { "INF" };
        text.to_string()
    } else {
        value.to_string()
    }
}

///
/// ODataValue
///
/// Protocol value tree: the result of coercing one host value against one
/// declared type.
///

#[derive(Clone, Debug, PartialEq)]
#[remain::sorted]
pub enum ODataValue {
    Collection {
        type_name: Option<String>,
        items: Vec<Self>,
    },
    Complex {
        type_name: Option<String>,
        properties: Vec<ODataProperty>,
    },
    Enum {
        type_name: Option<String>,
        value: String,
    },
    Null,
    Primitive(PrimitiveValue),
}

impl ODataValue {
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub const fn as_primitive(&self) -> Option<&PrimitiveValue> {
        match self {
            Self::Primitive(value) => Some(value),
            _ => None,
        }
    }

    /// Look up a property of a complex value by exact name.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Self> {
        match self {
            Self::Complex { properties, .. } => properties
                .iter()
                .find(|p| p.name == name)
                .map(|p| &p.value),
            _ => None,
        }
    }
}

impl From<PrimitiveValue> for ODataValue {
    fn from(value: PrimitiveValue) -> Self {
        Self::Primitive(value)
    }
}

///
/// ODataProperty
///

#[derive(Clone, Debug, Display, PartialEq)]
#[display("{name}")]
pub struct ODataProperty {
    pub name: String,
    pub value: ODataValue,
}

impl ODataProperty {
    pub fn new(name: impl Into<String>, value: ODataValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

///
/// ODataEntry
///
/// One entity instance: qualified type name plus structural properties.
/// Navigation links are written as nested writer scopes, not stored here.
///

#[derive(Clone, Debug, PartialEq)]
pub struct ODataEntry {
    pub type_name: String,
    pub properties: Vec<ODataProperty>,
}

impl ODataEntry {
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&ODataValue> {
        self.properties
            .iter()
            .find(|p| p.name == name)
            .map(|p| &p.value)
    }
}

///
/// ODataNavigationLink
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ODataNavigationLink {
    pub name: String,
    pub is_collection: bool,
    /// Qualified name of the related entity type.
    pub target_type: String,
    /// Relation URL (`<related namespace><target type>`).
    pub url: String,
}

///
/// ODataEntityReferenceLink
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ODataEntityReferenceLink {
    pub url: String,
}

///
/// TESTS
///
