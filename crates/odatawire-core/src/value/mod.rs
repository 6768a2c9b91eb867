//! Host-side values: the loosely typed data a caller hands to the writer.

mod json;

#[cfg(test)]
mod tests;

// re-exports
pub use json::NotAnObject;

use crate::payload::text;
use derive_more::{Deref, IntoIterator};
use odatawire_primitives::{HostShape, PrimitiveKind};
use rust_decimal::Decimal;
use std::fmt;
use time::{Date, Duration, OffsetDateTime, Time};
use uuid::Uuid;

///
/// HostValue
///
/// One host-supplied value. Scalars carry their natural Rust type; maps
/// and lists nest; `Tagged` wraps a value with a semantic type tag for
/// converter lookup.
///

#[derive(Clone, Debug, PartialEq)]
#[remain::sorted]
pub enum HostValue {
    Binary(Vec<u8>),
    Bool(bool),
    Byte(u8),
    Char(char),
    Date(Date),
    DateTimeOffset(OffsetDateTime),
    Decimal(Decimal),
    Double(f64),
    Duration(Duration),
    Enum(HostEnum),
    Guid(Uuid),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    List(Vec<Self>),
    Map(EntityData),
    Null,
    SByte(i8),
    Single(f32),
    Spatial(SpatialValue),
    Stream(Vec<u8>),
    Tagged(TaggedValue),
    Text(String),
    TimeOfDay(Time),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Xml(String),
}

impl HostValue {
    #[must_use]
    pub const fn kind(&self) -> HostKind {
        match self {
            Self::Binary(_) => HostKind::Binary,
            Self::Bool(_) => HostKind::Bool,
            Self::Byte(_) => HostKind::Byte,
            Self::Char(_) => HostKind::Char,
            Self::Date(_) => HostKind::Date,
            Self::DateTimeOffset(_) => HostKind::DateTimeOffset,
            Self::Decimal(_) => HostKind::Decimal,
            Self::Double(_) => HostKind::Double,
            Self::Duration(_) => HostKind::Duration,
            Self::Enum(_) => HostKind::Enum,
            Self::Guid(_) => HostKind::Guid,
            Self::Int16(_) => HostKind::Int16,
            Self::Int32(_) => HostKind::Int32,
            Self::Int64(_) => HostKind::Int64,
            Self::List(_) => HostKind::List,
            Self::Map(_) => HostKind::Map,
            Self::Null => HostKind::Null,
            Self::SByte(_) => HostKind::SByte,
            Self::Single(_) => HostKind::Single,
            Self::Spatial(_) => HostKind::Spatial,
            Self::Stream(_) => HostKind::Stream,
            Self::Tagged(_) => HostKind::Tagged,
            Self::Text(_) => HostKind::Text,
            Self::TimeOfDay(_) => HostKind::TimeOfDay,
            Self::UInt16(_) => HostKind::UInt16,
            Self::UInt32(_) => HostKind::UInt32,
            Self::UInt64(_) => HostKind::UInt64,
            Self::Xml(_) => HostKind::Xml,
        }
    }

    /// Runtime type label: the semantic tag for tagged values, otherwise
    /// the kind label.
    #[must_use]
    pub fn type_label(&self) -> &str {
        match self {
            Self::Tagged(tagged) => &tagged.tag,
            _ => self.kind().label(),
        }
    }

    /// Host shape in the primitive mapping table, if this is a scalar.
    #[must_use]
    pub fn shape(&self) -> Option<HostShape> {
        let shape = match self {
            Self::Binary(_) => HostShape::Binary,
            Self::Bool(_) => HostShape::Bool,
            Self::Byte(_) => HostShape::Byte,
            Self::Char(_) => HostShape::Char,
            Self::Date(_) => HostShape::Date,
            Self::DateTimeOffset(_) => HostShape::DateTimeOffset,
            Self::Decimal(_) => HostShape::Decimal,
            Self::Double(_) => HostShape::Double,
            Self::Duration(_) => HostShape::Duration,
            Self::Guid(_) => HostShape::Guid,
            Self::Int16(_) => HostShape::Int16,
            Self::Int32(_) => HostShape::Int32,
            Self::Int64(_) => HostShape::Int64,
            Self::SByte(_) => HostShape::SByte,
            Self::Single(_) => HostShape::Single,
            Self::Spatial(spatial) => return HostShape::spatial(spatial.kind),
            Self::Stream(_) => HostShape::Stream,
            Self::Text(_) => HostShape::Text,
            Self::TimeOfDay(_) => HostShape::TimeOfDay,
            Self::UInt16(_) => HostShape::UInt16,
            Self::UInt32(_) => HostShape::UInt32,
            Self::UInt64(_) => HostShape::UInt64,
            Self::Xml(_) => HostShape::Xml,
            Self::Enum(_) | Self::List(_) | Self::Map(_) | Self::Null | Self::Tagged(_) => {
                return None;
            }
        };

        Some(shape)
    }

    /// String form of a scalar, as used for enum members and conversions
    /// to `Edm.String`. Structured values and raw bytes have none.
    #[must_use]
    pub fn display_text(&self) -> Option<String> {
        let text = match self {
            Self::Bool(v) => v.to_string(),
            Self::Byte(v) => v.to_string(),
            Self::Char(v) => v.to_string(),
            Self::Date(v) => text::format_date(*v),
            Self::DateTimeOffset(v) => text::format_datetime(*v),
            Self::Decimal(v) => v.to_string(),
            Self::Double(v) => v.to_string(),
            Self::Duration(v) => text::format_duration(*v),
            Self::Enum(v) => v.member.clone(),
            Self::Guid(v) => v.hyphenated().to_string(),
            Self::Int16(v) => v.to_string(),
            Self::Int32(v) => v.to_string(),
            Self::Int64(v) => v.to_string(),
            Self::SByte(v) => v.to_string(),
            Self::Single(v) => v.to_string(),
            Self::Spatial(v) => v.wkt.clone(),
            Self::Tagged(v) => return v.value.display_text(),
            Self::Text(v) | Self::Xml(v) => v.clone(),
            Self::TimeOfDay(v) => text::format_time(*v),
            Self::UInt16(v) => v.to_string(),
            Self::UInt32(v) => v.to_string(),
            Self::UInt64(v) => v.to_string(),
            Self::Binary(_) | Self::List(_) | Self::Map(_) | Self::Null | Self::Stream(_) => {
                return None;
            }
        };

        Some(text)
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub const fn as_map(&self) -> Option<&EntityData> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[Self]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Build an enum value from its member name.
    pub fn enum_member(member: impl Into<String>) -> Self {
        Self::Enum(HostEnum {
            type_name: None,
            member: member.into(),
        })
    }

    /// Wrap a value with a semantic tag for converter lookup.
    pub fn tagged(tag: impl Into<String>, value: impl Into<Self>) -> Self {
        Self::Tagged(TaggedValue {
            tag: tag.into(),
            value: Box::new(value.into()),
        })
    }

    /// Build a spatial value from well-known text.
    pub fn spatial(kind: PrimitiveKind, wkt: impl Into<String>) -> Self {
        Self::Spatial(SpatialValue::new(kind, wkt))
    }
}

///
/// HostKind
///
/// Diagnostic tag for a host value's variant.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[remain::sorted]
pub enum HostKind {
    Binary,
    Bool,
    Byte,
    Char,
    Date,
    DateTimeOffset,
    Decimal,
    Double,
    Duration,
    Enum,
    Guid,
    Int16,
    Int32,
    Int64,
    List,
    Map,
    Null,
    SByte,
    Single,
    Spatial,
    Stream,
    Tagged,
    Text,
    TimeOfDay,
    UInt16,
    UInt32,
    UInt64,
    Xml,
}

impl HostKind {
    /// Stable label for diagnostics and converter keys.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Binary => "Binary",
            Self::Bool => "Bool",
            Self::Byte => "Byte",
            Self::Char => "Char",
            Self::Date => "Date",
            Self::DateTimeOffset => "DateTimeOffset",
            Self::Decimal => "Decimal",
            Self::Double => "Double",
            Self::Duration => "Duration",
            Self::Enum => "Enum",
            Self::Guid => "Guid",
            Self::Int16 => "Int16",
            Self::Int32 => "Int32",
            Self::Int64 => "Int64",
            Self::List => "List",
            Self::Map => "Map",
            Self::Null => "Null",
            Self::SByte => "SByte",
            Self::Single => "Single",
            Self::Spatial => "Spatial",
            Self::Stream => "Stream",
            Self::Tagged => "Tagged",
            Self::Text => "Text",
            Self::TimeOfDay => "TimeOfDay",
            Self::UInt16 => "UInt16",
            Self::UInt32 => "UInt32",
            Self::UInt64 => "UInt64",
            Self::Xml => "Xml",
        }
    }
}

impl fmt::Display for HostKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

///
/// HostEnum
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct HostEnum {
    pub type_name: Option<String>,
    pub member: String,
}

///
/// SpatialValue
///
/// Spatial value carried as well-known text.
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct SpatialValue {
    pub kind: PrimitiveKind,
    pub wkt: String,
}

impl SpatialValue {
    pub fn new(kind: PrimitiveKind, wkt: impl Into<String>) -> Self {
        Self {
            kind,
            wkt: wkt.into(),
        }
    }
}

///
/// TaggedValue
///

#[derive(Clone, Debug, PartialEq)]
pub struct TaggedValue {
    pub tag: String,
    pub value: Box<HostValue>,
}

///
/// EntityData
///
/// Insertion-ordered property bag. Inserting an existing key replaces its
/// value in place.
///

#[derive(Clone, Debug, Default, Deref, IntoIterator, PartialEq)]
pub struct EntityData {
    #[deref]
    #[into_iterator(owned, ref)]
    entries: Vec<(String, HostValue)>,
}

impl EntityData {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Insert a value, returning the previous value under the same key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<HostValue>) -> Option<HostValue> {
        let key = key.into();
        let value = value.into();

        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<HostValue>) -> Self {
        self.insert(key, value);
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&HostValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn remove(&mut self, key: &str) -> Option<HostValue> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;

        Some(self.entries.remove(index).1)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

impl<K: Into<String>, V: Into<HostValue>> FromIterator<(K, V)> for EntityData {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut data = Self::new();
        for (key, value) in iter {
            data.insert(key, value);
        }

        data
    }
}

///
/// CONVERSIONS
///

macro_rules! impl_from_for {
    ( $( $type:ty => $variant:ident ),* $(,)? ) => {
        $(
            impl From<$type> for HostValue {
                fn from(v: $type) -> Self {
                    Self::$variant(v.into())
                }
            }
        )*
    };
}

impl_from_for! {
    bool           => Bool,
    char           => Char,
    Date           => Date,
    Decimal        => Decimal,
    Duration       => Duration,
    EntityData     => Map,
    f32            => Single,
    f64            => Double,
    HostEnum       => Enum,
    i16            => Int16,
    i32            => Int32,
    i64            => Int64,
    i8             => SByte,
    OffsetDateTime => DateTimeOffset,
    SpatialValue   => Spatial,
    String         => Text,
    &str           => Text,
    Time           => TimeOfDay,
    u16            => UInt16,
    u32            => UInt32,
    u64            => UInt64,
    u8             => Byte,
    Uuid           => Guid,
    Vec<u8>        => Binary,
}

impl From<Vec<Self>> for HostValue {
    fn from(vec: Vec<Self>) -> Self {
        Self::List(vec)
    }
}

impl<T: Into<Self>> From<Option<T>> for HostValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}
