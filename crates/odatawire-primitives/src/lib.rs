//! EDM primitive kinds, host value shapes, and the process-wide table that
//! maps one onto the other.
//!
//! The table is a `const` array generated from a registry macro, so it is
//! immutable, needs no synchronization, and costs nothing to initialize.

#[macro_use]
mod macros;

use derive_more::Display;

///
/// PrimitiveKind
///
/// EDM primitive type kinds understood by the writer.
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[remain::sorted]
pub enum PrimitiveKind {
    Binary,
    Boolean,
    Byte,
    Date,
    DateTimeOffset,
    Decimal,
    Double,
    Duration,
    Geography,
    GeographyCollection,
    GeographyLineString,
    GeographyMultiLineString,
    GeographyMultiPoint,
    GeographyMultiPolygon,
    GeographyPoint,
    GeographyPolygon,
    Geometry,
    GeometryCollection,
    GeometryLineString,
    GeometryMultiLineString,
    GeometryMultiPoint,
    GeometryMultiPolygon,
    GeometryPoint,
    GeometryPolygon,
    Guid,
    Int16,
    Int32,
    Int64,
    SByte,
    Single,
    Stream,
    String,
    TimeOfDay,
}

impl PrimitiveKind {
    /// Return the full metadata descriptor for one primitive kind.
    #[must_use]
    pub const fn metadata(self) -> PrimitiveMetadata {
        primitive_kind_registry!(metadata_from_registry, self)
    }

    /// Qualified EDM name, e.g. `Edm.Int32`.
    #[must_use]
    pub const fn edm_name(self) -> &'static str {
        self.metadata().edm_name
    }

    #[must_use]
    pub const fn family(self) -> PrimitiveFamily {
        self.metadata().family
    }

    /// Return whether values of this kind may appear in an entity key.
    #[must_use]
    pub const fn is_key_type(self) -> bool {
        self.metadata().is_key_type
    }

    #[must_use]
    pub const fn is_spatial(self) -> bool {
        matches!(self.family(), PrimitiveFamily::Spatial)
    }

    #[must_use]
    pub const fn is_geography(self) -> bool {
        matches!(
            self,
            Self::Geography
                | Self::GeographyCollection
                | Self::GeographyLineString
                | Self::GeographyMultiLineString
                | Self::GeographyMultiPoint
                | Self::GeographyMultiPolygon
                | Self::GeographyPoint
                | Self::GeographyPolygon
        )
    }

    /// Parse a qualified (`Edm.Int32`) or bare (`Int32`) primitive name.
    #[must_use]
    pub fn from_edm_name(name: &str) -> Option<Self> {
        let bare = name.strip_prefix("Edm.").unwrap_or(name);

        ALL_PRIMITIVE_KINDS
            .iter()
            .copied()
            .find(|kind| &kind.edm_name()["Edm.".len()..] == bare)
    }
}

///
/// PrimitiveMetadata
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PrimitiveMetadata {
    pub edm_name: &'static str,
    pub family: PrimitiveFamily,
    pub is_key_type: bool,
}

///
/// PrimitiveFamily
///
/// Coarse routing family used by literal formatting and wire backends.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum PrimitiveFamily {
    Numeric,
    Textual,
    Temporal,
    Identifier,
    Binary,
    Bool,
    Spatial,
}

///
/// HostShape
///
/// Host-representable scalar shapes, i.e. the runtime types a caller can
/// hand to the writer for a primitive-typed slot.
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[remain::sorted]
pub enum HostShape {
    Binary,
    Bool,
    Byte,
    Char,
    Date,
    DateTimeOffset,
    Decimal,
    Double,
    Duration,
    Geography,
    GeographyCollection,
    GeographyLineString,
    GeographyMultiLineString,
    GeographyMultiPoint,
    GeographyMultiPolygon,
    GeographyPoint,
    GeographyPolygon,
    Geometry,
    GeometryCollection,
    GeometryLineString,
    GeometryMultiLineString,
    GeometryMultiPoint,
    GeometryMultiPolygon,
    GeometryPoint,
    GeometryPolygon,
    Guid,
    Int16,
    Int32,
    Int64,
    SByte,
    Single,
    Stream,
    Text,
    TimeOfDay,
    UInt16,
    UInt32,
    UInt64,
    Xml,
}

impl HostShape {
    /// Primitive kind this shape maps to in the mapping table.
    #[must_use]
    pub const fn primitive_kind(self) -> PrimitiveKind {
        primitive_mapping_registry!(shape_kind_from_registry, self)
    }

    /// Spatial host shape for a spatial primitive kind.
    #[must_use]
    pub fn spatial(kind: PrimitiveKind) -> Option<Self> {
        if !kind.is_spatial() {
            return None;
        }

        PRIMITIVE_MAPPINGS
            .iter()
            .find(|(_, mapped)| *mapped == kind)
            .map(|(shape, _)| *shape)
    }
}

///
/// CONSTANTS
///

/// Ordered list of all primitive kinds in registry order.
pub const ALL_PRIMITIVE_KINDS: [PrimitiveKind; 33] =
    primitive_kind_registry!(all_kinds_from_registry);

/// The host shape -> primitive kind table, in candidate order.
pub const PRIMITIVE_MAPPINGS: [(HostShape, PrimitiveKind); 38] =
    primitive_mapping_registry!(mapping_table_from_registry);

/// Host shapes that map to `kind`, in table order.
pub fn candidate_shapes(kind: PrimitiveKind) -> impl Iterator<Item = HostShape> {
    PRIMITIVE_MAPPINGS
        .iter()
        .filter(move |(_, mapped)| *mapped == kind)
        .map(|(shape, _)| *shape)
}

///
/// TESTS
///
