///
/// Primitive Kind Registry
///
/// One row per EDM primitive kind: (kind, family, is_key_type).
/// The EDM wire name is always `Edm.<kind>`.
///

#[macro_export]
macro_rules! primitive_kind_registry_entries {
    ($macro:ident $(, @args $($args:tt)+ )?) => {
        $macro! {
            $(
                @args $($args)+;
            )?
            @entries
            (Binary, Binary, is_key_type = true),
            (Boolean, Bool, is_key_type = true),
            (Byte, Numeric, is_key_type = true),
            (Date, Temporal, is_key_type = true),
            (DateTimeOffset, Temporal, is_key_type = true),
            (Decimal, Numeric, is_key_type = true),
            (Double, Numeric, is_key_type = false),
            (Duration, Temporal, is_key_type = true),
            (Geography, Spatial, is_key_type = false),
            (GeographyCollection, Spatial, is_key_type = false),
            (GeographyLineString, Spatial, is_key_type = false),
            (GeographyMultiLineString, Spatial, is_key_type = false),
            (GeographyMultiPoint, Spatial, is_key_type = false),
            (GeographyMultiPolygon, Spatial, is_key_type = false),
            (GeographyPoint, Spatial, is_key_type = false),
            (GeographyPolygon, Spatial, is_key_type = false),
            (Geometry, Spatial, is_key_type = false),
            (GeometryCollection, Spatial, is_key_type = false),
            (GeometryLineString, Spatial, is_key_type = false),
            (GeometryMultiLineString, Spatial, is_key_type = false),
            (GeometryMultiPoint, Spatial, is_key_type = false),
            (GeometryMultiPolygon, Spatial, is_key_type = false),
            (GeometryPoint, Spatial, is_key_type = false),
            (GeometryPolygon, Spatial, is_key_type = false),
            (Guid, Identifier, is_key_type = true),
            (Int16, Numeric, is_key_type = true),
            (Int32, Numeric, is_key_type = true),
            (Int64, Numeric, is_key_type = true),
            (SByte, Numeric, is_key_type = true),
            (Single, Numeric, is_key_type = false),
            (Stream, Binary, is_key_type = false),
            (String, Textual, is_key_type = true),
            (TimeOfDay, Temporal, is_key_type = true),
        }
    };
}

#[macro_export]
macro_rules! primitive_kind_registry {
    ($macro:ident) => {
        $crate::primitive_kind_registry_entries!($macro)
    };
    ($macro:ident, $($args:tt)+) => {
        $crate::primitive_kind_registry_entries!($macro, @args $($args)+)
    };
}

///
/// Primitive Mapping Registry
///
/// Ordered (host shape -> primitive kind) table.
/// Row order is significant: coercion tries candidate shapes in this order.
///

#[macro_export]
macro_rules! primitive_mapping_registry_entries {
    ($macro:ident $(, @args $($args:tt)+ )?) => {
        $macro! {
            $(
                @args $($args)+;
            )?
            @entries
            (Text, String),
            (Bool, Boolean),
            (Byte, Byte),
            (Decimal, Decimal),
            (Double, Double),
            (Guid, Guid),
            (Int16, Int16),
            (Int32, Int32),
            (Int64, Int64),
            (SByte, SByte),
            (Single, Single),
            (Binary, Binary),
            (Stream, Stream),
            (Geography, Geography),
            (GeographyPoint, GeographyPoint),
            (GeographyLineString, GeographyLineString),
            (GeographyPolygon, GeographyPolygon),
            (GeographyCollection, GeographyCollection),
            (GeographyMultiLineString, GeographyMultiLineString),
            (GeographyMultiPoint, GeographyMultiPoint),
            (GeographyMultiPolygon, GeographyMultiPolygon),
            (Geometry, Geometry),
            (GeometryPoint, GeometryPoint),
            (GeometryLineString, GeometryLineString),
            (GeometryPolygon, GeometryPolygon),
            (GeometryCollection, GeometryCollection),
            (GeometryMultiLineString, GeometryMultiLineString),
            (GeometryMultiPoint, GeometryMultiPoint),
            (GeometryMultiPolygon, GeometryMultiPolygon),
            (DateTimeOffset, DateTimeOffset),
            (Duration, Duration),
            (Date, Date),
            (TimeOfDay, TimeOfDay),
            (Xml, String),
            (UInt16, Int32),
            (UInt32, Int64),
            (UInt64, Int64),
            (Char, String),
        }
    };
}

#[macro_export]
macro_rules! primitive_mapping_registry {
    ($macro:ident) => {
        $crate::primitive_mapping_registry_entries!($macro)
    };
    ($macro:ident, $($args:tt)+) => {
        $crate::primitive_mapping_registry_entries!($macro, @args $($args)+)
    };
}

macro_rules! metadata_from_registry {
    ( @args $kind:expr; @entries $( ($primitive:ident, $family:ident, is_key_type = $is_key_type:expr) ),* $(,)? ) => {
        match $kind {
            $(
                $crate::PrimitiveKind::$primitive => $crate::PrimitiveMetadata {
                    edm_name: concat!("Edm.", stringify!($primitive)),
                    family: $crate::PrimitiveFamily::$family,
                    is_key_type: $is_key_type,
                },
            )*
        }
    };
}

macro_rules! all_kinds_from_registry {
    ( @entries $( ($primitive:ident, $family:ident, is_key_type = $is_key_type:expr) ),* $(,)? ) => {
        [ $( $crate::PrimitiveKind::$primitive ),* ]
    };
}

macro_rules! mapping_table_from_registry {
    ( @entries $( ($shape:ident, $primitive:ident) ),* $(,)? ) => {
        [ $( ($crate::HostShape::$shape, $crate::PrimitiveKind::$primitive) ),* ]
    };
}

// A host shape may appear only once in the mapping table, so the first
// matching row is its natural kind.
macro_rules! shape_kind_from_registry {
    ( @args $shape:expr; @entries $( ($host:ident, $primitive:ident) ),* $(,)? ) => {
        match $shape {
            $( $crate::HostShape::$host => $crate::PrimitiveKind::$primitive, )*
        }
    };
}
