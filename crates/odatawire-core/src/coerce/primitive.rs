//! Primitive coercion over the host shape table.
//!
//! A value whose shape is already a candidate for the declared kind passes
//! straight through; otherwise the kind's candidate shapes are tried in
//! table order and the first successful conversion wins.

use crate::{
    payload::{PrimitiveValue, text},
    value::{HostValue, SpatialValue},
};
use odatawire_primitives::{HostShape, PrimitiveKind, candidate_shapes};
use rust_decimal::{
    Decimal,
    prelude::{FromPrimitive, ToPrimitive},
};
use std::str::FromStr;
use uuid::Uuid;

/// Coerce a host value into the representation of `kind`.
#[must_use]
pub fn coerce_primitive(kind: PrimitiveKind, value: &HostValue) -> Option<PrimitiveValue> {
    let value = untag(value);

    if let Some(encoded) = encode(kind, value) {
        return Some(encoded);
    }

    candidate_shapes(kind).find_map(|shape| {
        convert(value, shape).and_then(|converted| encode(kind, &converted))
    })
}

// Tags are semantic labels over a plain value.
fn untag(mut value: &HostValue) -> &HostValue {
    while let HostValue::Tagged(tagged) = value {
        value = &tagged.value;
    }

    value
}

// Accepts exactly the values whose shape is a candidate for `kind`.
fn encode(kind: PrimitiveKind, value: &HostValue) -> Option<PrimitiveValue> {
    use HostValue as H;
    use PrimitiveKind as K;
    use PrimitiveValue as P;

    let encoded = match (kind, value) {
        (K::Binary, H::Binary(v)) => P::Binary(v.clone()),
        (K::Boolean, H::Bool(v)) => P::Boolean(*v),
        (K::Byte, H::Byte(v)) => P::Byte(*v),
        (K::Date, H::Date(v)) => P::Date(*v),
        (K::DateTimeOffset, H::DateTimeOffset(v)) => P::DateTimeOffset(*v),
        (K::Decimal, H::Decimal(v)) => P::Decimal(*v),
        (K::Double, H::Double(v)) => P::Double(*v),
        (K::Duration, H::Duration(v)) => P::Duration(*v),
        (K::Guid, H::Guid(v)) => P::Guid(*v),
        (K::Int16, H::Int16(v)) => P::Int16(*v),
        (K::Int32, H::Int32(v)) => P::Int32(*v),
        (K::Int32, H::UInt16(v)) => P::Int32(i32::from(*v)),
        (K::Int64, H::Int64(v)) => P::Int64(*v),
        (K::Int64, H::UInt32(v)) => P::Int64(i64::from(*v)),
        (K::Int64, H::UInt64(v)) => P::Int64(i64::try_from(*v).ok()?),
        (K::SByte, H::SByte(v)) => P::SByte(*v),
        (K::Single, H::Single(v)) => P::Single(*v),
        (K::Stream, H::Stream(v)) => P::Stream(v.clone()),
        (K::String, H::Text(v) | H::Xml(v)) => P::String(v.clone()),
        (K::String, H::Char(v)) => P::String(v.to_string()),
        (K::TimeOfDay, H::TimeOfDay(v)) => P::TimeOfDay(*v),
        (kind, H::Spatial(v)) if spatial_fits(kind, v.kind) => P::Spatial(v.clone()),
        _ => return None,
    };

    Some(encoded)
}

// A specific spatial value fits its own kind or the abstract root of its
// family.
fn spatial_fits(declared: PrimitiveKind, actual: PrimitiveKind) -> bool {
    if !declared.is_spatial() || !actual.is_spatial() {
        return false;
    }
    if declared == actual {
        return true;
    }

    match declared {
        PrimitiveKind::Geography => actual.is_geography(),
        PrimitiveKind::Geometry => !actual.is_geography(),
        _ => false,
    }
}

// Convert a value into the host shape `shape`, if that is lossless.
fn convert(value: &HostValue, shape: HostShape) -> Option<HostValue> {
    use HostShape as S;
    use HostValue as H;

    let converted = match shape {
        S::Text => H::Text(value.display_text()?),
        S::Char => {
            let text = as_text(value)?;
            let mut chars = text.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => H::Char(c),
                _ => return None,
            }
        }
        S::Xml => return None,
        S::Bool => H::Bool(parse_bool(as_text(value)?)?),
        S::Byte => H::Byte(u8::try_from(number(value)?.to_int()?).ok()?),
        S::SByte => H::SByte(i8::try_from(number(value)?.to_int()?).ok()?),
        S::Int16 => H::Int16(i16::try_from(number(value)?.to_int()?).ok()?),
        S::Int32 => H::Int32(i32::try_from(number(value)?.to_int()?).ok()?),
        S::Int64 => H::Int64(i64::try_from(number(value)?.to_int()?).ok()?),
        S::UInt16 => H::UInt16(u16::try_from(number(value)?.to_int()?).ok()?),
        S::UInt32 => H::UInt32(u32::try_from(number(value)?.to_int()?).ok()?),
        S::UInt64 => H::UInt64(u64::try_from(number(value)?.to_int()?).ok()?),
        S::Decimal => H::Decimal(number(value)?.to_decimal()?),
        S::Double => H::Double(number(value)?.to_f64()?),
        S::Single => H::Single(number(value)?.to_f32()?),
        S::Guid => H::Guid(Uuid::parse_str(as_text(value)?.trim()).ok()?),
        S::Date => H::Date(text::parse_date(as_text(value)?)?),
        S::DateTimeOffset => match value {
            H::Date(date) => H::DateTimeOffset(date.midnight().assume_utc()),
            _ => H::DateTimeOffset(text::parse_datetime(as_text(value)?)?),
        },
        S::Duration => H::Duration(text::parse_duration(as_text(value)?)?),
        S::TimeOfDay => H::TimeOfDay(text::parse_time(as_text(value)?)?),
        S::Binary => match value {
            H::Stream(bytes) => H::Binary(bytes.clone()),
            _ => return None,
        },
        S::Stream => match value {
            H::Binary(bytes) => H::Stream(bytes.clone()),
            _ => return None,
        },
        spatial => H::Spatial(SpatialValue::new(
            spatial.primitive_kind(),
            as_text(value)?.trim(),
        )),
    };

    Some(converted)
}

fn as_text(value: &HostValue) -> Option<&str> {
    match value {
        HostValue::Text(text) | HostValue::Xml(text) => Some(text),
        _ => None,
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    let text = text.trim();

    if text.eq_ignore_ascii_case("true") {
        Some(true)
    } else if text.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

///
/// Number
///
/// Widest lossless reading of a numeric host value.
///

#[derive(Clone, Copy, Debug)]
enum Number {
    Int(i128),
    Float(f64),
    Decimal(Decimal),
}

fn number(value: &HostValue) -> Option<Number> {
    let number = match value {
        HostValue::Byte(v) => Number::Int(i128::from(*v)),
        HostValue::SByte(v) => Number::Int(i128::from(*v)),
        HostValue::Int16(v) => Number::Int(i128::from(*v)),
        HostValue::Int32(v) => Number::Int(i128::from(*v)),
        HostValue::Int64(v) => Number::Int(i128::from(*v)),
        HostValue::UInt16(v) => Number::Int(i128::from(*v)),
        HostValue::UInt32(v) => Number::Int(i128::from(*v)),
        HostValue::UInt64(v) => Number::Int(i128::from(*v)),
        HostValue::Single(v) => Number::Float(f64::from(*v)),
        HostValue::Double(v) => Number::Float(*v),
        HostValue::Decimal(v) => Number::Decimal(*v),
        HostValue::Text(text) => parse_number(text)?,
        _ => return None,
    };

    Some(number)
}

fn parse_number(text: &str) -> Option<Number> {
    let text = text.trim();

    if let Ok(int) = text.parse::<i128>() {
        return Some(Number::Int(int));
    }
    if let Ok(decimal) = Decimal::from_str(text) {
        return Some(Number::Decimal(decimal));
    }

    match text {
        "INF" => Some(Number::Float(f64::INFINITY)),
        "-INF" => Some(Number::Float(f64::NEG_INFINITY)),
        "NaN" => Some(Number::Float(f64::NAN)),
        _ => text.parse::<f64>().ok().map(Number::Float),
    }
}

impl Number {
    // Integral only; fractional values never truncate.
    #[allow(clippy::cast_possible_truncation)]
    fn to_int(self) -> Option<i128> {
        match self {
            Self::Int(int) => Some(int),
            Self::Float(float) => {
                let integral = float.is_finite() && float.fract() == 0.0 && float.abs() < 1e38;
                integral.then_some(float as i128)
            }
            Self::Decimal(decimal) => {
                let normalized = decimal.normalize();
                (normalized.scale() == 0).then(|| normalized.mantissa())
            }
        }
    }

    fn to_decimal(self) -> Option<Decimal> {
        match self {
            Self::Int(int) => Decimal::from_i128(int),
            Self::Float(float) => Decimal::from_f64(float),
            Self::Decimal(decimal) => Some(decimal),
        }
    }

    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    fn to_f64(self) -> Option<f64> {
        match self {
            Self::Int(int) => {
                let float = int as f64;
                (float as i128 == int).then_some(float)
            }
            Self::Float(float) => Some(float),
            Self::Decimal(decimal) => decimal.to_f64(),
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn to_f32(self) -> Option<f32> {
        let wide = self.to_f64()?;
        let narrow = wide as f32;

        (narrow.is_finite() || !wide.is_finite()).then_some(narrow)
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use time::{Date, Duration, Month};

    fn coerce(kind: PrimitiveKind, value: impl Into<HostValue>) -> Option<PrimitiveValue> {
        coerce_primitive(kind, &value.into())
    }

    #[test]
    fn matching_shapes_pass_through() {
        assert_eq!(
            coerce(PrimitiveKind::String, "Widget"),
            Some(PrimitiveValue::String("Widget".into()))
        );
        assert_eq!(
            coerce(PrimitiveKind::Int64, 7_u32),
            Some(PrimitiveValue::Int64(7))
        );
        assert_eq!(
            coerce(PrimitiveKind::Int32, 7_u16),
            Some(PrimitiveValue::Int32(7))
        );
    }

    #[test]
    fn doubles_convert_to_decimal() {
        assert_eq!(
            coerce(PrimitiveKind::Decimal, 9.99),
            Some(PrimitiveValue::Decimal(Decimal::new(999, 2)))
        );
    }

    #[test]
    fn integral_conversions_never_truncate() {
        assert_eq!(coerce(PrimitiveKind::Int32, 2.5), None);
        assert_eq!(coerce(PrimitiveKind::Int32, 2.0), Some(PrimitiveValue::Int32(2)));
        assert_eq!(coerce(PrimitiveKind::Byte, 300_i32), None);
        assert_eq!(coerce(PrimitiveKind::Int64, u64::MAX), None);
        assert_eq!(
            coerce(PrimitiveKind::Int16, Decimal::new(1200, 2)),
            Some(PrimitiveValue::Int16(12))
        );
    }

    #[test]
    fn text_parses_into_other_kinds() {
        assert_eq!(coerce(PrimitiveKind::Int32, " 42 "), Some(PrimitiveValue::Int32(42)));
        assert_eq!(coerce(PrimitiveKind::Boolean, "TRUE"), Some(PrimitiveValue::Boolean(true)));
        assert_eq!(
            coerce(PrimitiveKind::Date, "2024-05-06"),
            Some(PrimitiveValue::Date(
                Date::from_calendar_date(2024, Month::May, 6).unwrap()
            ))
        );
        assert_eq!(
            coerce(PrimitiveKind::Duration, "PT90S"),
            Some(PrimitiveValue::Duration(Duration::seconds(90)))
        );
        assert_eq!(coerce(PrimitiveKind::Double, "INF"), Some(PrimitiveValue::Double(f64::INFINITY)));
        assert_eq!(coerce(PrimitiveKind::Guid, "not-a-guid"), None);
    }

    #[test]
    fn scalars_convert_to_strings_by_display_form() {
        assert_eq!(coerce(PrimitiveKind::String, 5_i32), Some(PrimitiveValue::String("5".into())));
        assert_eq!(coerce(PrimitiveKind::String, 'x'), Some(PrimitiveValue::String("x".into())));
        assert_eq!(coerce(PrimitiveKind::String, vec![1_u8, 2]), None);
    }

    #[test]
    fn spatial_values_fit_their_family_root() {
        let point = HostValue::spatial(PrimitiveKind::GeographyPoint, "POINT(1 2)");

        assert!(coerce_primitive(PrimitiveKind::Geography, &point).is_some());
        assert!(coerce_primitive(PrimitiveKind::GeographyPoint, &point).is_some());
        assert!(coerce_primitive(PrimitiveKind::Geometry, &point).is_none());

        let from_text = coerce(PrimitiveKind::GeometryPoint, "POINT(3 4)").expect("wkt text");
        assert_eq!(from_text.kind(), PrimitiveKind::GeometryPoint);
    }

    #[test]
    fn tagged_values_unwrap_for_primitives() {
        let tagged = HostValue::tagged("OrderNumber", 12_i64);

        assert_eq!(
            coerce_primitive(PrimitiveKind::Int64, &tagged),
            Some(PrimitiveValue::Int64(12))
        );
    }

    fn primitive_value() -> impl Strategy<Value = PrimitiveValue> {
        prop_oneof![
            any::<bool>().prop_map(PrimitiveValue::Boolean),
            any::<u8>().prop_map(PrimitiveValue::Byte),
            any::<i8>().prop_map(PrimitiveValue::SByte),
            any::<i16>().prop_map(PrimitiveValue::Int16),
            any::<i32>().prop_map(PrimitiveValue::Int32),
            any::<i64>().prop_map(PrimitiveValue::Int64),
            (-1e12_f64..1e12).prop_map(PrimitiveValue::Double),
            (-1e6_f32..1e6).prop_map(PrimitiveValue::Single),
            (any::<i64>(), 0_u32..10).prop_map(|(m, s)| PrimitiveValue::Decimal(Decimal::new(m, s))),
            ".*".prop_map(PrimitiveValue::String),
            proptest::collection::vec(any::<u8>(), 0..16).prop_map(PrimitiveValue::Binary),
            any::<u128>().prop_map(|bits| PrimitiveValue::Guid(Uuid::from_u128(bits))),
            (-100_000_i64..100_000).prop_map(|s| PrimitiveValue::Duration(Duration::seconds(s))),
        ]
    }

    proptest! {
        #[test]
        fn primitives_round_trip_under_their_own_kind(value in primitive_value()) {
            let coerced = coerce_primitive(value.kind(), &value.to_host());

            prop_assert_eq!(coerced, Some(value));
        }
    }
}
