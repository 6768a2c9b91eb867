//! URI literal formatting for key segments.

use crate::payload::{ODataValue, PrimitiveValue};
use base64::URL_SAFE;

/// Format one primitive as a URI literal.
#[must_use]
pub fn primitive_literal(value: &PrimitiveValue) -> String {
    match value {
        PrimitiveValue::String(s) => quote(s),
        PrimitiveValue::Binary(bytes) | PrimitiveValue::Stream(bytes) => {
            format!("binary'{}'", base64::encode_config(bytes, URL_SAFE))
        }
        PrimitiveValue::Duration(_) => format!("duration'{}'", value.to_json_text()),
        PrimitiveValue::Double(_) | PrimitiveValue::Single(_) => {
            let text = value.to_json_text();
            if text.bytes().all(|b| b.is_ascii_digit() || b == b'-') {
                format!("{text}.0")
            } else {
                text
            }
        }
        PrimitiveValue::Spatial(spatial) => {
            let prefix = if spatial.kind.is_geography() {
                "geography"
            } else {
                "geometry"
            };
            format!("{prefix}'{}'", spatial.wkt.replace('\'', "''"))
        }
        _ => value.to_json_text(),
    }
}

/// Format a scalar protocol value as a URI literal.
///
/// Returns `None` for values that have no literal form (complex values,
/// collections).
#[must_use]
pub fn value_literal(value: &ODataValue) -> Option<String> {
    match value {
        ODataValue::Primitive(primitive) => Some(primitive_literal(primitive)),
        ODataValue::Enum { type_name, value } => Some(match type_name {
            Some(type_name) => format!("{type_name}{}", quote(value)),
            None => quote(value),
        }),
        ODataValue::Null => Some("null".to_string()),
        ODataValue::Collection { .. } | ODataValue::Complex { .. } => None,
    }
}

/// Format a key segment: `(lit)` for a single key, `(K1=lit,K2=lit)` for a
/// composite key.
#[must_use]
pub fn key_literal(parts: &[(&str, ODataValue)]) -> Option<String> {
    match parts {
        [] => None,
        [(_, value)] => Some(format!("({})", value_literal(value)?)),
        _ => {
            let segments = parts
                .iter()
                .map(|(name, value)| value_literal(value).map(|lit| format!("{name}={lit}")))
                .collect::<Option<Vec<_>>>()?;

            Some(format!("({})", segments.join(",")))
        }
    }
}

fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use time::Duration;

    fn prim(value: PrimitiveValue) -> ODataValue {
        ODataValue::Primitive(value)
    }

    #[test]
    fn strings_are_quoted_with_doubled_apostrophes() {
        let lit = primitive_literal(&PrimitiveValue::String("O'Brien".into()));

        assert_eq!(lit, "'O''Brien'");
    }

    #[test]
    fn numbers_and_flags_are_bare() {
        assert_eq!(primitive_literal(&PrimitiveValue::Int64(42)), "42");
        assert_eq!(primitive_literal(&PrimitiveValue::Boolean(true)), "true");
        assert_eq!(
            primitive_literal(&PrimitiveValue::Decimal(Decimal::new(999, 2))),
            "9.99"
        );
        assert_eq!(primitive_literal(&PrimitiveValue::Double(2.0)), "2.0");
        assert_eq!(primitive_literal(&PrimitiveValue::Double(2.5)), "2.5");
    }

    #[test]
    fn typed_literals_carry_their_prefix() {
        assert_eq!(
            primitive_literal(&PrimitiveValue::Duration(Duration::seconds(5))),
            "duration'PT5S'"
        );
        assert_eq!(
            primitive_literal(&PrimitiveValue::Binary(vec![1, 2, 3])),
            "binary'AQID'"
        );

        let color = ODataValue::Enum {
            type_name: Some("Shop.Color".into()),
            value: "Red".into(),
        };
        assert_eq!(value_literal(&color).as_deref(), Some("Shop.Color'Red'"));
    }

    #[test]
    fn single_and_composite_keys() {
        assert_eq!(
            key_literal(&[("Id", prim(PrimitiveValue::Int32(5)))]).as_deref(),
            Some("(5)")
        );
        assert_eq!(
            key_literal(&[
                ("OrderId", prim(PrimitiveValue::Int64(7))),
                ("Sku", prim(PrimitiveValue::String("A-1".into()))),
            ])
            .as_deref(),
            Some("(OrderId=7,Sku='A-1')")
        );
        assert_eq!(key_literal(&[]), None);
    }

    #[test]
    fn structured_values_have_no_literal() {
        let complex = ODataValue::Complex {
            type_name: None,
            properties: Vec::new(),
        };

        assert_eq!(key_literal(&[("Id", complex)]), None);
    }
}
