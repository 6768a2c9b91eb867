use crate::value::{EntityData, HostValue};
use serde_json::{Map, Number, Value as JsonValue};
use thiserror::Error as ThisError;

///
/// NotAnObject
///
/// A JSON document used as entity data must be an object.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("entity data must be a JSON object, found {found}")]
pub struct NotAnObject {
    pub found: &'static str,
}

impl From<JsonValue> for HostValue {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => Self::Null,
            JsonValue::Bool(v) => Self::Bool(v),
            JsonValue::Number(n) => number(&n),
            JsonValue::String(s) => Self::Text(s),
            JsonValue::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            JsonValue::Object(map) => Self::Map(EntityData::from(map)),
        }
    }
}

impl From<Map<String, JsonValue>> for EntityData {
    fn from(map: Map<String, JsonValue>) -> Self {
        map.into_iter()
            .map(|(k, v)| (k, HostValue::from(v)))
            .collect()
    }
}

impl TryFrom<JsonValue> for EntityData {
    type Error = NotAnObject;

    fn try_from(value: JsonValue) -> Result<Self, Self::Error> {
        let found = match value {
            JsonValue::Object(map) => return Ok(Self::from(map)),
            JsonValue::Null => "null",
            JsonValue::Bool(_) => "boolean",
            JsonValue::Number(_) => "number",
            JsonValue::String(_) => "string",
            JsonValue::Array(_) => "array",
        };

        Err(NotAnObject { found })
    }
}

// Integers keep their width; everything else is a double.
fn number(n: &Number) -> HostValue {
    if let Some(v) = n.as_i64() {
        HostValue::Int64(v)
    } else if let Some(v) = n.as_u64() {
        HostValue::UInt64(v)
    } else {
        HostValue::Double(n.as_f64().unwrap_or(f64::NAN))
    }
}
