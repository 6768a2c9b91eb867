use crate::{
    error::InternalError,
    format::{FormatWriter, WriteEvent},
    payload::{ODataValue, PrimitiveValue},
};
use rust_decimal::Decimal;
use serde_json::{Map, Number, Value};

///
/// JsonFormat
///
/// Builds the body as a `serde_json::Value` tree and serializes it on
/// finish. Object keys come out sorted.
///

#[derive(Debug, Default)]
pub struct JsonFormat {
    indent: bool,
    stack: Vec<Node>,
    root: Option<Value>,
}

#[derive(Debug)]
enum Node {
    Entry(Map<String, Value>),
    Feed(Vec<Value>),
    NavigationLink {
        name: String,
        is_collection: bool,
        urls: Vec<Value>,
    },
    Parameters(Map<String, Value>),
    Parameter {
        name: String,
        value: Option<Value>,
    },
    Collection(Vec<Value>),
}

impl JsonFormat {
    #[must_use]
    pub const fn new(indent: bool) -> Self {
        Self {
            indent,
            stack: Vec::new(),
            root: None,
        }
    }

    fn pop(&mut self) -> Result<Node, InternalError> {
        self.stack
            .pop()
            .ok_or_else(|| InternalError::format_internal("json scope stack is empty"))
    }

    // Attach a finished entry, feed or collection to whatever encloses it.
    fn attach(&mut self, value: Value, wrap_root: bool) -> Result<(), InternalError> {
        match self.stack.last_mut() {
            None => {
                self.root = Some(if wrap_root {
                    let mut object = Map::new();
                    object.insert("value".to_string(), value);
                    Value::Object(object)
                } else {
                    value
                });
            }
            Some(Node::Feed(items)) => items.push(value),
            Some(Node::Parameter { value: slot, .. }) => *slot = Some(value),
            Some(other) => {
                return Err(InternalError::format_internal(format!(
                    "cannot attach a json value to {other:?}"
                )));
            }
        }

        Ok(())
    }
}

impl FormatWriter for JsonFormat {
    fn write(&mut self, event: WriteEvent<'_>) -> Result<(), InternalError> {
        match event {
            WriteEvent::StartEntry(entry) => {
                let mut object = Map::new();
                object.insert(
                    "@odata.type".to_string(),
                    Value::String(format!("#{}", entry.type_name)),
                );
                for property in &entry.properties {
                    object.insert(property.name.clone(), to_json(&property.value));
                }
                self.stack.push(Node::Entry(object));
            }
            WriteEvent::EndEntry => match self.pop()? {
                Node::Entry(object) => self.attach(Value::Object(object), false)?,
                other => return Err(mismatch("entry", &other)),
            },
            WriteEvent::StartFeed => self.stack.push(Node::Feed(Vec::new())),
            WriteEvent::EndFeed => match self.pop()? {
                Node::Feed(items) => self.attach(Value::Array(items), true)?,
                other => return Err(mismatch("feed", &other)),
            },
            WriteEvent::StartNavigationLink(link) => self.stack.push(Node::NavigationLink {
                name: link.name.clone(),
                is_collection: link.is_collection,
                urls: Vec::new(),
            }),
            WriteEvent::EndNavigationLink => match self.pop()? {
                Node::NavigationLink {
                    name,
                    is_collection,
                    mut urls,
                } => {
                    let bound = if is_collection {
                        Value::Array(urls)
                    } else {
                        urls.pop().unwrap_or(Value::Null)
                    };
                    match self.stack.last_mut() {
                        Some(Node::Entry(object)) => {
                            object.insert(format!("{name}@odata.bind"), bound);
                        }
                        _ => return Err(InternalError::format_internal("navigation link outside an entry")),
                    }
                }
                other => return Err(mismatch("navigation link", &other)),
            },
            WriteEvent::EntityReferenceLink(link) => match self.stack.last_mut() {
                Some(Node::NavigationLink { urls, .. }) => urls.push(Value::String(link.url.clone())),
                None => {
                    let mut object = Map::new();
                    object.insert("@odata.id".to_string(), Value::String(link.url.clone()));
                    self.root = Some(Value::Object(object));
                }
                Some(other) => return Err(mismatch("reference link", other)),
            },
            WriteEvent::StartParameters => self.stack.push(Node::Parameters(Map::new())),
            WriteEvent::ParameterValue { name, value } => match self.stack.last_mut() {
                Some(Node::Parameters(object)) => {
                    object.insert(name.to_string(), to_json(value));
                }
                other => {
                    return Err(InternalError::format_internal(format!(
                        "parameter value outside parameters: {other:?}"
                    )));
                }
            },
            WriteEvent::StartParameter { name } => self.stack.push(Node::Parameter {
                name: name.to_string(),
                value: None,
            }),
            WriteEvent::EndParameter => match self.pop()? {
                Node::Parameter { name, value } => match self.stack.last_mut() {
                    Some(Node::Parameters(object)) => {
                        object.insert(name, value.unwrap_or(Value::Null));
                    }
                    _ => return Err(InternalError::format_internal("parameter outside parameters")),
                },
                other => return Err(mismatch("parameter", &other)),
            },
            WriteEvent::EndParameters => match self.pop()? {
                Node::Parameters(object) => self.root = Some(Value::Object(object)),
                other => return Err(mismatch("parameters", &other)),
            },
            WriteEvent::StartCollection { .. } => self.stack.push(Node::Collection(Vec::new())),
            WriteEvent::CollectionItem(value) => match self.stack.last_mut() {
                Some(Node::Collection(items)) => items.push(to_json(value)),
                other => {
                    return Err(InternalError::format_internal(format!(
                        "collection item outside a collection: {other:?}"
                    )));
                }
            },
            WriteEvent::EndCollection => match self.pop()? {
                Node::Collection(items) => self.attach(Value::Array(items), true)?,
                other => return Err(mismatch("collection", &other)),
            },
        }

        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<Vec<u8>, InternalError> {
        let Self { indent, root, .. } = *self;
        let root = root.ok_or_else(|| InternalError::format_internal("json body has no root value"))?;

        let bytes = if indent {
            serde_json::to_vec_pretty(&root)
        } else {
            serde_json::to_vec(&root)
        };

        bytes.map_err(|err| InternalError::format_internal(err.to_string()))
    }
}

fn mismatch(closing: &str, node: &Node) -> InternalError {
    InternalError::format_internal(format!("cannot close {closing} over {node:?}"))
}

/// Encode one protocol value as JSON.
fn to_json(value: &ODataValue) -> Value {
    match value {
        ODataValue::Null => Value::Null,
        ODataValue::Primitive(primitive) => primitive_to_json(primitive),
        ODataValue::Enum { value, .. } => Value::String(value.clone()),
        ODataValue::Complex { properties, .. } => Value::Object(
            properties
                .iter()
                .map(|p| (p.name.clone(), to_json(&p.value)))
                .collect(),
        ),
        ODataValue::Collection { items, .. } => Value::Array(items.iter().map(to_json).collect()),
    }
}

fn primitive_to_json(value: &PrimitiveValue) -> Value {
    match value {
        PrimitiveValue::Boolean(v) => Value::Bool(*v),
        PrimitiveValue::Byte(v) => Value::from(*v),
        PrimitiveValue::SByte(v) => Value::from(*v),
        PrimitiveValue::Int16(v) => Value::from(*v),
        PrimitiveValue::Int32(v) => Value::from(*v),
        PrimitiveValue::Int64(v) => Value::from(*v),
        PrimitiveValue::Double(v) => Number::from_f64(*v)
            .map_or_else(|| Value::String(value.to_json_text()), Value::Number),

        PrimitiveValue::Decimal(v) => decimal_to_json(*v, value.to_json_text()),

        // Single goes through its shortest text form so the JSON literal
        // carries the digits the host wrote.
        PrimitiveValue::Single(_) => {
            let text = value.to_json_text();
            text.parse::<Number>()
                .map_or(Value::String(text), Value::Number)
        }
        _ => Value::String(value.to_json_text()),
    }
}

// A JSON number is read back as a double; decimals a double cannot carry
// exactly are written as strings (IEEE754Compatible form).
fn decimal_to_json(value: Decimal, text: String) -> Value {
    let exact = |number: &Number| {
        number
            .as_f64()
            .and_then(|f| f.to_string().parse::<Decimal>().ok())
            == Some(value)
    };

    match text.parse::<Number>() {
        Ok(number) if exact(&number) => Value::Number(number),
        _ => Value::String(text),
    }
}

///
/// TESTS
///
