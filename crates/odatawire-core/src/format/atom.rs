use crate::{
    error::InternalError,
    format::{FormatWriter, WriteEvent},
    payload::{ODataNavigationLink, ODataValue},
};
use odatawire_primitives::PrimitiveKind;
use quick_xml::{
    Writer,
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
};

const ATOM_NS: &str = "http://www.w3.org/2005/Atom";
const DATA_NS: &str = "http://docs.oasis-open.org/odata/ns/data";
const METADATA_NS: &str = "http://docs.oasis-open.org/odata/ns/metadata";
const SCHEME: &str = "http://docs.oasis-open.org/odata/ns/scheme";

///
/// AtomFormat
///
/// Legacy XML backend. Streams straight into a quick-xml writer; the first
/// element written carries the namespace declarations and `xml:base`.
///

pub struct AtomFormat {
    writer: Writer<Vec<u8>>,
    base_uri: String,
    started: bool,
    closers: Vec<Closer>,
    link: Option<ODataNavigationLink>,
    pending_parameter: Option<String>,
}

#[derive(Debug)]
enum Closer {
    Element(String),
    Parameter(String),
    Nothing,
}

impl AtomFormat {
    #[must_use]
    pub fn new(indent: bool, base_uri: &str) -> Self {
        let writer = if indent {
            Writer::new_with_indent(Vec::new(), b' ', 2)
        } else {
            Writer::new(Vec::new())
        };

        Self {
            writer,
            base_uri: base_uri.to_string(),
            started: false,
            closers: Vec::new(),
            link: None,
            pending_parameter: None,
        }
    }

    fn emit(&mut self, event: Event<'_>) -> Result<(), InternalError> {
        self.writer
            .write_event(event)
            .map_err(|err| InternalError::format_internal(err.to_string()))
    }

    // Builds a start tag, adding the root declarations to the first one.
    fn element<'e>(
        &mut self,
        name: &'e str,
        attributes: &[(&str, &str)],
    ) -> Result<BytesStart<'e>, InternalError> {
        let mut start = BytesStart::new(name);

        if !self.started {
            self.started = true;
            self.emit(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
            start.push_attribute(("xmlns", ATOM_NS));
            start.push_attribute(("xmlns:d", DATA_NS));
            start.push_attribute(("xmlns:m", METADATA_NS));
            start.push_attribute(("xml:base", self.base_uri.as_str()));
        }
        for attribute in attributes {
            start.push_attribute(*attribute);
        }

        Ok(start)
    }

    fn open(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<(), InternalError> {
        let start = self.element(name, attributes)?;
        self.emit(Event::Start(start))
    }

    fn empty(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<(), InternalError> {
        let start = self.element(name, attributes)?;
        self.emit(Event::Empty(start))
    }

    fn close(&mut self, name: &str) -> Result<(), InternalError> {
        self.emit(Event::End(BytesEnd::new(name)))
    }

    fn text(&mut self, text: &str) -> Result<(), InternalError> {
        self.emit(Event::Text(BytesText::new(text)))
    }

    fn pop(&mut self) -> Result<(), InternalError> {
        match self.closers.pop() {
            Some(Closer::Element(name)) => self.close(&name),
            Some(Closer::Nothing) => Ok(()),
            Some(Closer::Parameter(name)) => {
                if self.pending_parameter.take().is_some() {
                    self.empty(&name, &[("m:null", "true")])
                } else {
                    self.close(&name)
                }
            }
            None => Err(InternalError::format_internal("atom scope stack is empty")),
        }
    }

    // A nested parameter's element is opened by the value written into it,
    // so a collection can stamp its type on the element.
    fn open_pending_parameter(&mut self, type_name: Option<&str>) -> Result<(), InternalError> {
        match self.pending_parameter.take() {
            Some(name) => self.open_typed(&name, type_name),
            None => Ok(()),
        }
    }

    fn write_value(&mut self, name: &str, value: &ODataValue) -> Result<(), InternalError> {
        match value {
            ODataValue::Null => self.empty(name, &[("m:null", "true")]),
            ODataValue::Primitive(primitive) => {
                let text = primitive.to_plain_text();
                let kind = primitive.kind();
                if kind == PrimitiveKind::String {
                    self.open(name, &[])?;
                } else {
                    let edm = kind.edm_name();
                    self.open(name, &[("m:type", &edm["Edm.".len()..])])?;
                }
                self.text(&text)?;
                self.close(name)
            }
            ODataValue::Enum { type_name, value } => {
                self.open_typed(name, type_name.as_deref())?;
                self.text(value)?;
                self.close(name)
            }
            ODataValue::Complex {
                type_name,
                properties,
            } => {
                self.open_typed(name, type_name.as_deref())?;
                for property in properties {
                    self.write_value(&format!("d:{}", property.name), &property.value)?;
                }
                self.close(name)
            }
            ODataValue::Collection { type_name, items } => {
                self.open_typed(name, type_name.as_deref())?;
                for item in items {
                    self.write_value("m:element", item)?;
                }
                self.close(name)
            }
        }
    }

    fn open_typed(&mut self, name: &str, type_name: Option<&str>) -> Result<(), InternalError> {
        match type_name {
            Some(type_name) => {
                let annotation = format!("#{type_name}");
                self.open(name, &[("m:type", annotation.as_str())])
            }
            None => self.open(name, &[]),
        }
    }
}

impl FormatWriter for AtomFormat {
    fn write(&mut self, event: WriteEvent<'_>) -> Result<(), InternalError> {
        match event {
            WriteEvent::StartEntry(entry) => {
                self.open_pending_parameter(None)?;
                self.open("entry", &[])?;

                let term = format!("#{}", entry.type_name);
                self.empty("category", &[("term", term.as_str()), ("scheme", SCHEME)])?;
                self.open("content", &[("type", "application/xml")])?;
                self.open("m:properties", &[])?;
                for property in &entry.properties {
                    self.write_value(&format!("d:{}", property.name), &property.value)?;
                }
                self.close("m:properties")?;
                self.close("content")?;

                self.closers.push(Closer::Element("entry".into()));
            }
            WriteEvent::StartFeed => {
                self.open_pending_parameter(None)?;
                self.open("feed", &[])?;
                self.closers.push(Closer::Element("feed".into()));
            }
            WriteEvent::StartNavigationLink(link) => {
                self.link = Some(link.clone());
                self.closers.push(Closer::Nothing);
            }
            WriteEvent::EndNavigationLink => {
                self.link = None;
                self.pop()?;
            }
            WriteEvent::EntityReferenceLink(reference) => match self.link.take() {
                Some(link) => {
                    let kind = if link.is_collection {
                        "application/atom+xml;type=feed"
                    } else {
                        "application/atom+xml;type=entry"
                    };
                    let result = self.empty(
                        "link",
                        &[
                            ("rel", link.url.as_str()),
                            ("type", kind),
                            ("title", link.name.as_str()),
                            ("href", reference.url.as_str()),
                        ],
                    );
                    self.link = Some(link);
                    result?;
                }
                None => self.empty("m:ref", &[("id", reference.url.as_str())])?,
            },
            WriteEvent::StartParameters => {
                self.open("m:parameters", &[])?;
                self.closers.push(Closer::Element("m:parameters".into()));
            }
            WriteEvent::ParameterValue { name, value } => {
                self.write_value(&format!("d:{name}"), value)?;
            }
            WriteEvent::StartParameter { name } => {
                let element = format!("d:{name}");
                self.pending_parameter = Some(element.clone());
                self.closers.push(Closer::Parameter(element));
            }
            WriteEvent::StartCollection { type_name } => {
                if self.pending_parameter.is_some() {
                    self.open_pending_parameter(type_name)?;
                    self.closers.push(Closer::Nothing);
                } else {
                    self.open_typed("m:value", type_name)?;
                    self.closers.push(Closer::Element("m:value".into()));
                }
            }
            WriteEvent::CollectionItem(value) => self.write_value("m:element", value)?,
            WriteEvent::EndEntry
            | WriteEvent::EndFeed
            | WriteEvent::EndParameter
            | WriteEvent::EndParameters
            | WriteEvent::EndCollection => self.pop()?,
        }

        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<Vec<u8>, InternalError> {
        if !self.closers.is_empty() {
            return Err(InternalError::format_internal("atom body has open elements"));
        }

        Ok(self.writer.into_inner())
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::{ODataEntityReferenceLink, ODataEntry, ODataProperty, PrimitiveValue};

    fn render(events: &[WriteEvent<'_>]) -> String {
        let mut format = Box::new(AtomFormat::new(false, "http://host/svc/"));
        for event in events {
            format.write(*event).unwrap();
        }

        String::from_utf8(format.finish().unwrap()).unwrap()
    }

    #[test]
    fn entry_declares_namespaces_and_typed_properties() {
        let entry = ODataEntry {
            type_name: "Shop.Product".into(),
            properties: vec![
                ODataProperty::new("Name", PrimitiveValue::String("A & B".into()).into()),
                ODataProperty::new("Id", PrimitiveValue::Int32(7).into()),
                ODataProperty::new("Price", ODataValue::Null),
            ],
        };

        let xml = render(&[WriteEvent::StartEntry(&entry), WriteEvent::EndEntry]);

        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));
        assert!(xml.contains(r#"<entry xmlns="http://www.w3.org/2005/Atom""#));
        assert!(xml.contains(r#"xml:base="http://host/svc/""#));
        assert!(xml.contains(r##"<category term="#Shop.Product""##));
        assert!(xml.contains("<d:Name>A &amp; B</d:Name>"));
        assert!(xml.contains(r#"<d:Id m:type="Int32">7</d:Id>"#));
        assert!(xml.contains(r#"<d:Price m:null="true"/>"#));
        assert!(xml.ends_with("</entry>"));
    }

    #[test]
    fn navigation_references_become_link_elements() {
        let entry = ODataEntry {
            type_name: "Shop.Customer".into(),
            properties: Vec::new(),
        };
        let orders = ODataNavigationLink {
            name: "Orders".into(),
            is_collection: true,
            target_type: "Shop.Order".into(),
            url: "http://docs.oasis-open.org/odata/ns/related/Shop.Order".into(),
        };
        let reference = ODataEntityReferenceLink { url: "$1".into() };

        let xml = render(&[
            WriteEvent::StartEntry(&entry),
            WriteEvent::StartNavigationLink(&orders),
            WriteEvent::EntityReferenceLink(&reference),
            WriteEvent::EndNavigationLink,
            WriteEvent::EndEntry,
        ]);

        assert!(xml.contains(r#"title="Orders" href="$1"/>"#));
        assert!(xml.contains("type=feed"));
    }

    #[test]
    fn parameters_nest_collections_under_the_parameter_element() {
        let amount = ODataValue::Primitive(PrimitiveValue::Int32(5));
        let tag = ODataValue::Primitive(PrimitiveValue::String("x".into()));

        let xml = render(&[
            WriteEvent::StartParameters,
            WriteEvent::ParameterValue {
                name: "Amount",
                value: &amount,
            },
            WriteEvent::StartParameter { name: "Tags" },
            WriteEvent::StartCollection {
                type_name: Some("Collection(Edm.String)"),
            },
            WriteEvent::CollectionItem(&tag),
            WriteEvent::EndCollection,
            WriteEvent::EndParameter,
            WriteEvent::StartParameter { name: "Note" },
            WriteEvent::EndParameter,
            WriteEvent::EndParameters,
        ]);

        assert!(xml.contains(r#"<d:Amount m:type="Int32">5</d:Amount>"#));
        assert!(xml.contains(
            r##"<d:Tags m:type="#Collection(Edm.String)"><m:element>x</m:element></d:Tags>"##
        ));
        assert!(xml.contains(r#"<d:Note m:null="true"/>"#));
        assert!(xml.ends_with("</m:parameters>"));
    }

    #[test]
    fn root_reference_link_is_a_ref_element() {
        let reference = ODataEntityReferenceLink {
            url: "http://host/svc/Orders(1)".into(),
        };

        let xml = render(&[WriteEvent::EntityReferenceLink(&reference)]);

        assert!(xml.contains(r#"<m:ref xmlns="#));
        assert!(xml.contains(r#"id="http://host/svc/Orders(1)"/>"#));
    }
}
