use super::*;
use crate::{
    error::{ErrorClass, ErrorDetail, ErrorOrigin},
    payload::PrimitiveValue,
};

fn json_writer() -> ODataWriter {
    ODataWriter::new(Box::new(JsonFormat::new(false)))
}

fn entry(type_name: &str) -> ODataEntry {
    ODataEntry {
        type_name: type_name.into(),
        properties: Vec::new(),
    }
}

fn single_link() -> ODataNavigationLink {
    ODataNavigationLink {
        name: "Customer".into(),
        is_collection: false,
        target_type: "Shop.Customer".into(),
        url: "http://docs.oasis-open.org/odata/ns/related/Shop.Customer".into(),
    }
}

fn transition(err: &InternalError) -> Option<&WriterError> {
    match &err.detail {
        Some(ErrorDetail::Writer(inner)) => Some(inner),
        _ => None,
    }
}

#[test]
fn feed_of_entries_round_trips_through_json() {
    let mut writer = json_writer();
    writer.start_feed().unwrap();
    writer.start_entry(&entry("Shop.Order")).unwrap();
    writer.end_entry().unwrap();
    writer.start_entry(&entry("Shop.Order")).unwrap();
    writer.end_entry().unwrap();
    writer.end_feed().unwrap();

    let body: serde_json::Value = serde_json::from_slice(&writer.finish().unwrap()).unwrap();
    assert_eq!(body["value"].as_array().map(Vec::len), Some(2));
}

#[test]
fn second_root_is_rejected_and_poisons() {
    let mut writer = json_writer();
    writer.start_entry(&entry("Shop.Order")).unwrap();
    writer.end_entry().unwrap();

    let err = writer.start_entry(&entry("Shop.Order")).unwrap_err();
    assert!(matches!(
        transition(&err),
        Some(WriterError::InvalidTransition { scope, .. }) if scope == "completed body"
    ));
    assert!(writer.is_poisoned());

    let err = writer.finish().unwrap_err();
    assert!(matches!(transition(&err), Some(WriterError::Poisoned)));
}

#[test]
fn items_only_inside_collections() {
    let mut writer = json_writer();
    writer.start_entry(&entry("Shop.Order")).unwrap();

    let item = ODataValue::Primitive(PrimitiveValue::Int32(1));
    let err = writer.write_item(&item).unwrap_err();
    assert_eq!(err.class, ErrorClass::InvariantViolation);
    assert_eq!(err.origin, ErrorOrigin::Writer);
    assert_eq!(err.message, "cannot write a collection item inside entry");

    // Every later call fails fast.
    assert!(matches!(
        transition(&writer.end_entry().unwrap_err()),
        Some(WriterError::Poisoned)
    ));
}

#[test]
fn single_valued_navigation_takes_one_reference() {
    let mut writer = json_writer();
    writer.start_entry(&entry("Shop.Order")).unwrap();
    writer.start_navigation_link(&single_link()).unwrap();

    let link = ODataEntityReferenceLink { url: "$1".into() };
    writer.write_entity_reference_link(&link).unwrap();
    assert!(writer.write_entity_reference_link(&link).is_err());
}

#[test]
fn parameter_scope_holds_one_nested_value() {
    let mut writer = json_writer();
    writer.start_parameters().unwrap();
    writer.start_parameter("Customer").unwrap();
    writer.start_entry(&entry("Shop.Customer")).unwrap();
    writer.end_entry().unwrap();

    assert!(writer.start_feed().is_err());
}

#[test]
fn unclosed_scopes_block_finish() {
    let mut writer = json_writer();
    writer.start_parameters().unwrap();
    writer.start_parameter("Tags").unwrap();
    writer.start_collection(None).unwrap();
    assert_eq!(writer.depth(), 3);

    let err = writer.finish().unwrap_err();
    assert!(matches!(
        transition(&err),
        Some(WriterError::UnclosedScope { scope }) if scope == "collection"
    ));
}

#[test]
fn empty_writer_has_nothing_to_finish() {
    let err = json_writer().finish().unwrap_err();

    assert_eq!(err.class, ErrorClass::InvariantViolation);
    assert_eq!(err.origin, ErrorOrigin::Writer);
    assert!(err.detail.is_none());
}

#[test]
fn parameters_only_at_the_root() {
    let mut writer = json_writer();
    writer.start_feed().unwrap();

    assert!(writer.start_parameters().is_err());
}

#[test]
fn config_selects_the_backend() {
    let config = WriterConfig::default().with_payload_format(PayloadFormat::Atom);
    let mut writer = ODataWriter::for_config(&config);
    writer.start_entry(&entry("Shop.Order")).unwrap();
    writer.end_entry().unwrap();

    let body = String::from_utf8(writer.finish().unwrap()).unwrap();
    assert!(body.contains("<entry"));
}
