use crate::value::{EntityData, HostKind, HostValue, NotAnObject};
use odatawire_primitives::{HostShape, PrimitiveKind};
use rust_decimal::Decimal;
use serde_json::json;

#[test]
fn insert_replaces_in_place_and_keeps_order() {
    let mut data = EntityData::new().with("Name", "Widget").with("Price", 9.99);
    let previous = data.insert("Name", "Gadget");

    assert_eq!(previous, Some(HostValue::Text("Widget".into())));
    assert_eq!(data.keys().collect::<Vec<_>>(), ["Name", "Price"]);
    assert_eq!(data.get("Name"), Some(&HostValue::Text("Gadget".into())));
    assert_eq!(data.len(), 2);
}

#[test]
fn remove_drops_the_entry() {
    let mut data: EntityData = [("A", 1_i32), ("B", 2_i32)].into_iter().collect();

    assert_eq!(data.remove("A"), Some(HostValue::Int32(1)));
    assert_eq!(data.remove("A"), None);
    assert!(!data.contains_key("A"));
    assert!(data.contains_key("B"));
}

#[test]
fn tagged_values_report_their_tag() {
    let value = HostValue::tagged("Money", Decimal::new(1050, 2));

    assert_eq!(value.kind(), HostKind::Tagged);
    assert_eq!(value.type_label(), "Money");
    assert_eq!(value.shape(), None);
    assert_eq!(value.display_text().as_deref(), Some("10.50"));
    assert_eq!(HostValue::Int32(1).type_label(), "Int32");
}

#[test]
fn scalar_shapes_follow_the_mapping_table() {
    assert_eq!(HostValue::from(7_u32).shape(), Some(HostShape::UInt32));
    assert_eq!(HostValue::from("x").shape(), Some(HostShape::Text));
    assert_eq!(
        HostValue::spatial(PrimitiveKind::GeometryPoint, "POINT(1 2)").shape(),
        Some(HostShape::GeometryPoint)
    );
    assert_eq!(HostValue::Null.shape(), None);
    assert_eq!(HostValue::from(Vec::<HostValue>::new()).shape(), None);
}

#[test]
fn structured_values_have_no_display_text() {
    assert_eq!(HostValue::Map(EntityData::new()).display_text(), None);
    assert_eq!(HostValue::Binary(vec![1]).display_text(), None);
    assert_eq!(
        HostValue::enum_member("Red").display_text().as_deref(),
        Some("Red")
    );
}

#[test]
fn options_map_none_to_null() {
    assert_eq!(HostValue::from(None::<i32>), HostValue::Null);
    assert_eq!(HostValue::from(Some(3_i64)), HostValue::Int64(3));
}

#[test]
fn json_objects_convert_to_entity_data() {
    let data = EntityData::try_from(json!({
        "Id": 5,
        "Big": u64::MAX,
        "Price": 9.5,
        "Tags": ["a", "b"],
        "Address": { "City": "Oslo" },
        "Note": null,
    }))
    .unwrap();

    assert_eq!(data.get("Id"), Some(&HostValue::Int64(5)));
    assert_eq!(data.get("Big"), Some(&HostValue::UInt64(u64::MAX)));
    assert_eq!(data.get("Price"), Some(&HostValue::Double(9.5)));
    assert_eq!(data.get("Note"), Some(&HostValue::Null));
    assert_eq!(
        data.get("Tags"),
        Some(&HostValue::List(vec!["a".into(), "b".into()]))
    );

    let address = data.get("Address").and_then(HostValue::as_map).unwrap();
    assert_eq!(address.get("City"), Some(&HostValue::Text("Oslo".into())));
}

#[test]
fn non_object_json_is_rejected() {
    let err = EntityData::try_from(json!([1, 2])).unwrap_err();

    assert_eq!(err, NotAnObject { found: "array" });
}
