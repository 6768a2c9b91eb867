mod support;

use odatawire_config::{PayloadFormat, WriterConfig};
use odatawire_core::{
    error::NameKind,
    obs::{metrics_report, metrics_reset_all},
    request::{ActionRequest, EntryRequest, LinkRequest, Method, RequestWriter},
    value::{EntityData, HostValue},
};
use rust_decimal::Decimal;
use serde_json::json;
use support::{catalog, json};

fn entry<'d>(method: Method, collection: &'d str, command_text: &'d str, data: &'d EntityData) -> EntryRequest<'d> {
    EntryRequest {
        method,
        collection,
        command_text,
        entry_data: data,
        result_required: false,
    }
}

#[tokio::test]
async fn post_entry_returns_the_body() {
    let catalog = catalog();
    let config = WriterConfig::default();
    let writer = RequestWriter::new(&catalog, &config);
    let data = EntityData::new()
        .with("Name", "Widget")
        .with("Price", Decimal::new(999, 2));

    let body = writer
        .write_entry(entry(Method::Post, "Products", "Products", &data))
        .await
        .unwrap()
        .expect("standalone post has a body");

    assert_eq!(
        json(&body),
        json!({ "@odata.type": "#Shop.Product", "Name": "Widget", "Price": 9.99 })
    );
    assert_eq!(
        body.header("content-type"),
        Some("application/json;odata.metadata=minimal")
    );
    assert_eq!(body.header("Prefer"), Some("return=minimal"));
}

#[tokio::test]
async fn get_and_delete_carry_no_body() {
    let catalog = catalog();
    let config = WriterConfig::default();
    let writer = RequestWriter::new(&catalog, &config);
    let data = EntityData::new().with("Id", 1);

    for method in [Method::Get, Method::Delete] {
        let body = writer
            .write_entry(entry(method, "Customers", "Customers(1)", &data))
            .await
            .unwrap();
        assert!(body.is_none(), "{method} wrote a body");
    }
}

#[tokio::test]
async fn patch_declares_only_supplied_members() {
    let catalog = catalog();
    let config = WriterConfig::default();
    let writer = RequestWriter::new(&catalog, &config);

    let data = EntityData::new().with("email", "ann@example.com");
    let body = writer
        .write_entry(EntryRequest {
            result_required: true,
            ..entry(Method::Patch, "customer", "Customers(1)", &data)
        })
        .await
        .unwrap()
        .expect("patch has a body");

    assert_eq!(
        json(&body),
        json!({ "@odata.type": "#Shop.Customer", "Email": "ann@example.com" })
    );
    assert_eq!(body.header("prefer"), Some("return=representation"));

    let data = EntityData::new().with("Shoe", 42);
    let err = writer
        .write_entry(entry(Method::Patch, "Customers", "Customers(1)", &data))
        .await
        .unwrap_err();
    let detail = err.as_unresolvable().expect("resolve detail");
    assert_eq!(detail.name(), "Shoe");
    assert_eq!(detail.owner(), "Shop.Customer");
}

#[tokio::test]
async fn unknown_collections_are_unresolvable() {
    let catalog = catalog();
    let config = WriterConfig::default();
    let writer = RequestWriter::new(&catalog, &config);
    let data = EntityData::new().with("Id", 1);

    let err = writer
        .write_entry(entry(Method::Post, "Invoices", "Invoices", &data))
        .await
        .unwrap_err();

    assert_eq!(err.as_unresolvable().map(|d| d.kind()), Some(NameKind::Collection));
}

#[tokio::test]
async fn navigation_links_use_key_uris() {
    let catalog = catalog();
    let config = WriterConfig::default();
    let writer = RequestWriter::new(&catalog, &config);
    let data = EntityData::new()
        .with("Id", 10)
        .with("Customer", HostValue::Map(EntityData::new().with("Id", 4)));

    let body = writer
        .write_entry(entry(Method::Post, "Orders", "Orders", &data))
        .await
        .unwrap()
        .expect("post has a body");

    assert_eq!(
        json(&body),
        json!({
            "@odata.type": "#Shop.Order",
            "Id": 10,
            "Customer@odata.bind": "http://localhost/Customers(4)",
        })
    );
}

#[tokio::test]
async fn link_writes_target_the_ref_path() {
    let catalog = catalog();
    let config = WriterConfig::default();
    let writer = RequestWriter::new(&catalog, &config);
    let link = LinkRequest {
        method: Method::Post,
        entity_path: "Customers(1)",
        navigation: "Orders",
        link_ident: "Orders(2)",
    };

    let body = writer.write_link(link).await.unwrap().expect("post link has a body");
    assert_eq!(json(&body), json!({ "@odata.id": "http://localhost/Orders(2)" }));

    let removed = writer
        .write_link(LinkRequest {
            method: Method::Delete,
            ..link
        })
        .await
        .unwrap();
    assert!(removed.is_none());
}

#[tokio::test]
async fn functions_never_carry_a_body() {
    let catalog = catalog();
    let config = WriterConfig::default();
    let writer = RequestWriter::new(&catalog, &config);

    let body = writer.write_function("TopProducts(Count=3)").await.unwrap();

    assert!(body.is_none());
}

#[tokio::test]
async fn entity_parameters_are_nested_entries() {
    let catalog = catalog();
    let config = WriterConfig::default();
    let writer = RequestWriter::new(&catalog, &config);
    let parameters = EntityData::new().with("customer", HostValue::Map(EntityData::new().with("Id", 5)));

    let body = writer
        .write_action(ActionRequest {
            action: "Checkout",
            command_text: "Checkout",
            parameters: &parameters,
            result_required: false,
        })
        .await
        .unwrap()
        .expect("action has a body");

    assert_eq!(
        json(&body),
        json!({ "Customer": { "@odata.type": "#Shop.Customer", "Id": 5 } })
    );
}

#[tokio::test]
async fn undeclared_parameters_name_the_action() {
    let catalog = catalog();
    let config = WriterConfig::default();
    let writer = RequestWriter::new(&catalog, &config);
    let parameters = EntityData::new().with("Qty", 3);

    let err = writer
        .write_action(ActionRequest {
            action: "Transfer",
            command_text: "Transfer",
            parameters: &parameters,
            result_required: false,
        })
        .await
        .unwrap_err();
    let detail = err.as_unresolvable().expect("resolve detail");

    assert_eq!(detail.kind(), NameKind::Parameter);
    assert_eq!(detail.name(), "Qty");
    assert_eq!(detail.owner(), "Transfer");
}

#[tokio::test]
async fn atom_entries_and_parameters() {
    let catalog = catalog();
    let config = WriterConfig::default().with_payload_format(PayloadFormat::Atom);
    let writer = RequestWriter::new(&catalog, &config);

    let data = EntityData::new().with("Name", "Widget").with("Id", 7);
    let body = writer
        .write_entry(entry(Method::Put, "Products", "Products(7)", &data))
        .await
        .unwrap()
        .expect("put has a body");
    let xml = body.text().unwrap();

    assert_eq!(body.header("Content-Type"), Some("application/atom+xml"));
    assert!(xml.contains(r##"<category term="#Shop.Product""##));
    assert!(xml.contains("<d:Name>Widget</d:Name>"));
    assert!(xml.contains(r#"<d:Id m:type="Int32">7</d:Id>"#));

    let parameters = EntityData::new().with("Amount", Decimal::new(125, 1));
    let body = writer
        .write_action(ActionRequest {
            action: "Transfer",
            command_text: "Transfer",
            parameters: &parameters,
            result_required: false,
        })
        .await
        .unwrap()
        .expect("action has a body");

    assert_eq!(body.header("Content-Type"), Some("application/xml"));
    assert!(body.text().unwrap().ends_with("</m:parameters>"));
}

#[tokio::test]
async fn writes_are_counted_on_the_calling_thread() {
    metrics_reset_all();

    let catalog = catalog();
    let config = WriterConfig::default();
    let writer = RequestWriter::new(&catalog, &config);
    let data = EntityData::new().with("Name", "Widget");

    writer
        .write_entry(entry(Method::Post, "Products", "Products", &data))
        .await
        .unwrap();
    writer.write_function("TopProducts(Count=1)").await.unwrap();

    let counters = metrics_report(None).counters.expect("counters");
    assert_eq!(counters.ops.entry_writes, 1);
    assert_eq!(counters.ops.function_writes, 1);
    assert_eq!(counters.ops.writes_failed, 0);
}
