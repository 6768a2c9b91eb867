mod support;

use odatawire_config::WriterConfig;
use odatawire_core::{
    batch::{BatchWriter, ContentId},
    request::{EntryRequest, LinkRequest, Method, RequestWriter},
    value::{EntityData, HostValue},
};
use std::sync::Arc;
use support::catalog;

#[tokio::test]
async fn later_operations_reference_earlier_content_ids() {
    let catalog = catalog();
    let config = WriterConfig::default();
    let batch = BatchWriter::with_boundary("batch_orders");
    let writer = RequestWriter::batched(&catalog, &config, &batch);

    let customer = EntityData::new().with("Id", 1).with("Name", "Ann");
    let created = writer
        .write_entry(EntryRequest {
            method: Method::Post,
            collection: "Customers",
            command_text: "Customers",
            entry_data: &customer,
            result_required: true,
        })
        .await
        .unwrap();
    assert!(created.is_none());

    let order = EntityData::new()
        .with("Id", 2)
        .with("Customer", HostValue::Map(customer.clone()));
    writer
        .write_entry(EntryRequest {
            method: Method::Post,
            collection: "Orders",
            command_text: "Orders",
            entry_data: &order,
            result_required: false,
        })
        .await
        .unwrap();

    assert_eq!(batch.content_ids(), [ContentId::new(1), ContentId::new(2)]);

    let body = batch.finish();
    let text = body.text().unwrap();
    assert!(text.contains("Content-ID: 1\r\n\r\nPOST Customers HTTP/1.1\r\n"));
    assert!(text.contains("Prefer: return=representation\r\n"));
    assert!(text.contains(r#""Customer@odata.bind":"$1""#));
    assert!(text.ends_with("--batch_orders--\r\n"));
}

#[tokio::test]
async fn bodyless_operations_are_still_registered() {
    let catalog = catalog();
    let config = WriterConfig::default();
    let batch = BatchWriter::with_boundary("b");
    let writer = RequestWriter::batched(&catalog, &config, &batch);
    let data = EntityData::new().with("Id", 3);

    writer
        .write_entry(EntryRequest {
            method: Method::Delete,
            collection: "Products",
            command_text: "Products(3)",
            entry_data: &data,
            result_required: false,
        })
        .await
        .unwrap();
    writer.write_function("TopProducts(Count=2)").await.unwrap();
    writer
        .write_link(LinkRequest {
            method: Method::Delete,
            entity_path: "Customers(1)",
            navigation: "Orders",
            link_ident: "Orders(2)",
        })
        .await
        .unwrap();

    let text = String::from_utf8(batch.finish().content).unwrap();
    assert!(text.contains("DELETE Products(3) HTTP/1.1\r\n\r\n"));
    assert!(text.contains("GET TopProducts(Count=2) HTTP/1.1\r\n"));
    assert!(text.contains("DELETE Customers(1)/Orders/$ref?$id=http://localhost/Orders(2) HTTP/1.1\r\n"));
    assert_eq!(batch.len(), 3);
}

#[tokio::test]
async fn failed_builds_leave_the_batch_untouched() {
    let catalog = catalog();
    let config = WriterConfig::default();
    let batch = BatchWriter::new();
    let writer = RequestWriter::batched(&catalog, &config, &batch);
    let data = EntityData::new().with("Colour", "red");

    let result = writer
        .write_entry(EntryRequest {
            method: Method::Post,
            collection: "Products",
            command_text: "Products",
            entry_data: &data,
            result_required: false,
        })
        .await;

    assert!(result.is_err());
    assert!(batch.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_writers_share_one_batch() {
    let catalog = Arc::new(catalog());
    let config = Arc::new(WriterConfig::default());
    let batch = BatchWriter::new();

    let tasks: Vec<_> = (1..=16)
        .map(|n| {
            let catalog = Arc::clone(&catalog);
            let config = Arc::clone(&config);
            let batch = batch.clone();

            tokio::spawn(async move {
                let writer = RequestWriter::batched(&catalog, &config, &batch);
                let data = EntityData::new().with("Id", n).with("Name", format!("p{n}"));

                writer
                    .write_entry(EntryRequest {
                        method: Method::Post,
                        collection: "Products",
                        command_text: "Products",
                        entry_data: &data,
                        result_required: false,
                    })
                    .await
            })
        })
        .collect();

    for task in tasks {
        assert!(task.await.unwrap().unwrap().is_none());
    }

    let mut ids: Vec<u64> = batch.content_ids().into_iter().map(ContentId::get).collect();
    ids.sort_unstable();
    assert_eq!(ids, (1..=16).collect::<Vec<_>>());
}
