#![allow(dead_code)]

use odatawire_core::{
    message::RequestBody,
    model::{CatalogBuilder, SchemaCatalog},
};
use serde_json::Value;

/// Storefront schema shared by the request tests.
pub fn catalog() -> SchemaCatalog {
    let mut builder = CatalogBuilder::new("Shop");

    builder
        .entity_type("Customer")
        .key(&["Id"])
        .property("Id", "Edm.Int32")
        .property("Name", "Edm.String")
        .property("Email", "Edm.String")
        .navigation("Orders", "Collection(Shop.Order)");
    builder
        .entity_type("Order")
        .key(&["Id"])
        .property("Id", "Edm.Int32")
        .property("Total", "Edm.Decimal")
        .navigation("Customer", "Shop.Customer");
    builder
        .entity_type("Product")
        .key(&["Id"])
        .property("Id", "Edm.Int32")
        .property("Name", "Edm.String")
        .property("Price", "Edm.Decimal");

    builder
        .entity_set("Customers", "Customer")
        .entity_set("Orders", "Order")
        .entity_set("Products", "Product");

    builder.action("Transfer").parameter("Amount", "Edm.Decimal");
    builder.action("Checkout").parameter("Customer", "Shop.Customer");
    builder
        .function("TopProducts")
        .parameter("Count", "Edm.Int32")
        .returns("Collection(Shop.Product)");

    builder.build().expect("test catalog builds")
}

pub fn json(body: &RequestBody) -> Value {
    serde_json::from_str(body.text().expect("utf-8 body")).expect("json body")
}
