use crate::{
    model::{CatalogBuilder, SchemaCatalog, TypeId, TypeRef},
    resolve::resolver_for,
};
use odatawire_config::WriterConfig;
use odatawire_utils::NameResolver;

///
/// shop_catalog
///
/// Small storefront schema shared by unit tests: an abstract keyed base
/// type, an inherited key, a composite key, a singleton, a complex type
/// with a type definition, an enum, and a handful of operations.
///
pub(crate) fn shop_catalog() -> SchemaCatalog {
    let mut builder = CatalogBuilder::new("Shop");

    builder
        .entity_type("Party")
        .abstract_type()
        .key(&["Id"])
        .property("Id", "Edm.Int32")
        .property("Name", "Edm.String");
    builder
        .entity_type("Customer")
        .base("Party")
        .property("Email", "Edm.String")
        .property("Tier", "Shop.Tier")
        .property("Address", "Shop.Address")
        .navigation("Orders", "Collection(Shop.Order)")
        .navigation("Preferences", "Shop.Settings");
    builder
        .entity_type("Order")
        .key(&["OrderId"])
        .property("OrderId", "Edm.Int64")
        .property("Total", "Edm.Decimal")
        .property("Tags", "Collection(Edm.String)")
        .property("Legacy", "Vendor.Blob")
        .navigation("Customer", "Shop.Customer")
        .navigation("Lines", "Collection(Shop.OrderLine)");
    builder
        .entity_type("OrderLine")
        .key(&["OrderId", "Sku"])
        .property("OrderId", "Edm.Int64")
        .property("Sku", "Shop.Sku")
        .property("Qty", "Edm.Int32");
    builder
        .entity_type("Product")
        .key(&["Id"])
        .property("Id", "Edm.Int32")
        .property("Name", "Edm.String")
        .property("Price", "Edm.Decimal");
    builder
        .entity_type("Settings")
        .key(&["Id"])
        .property("Id", "Edm.Int32")
        .property("Theme", "Edm.String");
    builder
        .complex_type("Address")
        .property("Street", "Edm.String")
        .property("City", "Edm.String")
        .property("Zip", "Shop.Sku");
    builder.enum_type("Tier", &["Bronze", "Silver", "Gold"]);
    builder.type_definition("Sku", odatawire_primitives::PrimitiveKind::String);

    builder
        .entity_set("People", "Party")
        .entity_set("Orders", "Order")
        .entity_set("OrderLines", "OrderLine")
        .entity_set("Products", "Product")
        .singleton("Settings", "Settings");

    builder.action("Transfer").parameter("Amount", "Edm.Decimal");
    builder
        .action("Register")
        .parameter("Customer", "Shop.Customer")
        .parameter("Orders", "Collection(Shop.Order)")
        .parameter("Tags", "Collection(Edm.String)")
        .parameter("Tier", "Shop.Tier")
        .parameter("Address", "Shop.Address")
        .parameter("Note", "Edm.String");
    builder
        .action("Annotate")
        .parameter("Payload", "Edm.Untyped")
        .parameter("Target", "Ref(Shop.Order)");
    builder
        .function("TopProducts")
        .parameter("Count", "Edm.Int32")
        .returns("Collection(Shop.Product)");

    builder.build().expect("shop catalog builds")
}

///
/// shadowed_catalog
///
/// An entity whose structural `Order` sits next to a navigation `Orders`,
/// so plural folding alone cannot tell the two members apart.
///

pub(crate) fn shadowed_catalog() -> SchemaCatalog {
    let mut builder = CatalogBuilder::new("P");

    builder
        .entity_type("Ord")
        .key(&["Id"])
        .property("Id", "Edm.Int32");
    builder
        .entity_type("Customer")
        .key(&["Id"])
        .property("Id", "Edm.Int32")
        .property("Order", "Edm.String")
        .navigation("Orders", "Collection(P.Ord)");

    builder.entity_set("Ords", "Ord").entity_set("Customers", "Customer");

    builder.build().expect("shadowed catalog builds")
}

pub(crate) fn type_id(catalog: &SchemaCatalog, name: &str) -> TypeId {
    catalog.find_type(name).expect("fixture type exists").id
}

pub(crate) fn named(catalog: &SchemaCatalog, name: &str) -> TypeRef {
    TypeRef::Named(type_id(catalog, name))
}

pub(crate) fn resolver() -> NameResolver<'static> {
    resolver_for(&WriterConfig::default())
}
