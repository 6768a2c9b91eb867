use convert_case::{Case, Casing};

/// Normalize a name for case- and separator-insensitive comparison.
///
/// `OrderId`, `order_id`, `ORDER-ID` and `orderId` all homogenize to
/// `orderid`.
#[must_use]
pub fn homogenize(name: &str) -> String {
    name.to_case(Case::Flat)
}
