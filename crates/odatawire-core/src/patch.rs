//! Partial-update support: a view of an entity type limited to the members
//! a payload actually touches.

use crate::{
    error::{NameKind, ResolveError},
    model::{NavigationProperty, SchemaCatalog, SchemaType, StructuralProperty, TypeId},
    resolve::resolve_member,
    value::EntityData,
};
use odatawire_utils::NameResolver;

///
/// ViewMember
///
/// A payload key resolved against both member families of a view.
///

#[derive(Clone, Copy, Debug)]
#[remain::sorted]
pub enum ViewMember<'c> {
    Navigation(&'c NavigationProperty),
    Structural(&'c StructuralProperty),
}

impl ViewMember<'_> {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Navigation(navigation) => &navigation.name,
            Self::Structural(property) => &property.name,
        }
    }
}

///
/// EntityView
///
/// The members of one entity type an entry write may declare. The full view
/// exposes every inherited member; a narrowed view only the ones named by a
/// patch payload, in payload order.
///

#[derive(Clone, Debug)]
pub struct EntityView<'c> {
    catalog: &'c SchemaCatalog,
    type_id: TypeId,
    structural: Vec<&'c StructuralProperty>,
    navigation: Vec<&'c NavigationProperty>,
    narrowed: bool,
}

impl<'c> EntityView<'c> {
    #[must_use]
    pub fn full(catalog: &'c SchemaCatalog, type_id: TypeId) -> Self {
        Self {
            catalog,
            type_id,
            structural: catalog.structural_properties(type_id),
            navigation: catalog.navigation_properties(type_id),
            narrowed: false,
        }
    }

    /// Narrow the view to the members named by `data`.
    ///
    /// Structural and navigation members are ranked together, so an exact
    /// navigation match beats a fuzzy structural one. A key matching
    /// neither fails the write.
    pub fn narrowed(
        catalog: &'c SchemaCatalog,
        type_id: TypeId,
        data: &EntityData,
        resolver: &NameResolver<'_>,
    ) -> Result<Self, ResolveError> {
        let full = Self::full(catalog, type_id);

        let mut structural: Vec<&'c StructuralProperty> = Vec::new();
        let mut navigation: Vec<&'c NavigationProperty> = Vec::new();

        for key in data.keys() {
            match full.resolve_key(resolver, key)? {
                ViewMember::Navigation(link) => {
                    if !navigation.iter().any(|n| std::ptr::eq(*n, link)) {
                        navigation.push(link);
                    }
                }
                ViewMember::Structural(property) => {
                    if !structural.iter().any(|p| std::ptr::eq(*p, property)) {
                        structural.push(property);
                    }
                }
            }
        }

        Ok(Self {
            catalog,
            type_id,
            structural,
            navigation,
            narrowed: true,
        })
    }

    /// Fuzzy lookup of `key` among every member of the view.
    pub fn resolve_key(&self, resolver: &NameResolver<'_>, key: &str) -> Result<ViewMember<'c>, ResolveError> {
        let members: Vec<ViewMember<'c>> = self
            .structural
            .iter()
            .copied()
            .map(ViewMember::Structural)
            .chain(self.navigation.iter().copied().map(ViewMember::Navigation))
            .collect();

        resolve_member(
            resolver,
            &members,
            ViewMember::name,
            NameKind::Property,
            key,
            &self.entity_type().full_name,
        )
        .copied()
    }

    #[must_use]
    pub const fn catalog(&self) -> &'c SchemaCatalog {
        self.catalog
    }

    #[must_use]
    pub const fn type_id(&self) -> TypeId {
        self.type_id
    }

    #[must_use]
    pub fn entity_type(&self) -> &'c SchemaType {
        self.catalog.get(self.type_id)
    }

    #[must_use]
    pub fn structural(&self) -> &[&'c StructuralProperty] {
        &self.structural
    }

    #[must_use]
    pub fn navigation(&self) -> &[&'c NavigationProperty] {
        &self.navigation
    }

    #[must_use]
    pub const fn is_narrowed(&self) -> bool {
        self.narrowed
    }

    /// Declared names of every member in the view.
    pub fn member_names(&self) -> impl Iterator<Item = &'c str> + '_ {
        self.structural
            .iter()
            .copied()
            .map(|p| p.name.as_str())
            .chain(self.navigation.iter().copied().map(|n| n.name.as_str()))
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{resolver, shadowed_catalog, shop_catalog, type_id};
    use proptest::{prelude::*, sample::subsequence};
    use std::collections::BTreeSet;

    const CUSTOMER_MEMBERS: [&str; 7] = [
        "Id",
        "Name",
        "Email",
        "Tier",
        "Address",
        "Orders",
        "Preferences",
    ];

    #[test]
    fn full_view_includes_inherited_members() {
        let catalog = shop_catalog();
        let view = EntityView::full(&catalog, type_id(&catalog, "Customer"));

        assert!(!view.is_narrowed());
        assert_eq!(view.member_names().collect::<Vec<_>>(), CUSTOMER_MEMBERS);
    }

    #[test]
    fn narrowing_keeps_payload_order_and_resolves_fuzzily() {
        let catalog = shop_catalog();
        let data = EntityData::new()
            .with("email", "a@b.c")
            .with("Order", crate::value::HostValue::Null)
            .with("Name", "Ann");

        let view = EntityView::narrowed(&catalog, type_id(&catalog, "Customer"), &data, &resolver())
            .unwrap();

        assert!(view.is_narrowed());
        assert_eq!(
            view.member_names().collect::<Vec<_>>(),
            ["Email", "Name", "Orders"]
        );
    }

    #[test]
    fn unknown_payload_keys_fail() {
        let catalog = shop_catalog();
        let data = EntityData::new().with("Shoe", 42);

        let err = EntityView::narrowed(&catalog, type_id(&catalog, "Customer"), &data, &resolver())
            .unwrap_err();

        assert_eq!(err.name(), "Shoe");
        assert_eq!(err.owner(), "Shop.Customer");
        assert_eq!(err.kind(), NameKind::Property);
    }

    #[test]
    fn exact_navigation_beats_plural_structural() {
        let catalog = shadowed_catalog();
        let view = EntityView::full(&catalog, type_id(&catalog, "Customer"));

        let member = view.resolve_key(&resolver(), "Orders").unwrap();
        assert!(matches!(member, ViewMember::Navigation(n) if n.name == "Orders"));

        let member = view.resolve_key(&resolver(), "order").unwrap();
        assert!(matches!(member, ViewMember::Structural(p) if p.name == "Order"));
    }

    #[test]
    fn narrowing_ranks_both_member_families_together() {
        let catalog = shadowed_catalog();
        let data = EntityData::new()
            .with("Orders", crate::value::HostValue::Null)
            .with("Id", 1);

        let view = EntityView::narrowed(&catalog, type_id(&catalog, "Customer"), &data, &resolver())
            .unwrap();

        assert!(view.structural().iter().all(|p| p.name != "Order"));
        assert_eq!(view.member_names().collect::<Vec<_>>(), ["Id", "Orders"]);
    }

    proptest! {
        #[test]
        fn narrowed_members_equal_the_payload_keys(
            keys in subsequence(CUSTOMER_MEMBERS.to_vec(), 0..=CUSTOMER_MEMBERS.len())
        ) {
            let catalog = shop_catalog();
            let data: EntityData = keys
                .iter()
                .map(|key| ((*key).to_string(), crate::value::HostValue::Null))
                .collect();

            let view = EntityView::narrowed(&catalog, type_id(&catalog, "Customer"), &data, &resolver())
                .unwrap();

            let declared: BTreeSet<_> = view.member_names().collect();
            let expected: BTreeSet<_> = keys.iter().copied().collect();
            prop_assert_eq!(declared, expected);
        }
    }
}
