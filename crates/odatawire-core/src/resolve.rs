//! Glue between the fuzzy resolver and the writer's error taxonomy.

use crate::{
    error::{NameKind, ResolveError},
    obs::sink::{self, MetricsEvent},
};
use odatawire_config::WriterConfig;
use odatawire_utils::{ENGLISH_PLURALIZER, NameMatch, NameResolver};

/// Resolver matching the configuration's pluralization setting.
pub(crate) fn resolver_for(config: &WriterConfig) -> NameResolver<'static> {
    if config.pluralize_names {
        NameResolver::new(Some(&ENGLISH_PLURALIZER))
    } else {
        NameResolver::without_pluralizer()
    }
}

/// Resolve `name` among `candidates`; a miss or a tie becomes
/// `UnresolvableName` owned by `owner`.
pub(crate) fn resolve_member<'a, T, I, F>(
    resolver: &NameResolver<'_>,
    candidates: I,
    name_of: F,
    kind: NameKind,
    name: &str,
    owner: &str,
) -> Result<&'a T, ResolveError>
where
    T: ?Sized + 'a,
    I: IntoIterator<Item = &'a T>,
    F: Fn(&T) -> &str,
{
    lookup_member(resolver, candidates, name_of, kind, name, owner)?
        .ok_or_else(|| ResolveError::unresolvable(kind, name, owner))
}

/// Like [`resolve_member`], but a plain miss is `Ok(None)` so the caller can
/// try another member family. A tie is still an error.
pub(crate) fn lookup_member<'a, T, I, F>(
    resolver: &NameResolver<'_>,
    candidates: I,
    name_of: F,
    kind: NameKind,
    name: &str,
    owner: &str,
) -> Result<Option<&'a T>, ResolveError>
where
    T: ?Sized + 'a,
    I: IntoIterator<Item = &'a T>,
    F: Fn(&T) -> &str,
{
    match resolver.best_match(candidates, &name_of, name) {
        NameMatch::Found { item, rank } => {
            sink::record(MetricsEvent::NameResolved {
                kind,
                rank: Some(rank),
            });

            Ok(Some(item))
        }
        NameMatch::Ambiguous { candidates, .. } => {
            sink::record(MetricsEvent::NameResolved { kind, rank: None });

            Err(ResolveError::UnresolvableName {
                kind,
                name: name.to_string(),
                owner: owner.to_string(),
                candidates: candidates
                    .into_iter()
                    .map(|c| name_of(c).to_string())
                    .collect(),
            })
        }
        NameMatch::NotFound => {
            sink::record(MetricsEvent::NameResolved { kind, rank: None });

            Ok(None)
        }
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Member {
        name: &'static str,
    }

    const MEMBERS: [Member; 3] = [
        Member { name: "OrderId" },
        Member { name: "order_id" },
        Member { name: "Lines" },
    ];

    #[test]
    fn plural_forms_resolve_when_enabled() {
        let resolver = resolver_for(&WriterConfig::default());
        let hit = resolve_member(&resolver, &MEMBERS, |m| m.name, NameKind::Property, "Line", "Order")
            .expect("plural match");

        assert_eq!(hit.name, "Lines");
    }

    #[test]
    fn plural_forms_miss_when_disabled() {
        let config = WriterConfig::default().with_pluralize_names(false);
        let resolver = resolver_for(&config);

        let err = resolve_member(&resolver, &MEMBERS, |m| m.name, NameKind::Property, "Line", "Order")
            .expect_err("no plural normalization");
        assert_eq!(err.name(), "Line");
        assert!(!err.is_ambiguous());
    }

    #[test]
    fn ties_report_their_candidates() {
        let resolver = resolver_for(&WriterConfig::default());

        let err = resolve_member(&resolver, &MEMBERS, |m| m.name, NameKind::Property, "orderId", "Order")
            .expect_err("two case-insensitive matches");
        assert_eq!(
            err,
            ResolveError::UnresolvableName {
                kind: NameKind::Property,
                name: "orderId".to_string(),
                owner: "Order".to_string(),
                candidates: vec!["OrderId".to_string(), "order_id".to_string()],
            }
        );
    }

    #[test]
    fn lookup_leaves_plain_misses_to_the_caller() {
        let resolver = resolver_for(&WriterConfig::default());

        let miss = lookup_member(&resolver, &MEMBERS, |m| m.name, NameKind::Property, "Total", "Order");
        assert!(matches!(miss, Ok(None)));

        let tie = lookup_member(&resolver, &MEMBERS, |m| m.name, NameKind::Property, "ORDERID", "Order");
        assert!(tie.is_err_and(|err| err.is_ambiguous()));
    }
}
