//! Pure set algebra over rule sets

use super::types::AccessRuleSet;

/// Union of two rule sets: any matching side may grant the right.
///
/// The result carries every key of either operand. A key present in both
/// maps to the OR of the two values; a key present in only one is copied
/// as-is, including an explicit `false`, which wins by presence.
pub fn union(a: &AccessRuleSet, b: &AccessRuleSet) -> AccessRuleSet {
    let mut merged = a.clone();
    for (resource, allowed) in b.iter() {
        let value = match a.rule_for(resource) {
            Some(existing) => existing || *allowed,
            None => *allowed,
        };
        merged.set(resource, value);
    }
    merged
}

/// Intersection of two rule sets: both sides must independently agree.
///
/// Only keys present in both operands survive, mapped to the AND of the
/// two values. A key present in only one operand is dropped entirely
/// rather than defaulted, which preserves the ancestor-fallback semantics
/// of the matcher for that key at lookup time.
pub fn intersection(a: &AccessRuleSet, b: &AccessRuleSet) -> AccessRuleSet {
    let mut result = AccessRuleSet::new();
    for (resource, allowed) in a.iter() {
        if let Some(other) = b.rule_for(resource) {
            result.set(resource, *allowed && other);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_union_or_on_shared_keys() {
        let a: AccessRuleSet = [("/ca", true), ("/ra", false)].into_iter().collect();
        let b: AccessRuleSet = [("/ca", false), ("/ra", false)].into_iter().collect();
        let merged = union(&a, &b);
        assert_eq!(merged.rule_for("/ca"), Some(true));
        assert_eq!(merged.rule_for("/ra"), Some(false));
    }

    #[test]
    fn test_union_copies_one_sided_keys() {
        let a: AccessRuleSet = [("/", true)].into_iter().collect();
        let b: AccessRuleSet = [("/ra", false)].into_iter().collect();
        let merged = union(&a, &b);
        assert_eq!(merged.rule_for("/"), Some(true));
        // false wins by presence, not special-cased
        assert_eq!(merged.rule_for("/ra"), Some(false));
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_intersection_and_on_shared_keys() {
        let a: AccessRuleSet = [("/ca", true), ("/ra", true)].into_iter().collect();
        let b: AccessRuleSet = [("/ca", true), ("/ra", false)].into_iter().collect();
        let result = intersection(&a, &b);
        assert_eq!(result.rule_for("/ca"), Some(true));
        assert_eq!(result.rule_for("/ra"), Some(false));
    }

    #[test]
    fn test_intersection_drops_one_sided_keys() {
        let a: AccessRuleSet = [("/", true), ("/ca", true)].into_iter().collect();
        let b: AccessRuleSet = [("/ca", true)].into_iter().collect();
        let result = intersection(&a, &b);
        assert_eq!(result.rule_for("/"), None);
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_with_empty_operand() {
        let a: AccessRuleSet = [("/ca", true)].into_iter().collect();
        let empty = AccessRuleSet::new();
        assert_eq!(union(&a, &empty), a);
        assert!(intersection(&a, &empty).is_empty());
    }

    fn keys(rules: &AccessRuleSet) -> BTreeSet<String> {
        rules.iter().map(|(resource, _)| resource.clone()).collect()
    }

    fn arb_rules() -> impl Strategy<Value = AccessRuleSet> {
        let resource = prop_oneof![
            Just("/"),
            Just("/ca"),
            Just("/ca/issue"),
            Just("/ca/renew"),
            Just("/ra"),
            Just("/ra/approve"),
            Just("/audit"),
        ];
        proptest::collection::vec((resource, any::<bool>()), 0..6)
            .prop_map(|entries| entries.into_iter().collect())
    }

    proptest! {
        #[test]
        fn prop_union_key_set(a in arb_rules(), b in arb_rules()) {
            let merged = union(&a, &b);
            let expected: BTreeSet<String> = keys(&a).union(&keys(&b)).cloned().collect();
            prop_assert_eq!(keys(&merged), expected);
        }

        #[test]
        fn prop_intersection_key_set(a in arb_rules(), b in arb_rules()) {
            let result = intersection(&a, &b);
            let expected: BTreeSet<String> =
                keys(&a).intersection(&keys(&b)).cloned().collect();
            prop_assert_eq!(keys(&result), expected);
        }

        #[test]
        fn prop_union_commutative(a in arb_rules(), b in arb_rules()) {
            prop_assert_eq!(union(&a, &b), union(&b, &a));
        }

        #[test]
        fn prop_intersection_commutative(a in arb_rules(), b in arb_rules()) {
            prop_assert_eq!(intersection(&a, &b), intersection(&b, &a));
        }

        #[test]
        fn prop_union_associative(a in arb_rules(), b in arb_rules(), c in arb_rules()) {
            prop_assert_eq!(union(&union(&a, &b), &c), union(&a, &union(&b, &c)));
        }

        #[test]
        fn prop_intersection_associative(a in arb_rules(), b in arb_rules(), c in arb_rules()) {
            prop_assert_eq!(
                intersection(&intersection(&a, &b), &c),
                intersection(&a, &intersection(&b, &c))
            );
        }
    }
}
