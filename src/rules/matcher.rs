//! Ancestor-based resource decision lookup

use super::types::{normalize_resource, AccessRuleSet};

/// Decides access to `resource` under `rules`.
///
/// Starting from the full path, each `/`-delimited level up to and
/// including the root is checked for an explicit rule; the first entry
/// found, walking from most specific to least specific, decides. If no
/// ancestor carries an entry the decision is deny.
///
/// Purely prefix/ancestor based: no wildcard or pattern matching.
///
/// # Examples
///
/// ```
/// use authz_core::{has_access, AccessRuleSet};
///
/// let rules: AccessRuleSet = [("/", false), ("/ca", true)].into_iter().collect();
/// assert!(has_access(&rules, "/ca/issue/ee"));
/// assert!(!has_access(&rules, "/ra"));
/// assert!(!has_access(&AccessRuleSet::new(), "/anything"));
/// ```
pub fn has_access(rules: &AccessRuleSet, resource: &str) -> bool {
    let mut path = normalize_resource(resource);
    loop {
        if let Some(allowed) = rules.rule_for(&path) {
            return allowed;
        }
        match path.rfind('/') {
            // "/ca" -> "/"
            Some(0) if path.len() > 1 => path.truncate(1),
            // "/ca/issue" -> "/ca"
            Some(idx) if idx > 0 => path.truncate(idx),
            // at the root with no entry
            _ => return false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn rules() -> AccessRuleSet {
        [("/", false), ("/ca", true), ("/ca/renew", false)]
            .into_iter()
            .collect()
    }

    #[test_case("/ca", true; "explicit allow")]
    #[test_case("/ca/issue", true; "inherits allow from ancestor")]
    #[test_case("/ca/issue/deep/path", true; "inherits allow from distant ancestor")]
    #[test_case("/ca/renew", false; "explicit deny wins over ancestor allow")]
    #[test_case("/ca/renew/sub", false; "inherits deny")]
    #[test_case("/ra", false; "falls back to root deny")]
    #[test_case("/", false; "explicit root deny")]
    fn test_decision(resource: &str, expected: bool) {
        assert_eq!(has_access(&rules(), resource), expected);
    }

    #[test]
    fn test_empty_rules_deny_everything() {
        assert!(!has_access(&AccessRuleSet::new(), "/anything"));
        assert!(!has_access(&AccessRuleSet::new(), "/"));
    }

    #[test]
    fn test_no_root_entry_defaults_to_deny() {
        let rules: AccessRuleSet = [("/ca", true)].into_iter().collect();
        assert!(!has_access(&rules, "/ra/approve"));
        assert!(!has_access(&rules, "/"));
    }

    #[test]
    fn test_trailing_slash_is_normalized() {
        assert!(has_access(&rules(), "/ca/issue/"));
        assert!(has_access(&rules(), "ca/issue"));
    }

    #[test]
    fn test_sibling_prefix_is_not_an_ancestor() {
        let rules: AccessRuleSet = [("/ca", true)].into_iter().collect();
        // "/cagroup" shares a string prefix with "/ca" but is a sibling
        assert!(!has_access(&rules, "/cagroup"));
    }
}
