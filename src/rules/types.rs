//! Rule-set type and resource-path normalization

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Normalizes a resource path: a leading `/` is enforced and trailing
/// slashes are stripped, so `"ca/issue/"` and `"/ca/issue"` address the
/// same rule. The root resource is `"/"`.
pub(crate) fn normalize_resource(resource: &str) -> String {
    let mut path = if resource.starts_with('/') {
        resource.to_string()
    } else {
        format!("/{resource}")
    };
    while path.len() > 1 && path.ends_with('/') {
        path.pop();
    }
    path
}

/// A mapping from resource path to an explicit allow/deny rule.
///
/// Absence of a path means "no explicit rule at this exact path"; the
/// effective decision for a path is determined by the ancestor search in
/// [`has_access`](crate::rules::has_access), defaulting to deny when no
/// ancestor carries an entry.
///
/// # Examples
///
/// ```
/// use authz_core::{has_access, AccessRuleSet};
///
/// let rules: AccessRuleSet = [("/", false), ("/ca", true)].into_iter().collect();
/// assert!(has_access(&rules, "/ca/issue"));
/// assert!(!has_access(&rules, "/ra"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessRuleSet {
    rules: HashMap<String, bool>,
}

impl AccessRuleSet {
    /// Creates an empty rule set: no explicit rules, everything denied.
    pub fn new() -> Self {
        Self::default()
    }

    /// A single root-level allow, which the ancestor search applies to
    /// every path.
    pub fn universal() -> Self {
        let mut rules = Self::new();
        rules.set("/", true);
        rules
    }

    /// Sets the explicit rule for a resource, normalizing the path.
    pub fn set(&mut self, resource: &str, allowed: bool) {
        self.rules.insert(normalize_resource(resource), allowed);
    }

    /// The explicit rule stored at exactly this path, if any.
    pub fn rule_for(&self, path: &str) -> Option<bool> {
        self.rules.get(path).copied()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &bool)> {
        self.rules.iter()
    }

    /// Sorted multi-line dump of the rule set for debug logging.
    pub fn describe(&self) -> String {
        let mut resources: Vec<&String> = self.rules.keys().collect();
        resources.sort();
        let mut out = String::new();
        for resource in resources {
            if self.rules[resource] {
                out.push_str(" allow ");
            } else {
                out.push_str(" deny  ");
            }
            out.push_str(resource);
            out.push('\n');
        }
        out
    }
}

impl<S: Into<String>> FromIterator<(S, bool)> for AccessRuleSet {
    fn from_iter<I: IntoIterator<Item = (S, bool)>>(iter: I) -> Self {
        let mut rules = Self::new();
        for (resource, allowed) in iter {
            let resource: String = resource.into();
            rules.set(&resource, allowed);
        }
        rules
    }
}
