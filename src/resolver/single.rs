//! Single-credential resolution

use std::sync::Arc;

use crate::error::Result;
use crate::rules::{intersection, union, AccessRuleSet};
use crate::store::{CombinationMode, RoleStore};
use crate::token::SimpleToken;

/// Resolves one non-composite credential to its rule set.
///
/// Exactly one of the two combination strategies applies per call,
/// selected by the store's persistent migration marker:
///
/// - **Union mode**: the union of the rules of every matched role,
///   regardless of member weight. No matches resolve to an empty set.
/// - **Priority mode** (legacy, kept for migration windows): only the
///   matches at the highest member weight are retained, ties together,
///   and their rules are intersected under a root-level allow seed. No
///   matches at all resolve to an empty set: the seed is never applied
///   to an unmatched identity.
pub struct RoleResolver {
    store: Arc<dyn RoleStore>,
}

impl RoleResolver {
    pub fn new(store: Arc<dyn RoleStore>) -> Self {
        Self { store }
    }

    /// Resolves `token`, never looking at nested identities.
    ///
    /// A universal-access token short-cuts role matching entirely: if its
    /// self match succeeds it receives a single root-level allow; if not,
    /// it is degraded to an empty set rather than surfacing an error.
    ///
    /// # Errors
    ///
    /// Propagates [`AuthzError::AuthenticationFailed`] from the store's
    /// matching query uncaught.
    ///
    /// [`AuthzError::AuthenticationFailed`]: crate::AuthzError::AuthenticationFailed
    pub async fn resolve(&self, token: &SimpleToken) -> Result<AccessRuleSet> {
        if token.is_universal_access() {
            if token.matches_self() {
                return Ok(AccessRuleSet::universal());
            }
            tracing::debug!(
                key = token.key(),
                "universal-access token failed its self match, denying everything"
            );
            return Ok(AccessRuleSet::new());
        }

        let matches = self.store.find_matches(token).await?;
        match self.store.combination_mode().await? {
            CombinationMode::Union => {
                let mut rules = AccessRuleSet::new();
                for matched in &matches {
                    rules = union(&rules, &matched.role.rules);
                }
                Ok(rules)
            }
            CombinationMode::Priority => {
                let Some(max_weight) = matches.iter().map(|m| m.weight).max() else {
                    return Ok(AccessRuleSet::new());
                };
                let mut rules = AccessRuleSet::universal();
                for matched in matches.iter().filter(|m| m.weight == max_weight) {
                    rules = intersection(&rules, &matched.role.rules);
                }
                Ok(rules)
            }
        }
    }
}
