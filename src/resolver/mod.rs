//! Identity resolution.
//!
//! [`RoleResolver`] reduces a single credential to its rule set using the
//! combination algorithm currently in force; [`ChainResolver`] extends it
//! to delegation chains with a revocation short-circuit and stamps every
//! result with the policy version read at computation time.

mod chain;
mod single;

pub use chain::ChainResolver;
pub use single::RoleResolver;

use async_trait::async_trait;

use crate::error::Result;
use crate::rules::AccessRuleSet;
use crate::token::AuthenticationToken;

/// Transient resolver output: the resolved rules and the policy version
/// they were computed under. Folded into a cache entry, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationResult {
    pub rules: AccessRuleSet,
    pub version: u64,
}

/// What the cache calls on a miss or stale entry.
///
/// Decouples the cache from the concrete resolver, which also lets tests
/// count resolver invocations.
#[async_trait]
pub trait RuleSetSource: Send + Sync {
    /// Resolves the complete rule set for an identity.
    async fn resolve(&self, token: &AuthenticationToken) -> Result<AuthorizationResult>;

    /// The current policy version, for staleness checks.
    async fn policy_version(&self) -> Result<u64>;
}
