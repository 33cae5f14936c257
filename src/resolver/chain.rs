//! Delegation-chain resolution

use std::sync::Arc;

use async_trait::async_trait;

use super::single::RoleResolver;
use super::{AuthorizationResult, RuleSetSource};
use crate::error::Result;
use crate::rules::{intersection, AccessRuleSet};
use crate::store::{CertificateStatusStore, RoleStore};
use crate::token::AuthenticationToken;

/// Resolves possibly-composite identities; the function the cache invokes
/// on a miss.
///
/// A delegated identity's effective rights are the intersection of the
/// outer credential's own rights with every chain link's independently
/// resolved rights, and can never exceed the weakest link. A composite
/// identity whose outer certificate is no longer usable is rejected
/// outright before any link is evaluated.
pub struct ChainResolver {
    store: Arc<dyn RoleStore>,
    certificates: Arc<dyn CertificateStatusStore>,
    roles: RoleResolver,
}

impl ChainResolver {
    pub fn new(
        store: Arc<dyn RoleStore>,
        certificates: Arc<dyn CertificateStatusStore>,
    ) -> Self {
        let roles = RoleResolver::new(Arc::clone(&store));
        Self {
            store,
            certificates,
            roles,
        }
    }

    /// Resolves the complete rule set for `token`.
    ///
    /// Only the outermost credential's revocation status is checked, and
    /// only when the identity is composite: a bare credential is not a
    /// delegation proxy. Nested links are resolved one level deep each,
    /// in chain order, without recursing into their own nesting.
    ///
    /// The policy version in the result is read after resolution, so a
    /// policy change that lands mid-computation is captured by the version
    /// rather than silently missed.
    pub async fn resolve_chain(&self, token: &AuthenticationToken) -> Result<AuthorizationResult> {
        if token.is_composite() {
            if let Some(certificate) = token.outer().certificate() {
                let status = self
                    .certificates
                    .status_of(&certificate.issuer, &certificate.serial)
                    .await?;
                if let Some(status) = status {
                    if !status.permits_use() {
                        tracing::error!(
                            issuer = %certificate.issuer,
                            serial = %certificate.serial,
                            ?status,
                            "delegating credential is revoked or expired, denying everything"
                        );
                        let version = self.store.policy_version().await?;
                        return Ok(AuthorizationResult {
                            rules: AccessRuleSet::new(),
                            version,
                        });
                    }
                }
            }
        }

        let mut rules = self.roles.resolve(token.outer()).await?;
        for link in token.nested() {
            let link_rules = self.roles.resolve(link).await?;
            rules = intersection(&rules, &link_rules);
        }

        if tracing::enabled!(tracing::Level::DEBUG) {
            tracing::debug!(
                key = %token.cache_key(),
                "resolved access rules:\n{}",
                rules.describe()
            );
        }

        let version = self.store.policy_version().await?;
        Ok(AuthorizationResult { rules, version })
    }
}

#[async_trait]
impl RuleSetSource for ChainResolver {
    async fn resolve(&self, token: &AuthenticationToken) -> Result<AuthorizationResult> {
        self.resolve_chain(token).await
    }

    async fn policy_version(&self) -> Result<u64> {
        self.store.policy_version().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuthzError;
    use crate::store::{
        CertificateStatus, InMemoryCertificateStatusStore, InMemoryRoleStore, Role, RoleMember,
    };
    use crate::token::{CertificateIdentifier, SimpleToken};

    fn fixture() -> (Arc<InMemoryRoleStore>, Arc<InMemoryCertificateStatusStore>) {
        let roles = Arc::new(InMemoryRoleStore::new());
        let certificates = Arc::new(InMemoryCertificateStatusStore::new());
        (roles, certificates)
    }

    fn resolver(
        roles: &Arc<InMemoryRoleStore>,
        certificates: &Arc<InMemoryCertificateStatusStore>,
    ) -> ChainResolver {
        ChainResolver::new(
            Arc::clone(roles) as Arc<dyn RoleStore>,
            Arc::clone(certificates) as Arc<dyn CertificateStatusStore>,
        )
    }

    fn grant(store: &InMemoryRoleStore, key_pattern: &str, name: &str, rules: AccessRuleSet) {
        store.upsert_role(Role::new(name, rules));
        store.add_member(RoleMember::new(key_pattern, 0, name));
    }

    #[tokio::test]
    async fn test_chain_intersects_every_link() {
        let (roles, certificates) = fixture();
        grant(&roles, "cn:proxy", "proxy", [("/", true)].into_iter().collect());
        grant(&roles, "cn:alice", "alice", [("/a", false)].into_iter().collect());

        let chain = resolver(&roles, &certificates);
        let token = AuthenticationToken::delegated(
            SimpleToken::new("cn:proxy"),
            vec![SimpleToken::new("cn:alice")],
        );
        let result = chain.resolve_chain(&token).await.unwrap();

        // "/" was outer-only and is dropped; "/a" is shared via ancestor
        // semantics at lookup time, not at merge time
        assert_eq!(result.rules.len(), 0);
    }

    #[tokio::test]
    async fn test_chain_intersection_keeps_shared_keys() {
        let (roles, certificates) = fixture();
        grant(
            &roles,
            "cn:proxy",
            "proxy",
            [("/", true), ("/a", true)].into_iter().collect(),
        );
        grant(&roles, "cn:alice", "alice", [("/a", false)].into_iter().collect());

        let chain = resolver(&roles, &certificates);
        let token = AuthenticationToken::delegated(
            SimpleToken::new("cn:proxy"),
            vec![SimpleToken::new("cn:alice")],
        );
        let result = chain.resolve_chain(&token).await.unwrap();

        assert_eq!(result.rules.rule_for("/a"), Some(false));
        assert_eq!(result.rules.rule_for("/"), None);
        assert_eq!(result.rules.len(), 1);
    }

    #[tokio::test]
    async fn test_revoked_outer_certificate_short_circuits() {
        let (roles, certificates) = fixture();
        grant(&roles, "*", "everyone", [("/", true)].into_iter().collect());
        certificates.set_status("CN=Root", "1234", CertificateStatus::Revoked);

        let chain = resolver(&roles, &certificates);
        let token = AuthenticationToken::delegated(
            SimpleToken::new("cn:proxy")
                .with_certificate(CertificateIdentifier::new("CN=Root", "1234")),
            vec![SimpleToken::new("cn:alice")],
        );
        let result = chain.resolve_chain(&token).await.unwrap();
        assert!(result.rules.is_empty());
    }

    #[tokio::test]
    async fn test_notified_about_expiration_still_permits_use() {
        let (roles, certificates) = fixture();
        grant(&roles, "*", "everyone", [("/", true)].into_iter().collect());
        certificates.set_status("CN=Root", "1234", CertificateStatus::NotifiedAboutExpiration);

        let chain = resolver(&roles, &certificates);
        let token = AuthenticationToken::delegated(
            SimpleToken::new("cn:proxy")
                .with_certificate(CertificateIdentifier::new("CN=Root", "1234")),
            vec![SimpleToken::new("cn:alice")],
        );
        let result = chain.resolve_chain(&token).await.unwrap();
        assert_eq!(result.rules.rule_for("/"), Some(true));
    }

    #[tokio::test]
    async fn test_unknown_certificate_is_not_rejected() {
        let (roles, certificates) = fixture();
        grant(&roles, "*", "everyone", [("/", true)].into_iter().collect());

        let chain = resolver(&roles, &certificates);
        let token = AuthenticationToken::delegated(
            SimpleToken::new("cn:proxy")
                .with_certificate(CertificateIdentifier::new("CN=Root", "9999")),
            vec![SimpleToken::new("cn:alice")],
        );
        let result = chain.resolve_chain(&token).await.unwrap();
        assert_eq!(result.rules.rule_for("/"), Some(true));
    }

    #[tokio::test]
    async fn test_bare_certificate_token_skips_revocation_check() {
        let (roles, certificates) = fixture();
        grant(&roles, "*", "everyone", [("/", true)].into_iter().collect());
        certificates.set_status("CN=Root", "1234", CertificateStatus::Revoked);

        let chain = resolver(&roles, &certificates);
        // not composite, so not acting as a delegation proxy
        let token = AuthenticationToken::simple(
            SimpleToken::new("cn:alice")
                .with_certificate(CertificateIdentifier::new("CN=Root", "1234")),
        );
        let result = chain.resolve_chain(&token).await.unwrap();
        assert_eq!(result.rules.rule_for("/"), Some(true));
    }

    #[tokio::test]
    async fn test_nested_authentication_failure_propagates() {
        let (roles, certificates) = fixture();
        grant(&roles, "cn:proxy", "proxy", [("/", true)].into_iter().collect());

        let chain = resolver(&roles, &certificates);
        let token = AuthenticationToken::delegated(
            SimpleToken::new("cn:proxy"),
            vec![SimpleToken::new("cn:alice").invalidated()],
        );
        let result = chain.resolve_chain(&token).await;
        assert!(matches!(result, Err(AuthzError::AuthenticationFailed(_))));
    }

    #[tokio::test]
    async fn test_version_is_stamped_on_result() {
        let (roles, certificates) = fixture();
        grant(&roles, "*", "everyone", [("/", true)].into_iter().collect());

        let chain = resolver(&roles, &certificates);
        let token = AuthenticationToken::simple(SimpleToken::new("cn:alice"));
        let result = chain.resolve_chain(&token).await.unwrap();
        assert_eq!(result.version, roles.policy_version().await.unwrap());
    }
}
