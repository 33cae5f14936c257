//! The authorization session facade
//!
//! Wires resolver, cache and scheduler into the surface the rest of the
//! system calls. Explicitly constructed and injectable; there is no
//! process-wide singleton.

use std::sync::Arc;

use serde_json::json;

use crate::cache::{AuthorizationCache, CacheConfig, CacheStats};
use crate::error::{AuthzError, Result};
use crate::resolver::ChainResolver;
use crate::rules::{has_access, AccessRuleSet};
use crate::scheduler::RefreshScheduler;
use crate::store::{
    AuditEvent, AuditOutcome, AuditRecord, AuditSink, CertificateStatusStore, PeerCacheHolder,
    RoleStore,
};
use crate::token::AuthenticationToken;

/// Entry point for access checks.
///
/// # Examples
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use authz_core::{
///     AccessRuleSet, AuthenticationToken, AuthorizationSession, CacheConfig,
///     InMemoryCertificateStatusStore, InMemoryRoleStore, NoopPeerCache, Role, RoleMember,
///     SimpleToken, TracingAuditSink,
/// };
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let roles = Arc::new(InMemoryRoleStore::new());
/// roles.upsert_role(Role::new(
///     "ca-admins",
///     [("/ca", true)].into_iter().collect::<AccessRuleSet>(),
/// ));
/// roles.add_member(RoleMember::new("cn:*", 100, "ca-admins"));
///
/// let session = AuthorizationSession::new(
///     roles,
///     Arc::new(InMemoryCertificateStatusStore::new()),
///     Arc::new(NoopPeerCache),
///     Arc::new(TracingAuditSink),
///     Arc::new(CacheConfig::default()),
/// );
/// session.schedule_background_refresh();
///
/// let token = AuthenticationToken::simple(SimpleToken::new("cn:alice"));
/// assert!(session.is_authorized(&token, &["/ca/issue"]).await?);
/// # Ok(())
/// # }
/// ```
pub struct AuthorizationSession {
    cache: Arc<AuthorizationCache>,
    scheduler: RefreshScheduler,
    peers: Arc<dyn PeerCacheHolder>,
    audit: Arc<dyn AuditSink>,
}

impl AuthorizationSession {
    pub fn new(
        roles: Arc<dyn RoleStore>,
        certificates: Arc<dyn CertificateStatusStore>,
        peers: Arc<dyn PeerCacheHolder>,
        audit: Arc<dyn AuditSink>,
        config: Arc<CacheConfig>,
    ) -> Self {
        let resolver = Arc::new(ChainResolver::new(roles, certificates));
        let cache = Arc::new(AuthorizationCache::new(resolver, Arc::clone(&config)));
        let scheduler = RefreshScheduler::new(Arc::clone(&cache), config);
        Self {
            cache,
            scheduler,
            peers,
            audit,
        }
    }

    /// True iff the identity is authorized to every listed resource;
    /// short-circuits on the first denial. Successful checks are audited;
    /// a failed authentication is audited and treated as unauthorized.
    ///
    /// # Errors
    ///
    /// [`AuthzError::PolicyLookupUnavailable`] when a collaborator store
    /// cannot be reached; callers are expected to fail closed.
    pub async fn is_authorized(
        &self,
        token: &AuthenticationToken,
        resources: &[&str],
    ) -> Result<bool> {
        self.check(token, resources, true).await
    }

    /// Same decision as [`is_authorized`](Self::is_authorized) without
    /// audit records, for advisory checks such as menu visibility.
    /// Denials are logged at debug level only.
    pub async fn is_authorized_quiet(
        &self,
        token: &AuthenticationToken,
        resources: &[&str],
    ) -> Result<bool> {
        self.check(token, resources, false).await
    }

    async fn check(
        &self,
        token: &AuthenticationToken,
        resources: &[&str],
        audited: bool,
    ) -> Result<bool> {
        let rules = match self.cache.get(token).await {
            Ok(rules) => rules,
            Err(AuthzError::AuthenticationFailed(reason)) => {
                self.audit.record(AuditRecord {
                    event: AuditEvent::Authentication,
                    outcome: AuditOutcome::Failure,
                    subject: token.cache_key(),
                    details: json!({ "msg": reason }),
                });
                return Ok(false);
            }
            Err(error) => return Err(error),
        };

        let mut details = serde_json::Map::new();
        for (index, resource) in resources.iter().enumerate() {
            if has_access(&rules, resource) {
                if audited {
                    details.insert(format!("resource{index}"), json!(resource));
                }
                continue;
            }
            // no point in checking or reporting the rest once one
            // resource is denied
            if audited {
                tracing::info!(
                    key = %token.cache_key(),
                    resource = %resource,
                    "authorization denied"
                );
            } else {
                tracing::debug!(
                    key = %token.cache_key(),
                    resource = %resource,
                    "authorization denied"
                );
            }
            return Ok(false);
        }

        if audited {
            self.audit.record(AuditRecord {
                event: AuditEvent::AccessControl,
                outcome: AuditOutcome::Success,
                subject: token.cache_key(),
                details: details.into(),
            });
        }
        Ok(true)
    }

    /// The resolved, cached rule set for an identity, as displayed by
    /// administrative tooling.
    pub async fn access_available_to(
        &self,
        token: &AuthenticationToken,
    ) -> Result<AccessRuleSet> {
        self.cache.get(token).await
    }

    /// Empties the local cache, fans the invalidation out to peer caches,
    /// and arms an immediate refresh pass, so the reset is cluster-wide
    /// rather than only local.
    pub async fn force_cache_expire(&self) {
        tracing::trace!("force_cache_expire");
        self.cache.clear();
        self.peers.clear().await;
        self.scheduler.schedule_background_refresh();
    }

    /// Arms the background refresh timer, superseding any previous one.
    pub fn schedule_background_refresh(&self) {
        self.scheduler.schedule_background_refresh();
    }

    /// Runs one eager refresh pass on demand, off the timer.
    pub async fn refresh_authorization_cache(&self) {
        tracing::trace!("refresh_authorization_cache");
        self.cache.eager_refresh().await;
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}
