//! In-memory collaborator implementations
//!
//! DashMap-backed reference stores suitable for embedding and for tests.
//! The role store bumps its policy version on every mutation, exactly the
//! signal the cache uses to detect staleness.

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;

use super::pattern::matches_pattern;
use super::{
    AuditRecord, AuditSink, CertificateStatus, CertificateStatusStore, CombinationMode,
    PeerCacheHolder, Role, RoleMatch, RoleMember, RoleStore,
};
use crate::error::{AuthzError, Result};
use crate::token::SimpleToken;

/// Thread-safe in-memory role store.
///
/// # Examples
///
/// ```
/// use authz_core::{AccessRuleSet, InMemoryRoleStore, Role, RoleMember};
///
/// let store = InMemoryRoleStore::new();
/// store.upsert_role(Role::new(
///     "ca-admins",
///     [("/ca", true)].into_iter().collect::<AccessRuleSet>(),
/// ));
/// store.add_member(RoleMember::new("cn:*", 100, "ca-admins"));
/// ```
pub struct InMemoryRoleStore {
    roles: DashMap<String, Role>,
    members: DashMap<u64, RoleMember>,
    next_member_id: AtomicU64,
    version: AtomicU64,
    mode: RwLock<CombinationMode>,
}

impl InMemoryRoleStore {
    pub fn new() -> Self {
        Self {
            roles: DashMap::new(),
            members: DashMap::new(),
            next_member_id: AtomicU64::new(1),
            version: AtomicU64::new(1),
            mode: RwLock::new(CombinationMode::Union),
        }
    }

    /// Inserts or replaces a role, bumping the policy version.
    pub fn upsert_role(&self, role: Role) {
        self.roles.insert(role.name.clone(), role);
        self.bump();
    }

    /// Removes a role by name, bumping the policy version when present.
    pub fn remove_role(&self, name: &str) -> bool {
        let removed = self.roles.remove(name).is_some();
        if removed {
            self.bump();
        }
        removed
    }

    /// Adds a role member and returns its id, bumping the policy version.
    pub fn add_member(&self, member: RoleMember) -> u64 {
        let id = self.next_member_id.fetch_add(1, Ordering::Relaxed);
        self.members.insert(id, member);
        self.bump();
        id
    }

    /// Removes a member by id, bumping the policy version when present.
    pub fn remove_member(&self, id: u64) -> bool {
        let removed = self.members.remove(&id).is_some();
        if removed {
            self.bump();
        }
        removed
    }

    /// Flips the persistent migration marker selecting the combination
    /// algorithm. Counts as a policy mutation.
    pub fn set_combination_mode(&self, mode: CombinationMode) {
        *self.mode.write().expect("combination mode lock poisoned") = mode;
        self.bump();
    }

    fn bump(&self) {
        self.version.fetch_add(1, Ordering::SeqCst);
    }
}

impl Default for InMemoryRoleStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RoleStore for InMemoryRoleStore {
    async fn policy_version(&self) -> Result<u64> {
        Ok(self.version.load(Ordering::SeqCst))
    }

    async fn find_matches(&self, token: &SimpleToken) -> Result<Vec<RoleMatch>> {
        if !token.matches_self() {
            return Err(AuthzError::AuthenticationFailed(format!(
                "token '{}' no longer matches its issuing criteria",
                token.key()
            )));
        }
        let mut matches = Vec::new();
        for member in self.members.iter() {
            if !matches_pattern(token.key(), &member.pattern) {
                continue;
            }
            if let Some(role) = self.roles.get(&member.role) {
                matches.push(RoleMatch {
                    role: role.clone(),
                    weight: member.weight,
                });
            }
        }
        Ok(matches)
    }

    async fn combination_mode(&self) -> Result<CombinationMode> {
        Ok(*self.mode.read().expect("combination mode lock poisoned"))
    }
}

/// In-memory certificate status store keyed by issuer and serial.
pub struct InMemoryCertificateStatusStore {
    statuses: DashMap<(String, String), CertificateStatus>,
}

impl InMemoryCertificateStatusStore {
    pub fn new() -> Self {
        Self {
            statuses: DashMap::new(),
        }
    }

    pub fn set_status(&self, issuer: &str, serial: &str, status: CertificateStatus) {
        self.statuses
            .insert((issuer.to_string(), serial.to_string()), status);
    }

    pub fn remove(&self, issuer: &str, serial: &str) -> bool {
        self.statuses
            .remove(&(issuer.to_string(), serial.to_string()))
            .is_some()
    }
}

impl Default for InMemoryCertificateStatusStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CertificateStatusStore for InMemoryCertificateStatusStore {
    async fn status_of(&self, issuer: &str, serial: &str) -> Result<Option<CertificateStatus>> {
        Ok(self
            .statuses
            .get(&(issuer.to_string(), serial.to_string()))
            .map(|status| *status))
    }
}

/// Peer cache holder for single-node deployments; invalidation fans out to
/// nobody.
pub struct NoopPeerCache;

#[async_trait]
impl PeerCacheHolder for NoopPeerCache {
    async fn clear(&self) {}
}

/// Audit sink that emits records as tracing events.
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, record: AuditRecord) {
        match record.outcome {
            super::AuditOutcome::Success => tracing::info!(
                event = ?record.event,
                subject = %record.subject,
                details = %record.details,
                "audit"
            ),
            super::AuditOutcome::Failure => tracing::warn!(
                event = ?record.event,
                subject = %record.subject,
                details = %record.details,
                "audit"
            ),
        }
    }
}
