//! External collaborator boundary.
//!
//! The engine consumes roles, certificate statuses, peer caches and the
//! audit sink only through the narrow traits defined here. Persistence,
//! transactions and wire protocols belong to the implementations.

mod memory;
mod pattern;

pub use memory::{
    InMemoryCertificateStatusStore, InMemoryRoleStore, NoopPeerCache, TracingAuditSink,
};
pub use pattern::matches_pattern;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::rules::AccessRuleSet;
use crate::token::SimpleToken;

/// A named policy object owning a set of access rules.
///
/// Roles are created and edited by an external administrative process; the
/// engine only reads them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub name: String,
    pub rules: AccessRuleSet,
}

impl Role {
    pub fn new(name: impl Into<String>, rules: AccessRuleSet) -> Self {
        Self {
            name: name.into(),
            rules,
        }
    }
}

/// A matching predicate binding identity-key criteria to a role.
///
/// `weight` orders members for the legacy priority combination algorithm;
/// higher weight means higher priority. Union mode ignores it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleMember {
    pub pattern: String,
    pub weight: u32,
    pub role: String,
}

impl RoleMember {
    pub fn new(pattern: impl Into<String>, weight: u32, role: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            weight,
            role: role.into(),
        }
    }
}

/// One role matched for an identity, with the weight of the member that
/// matched it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleMatch {
    pub role: Role,
    pub weight: u32,
}

/// Which multi-role combination algorithm is in force.
///
/// A process-wide, persistent migration marker owned by the role store;
/// the two modes are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombinationMode {
    /// Combine the rules of every matched role by union.
    Union,
    /// Legacy: intersect the rules of the highest-weight matches only.
    Priority,
}

/// Status of a certificate as recorded in the status store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CertificateStatus {
    Active,
    /// Still active, holder already notified about upcoming expiration.
    NotifiedAboutExpiration,
    Revoked,
    Expired,
}

impl CertificateStatus {
    /// Whether a credential backed by a certificate in this status may
    /// still be used to act on behalf of others.
    pub fn permits_use(self) -> bool {
        matches!(
            self,
            CertificateStatus::Active | CertificateStatus::NotifiedAboutExpiration
        )
    }
}

/// Store of roles and role members, owner of the policy version counter.
#[async_trait]
pub trait RoleStore: Send + Sync {
    /// Monotonically increasing counter, bumped on any role or member
    /// mutation. Never decreases.
    async fn policy_version(&self) -> Result<u64>;

    /// The roles whose membership criteria match `token`, each with the
    /// weight of the matching member.
    ///
    /// Fails with [`AuthzError::AuthenticationFailed`] when the identity
    /// cannot be validated against current criteria.
    ///
    /// [`AuthzError::AuthenticationFailed`]: crate::AuthzError::AuthenticationFailed
    async fn find_matches(&self, token: &SimpleToken) -> Result<Vec<RoleMatch>>;

    /// The combination algorithm currently in force.
    async fn combination_mode(&self) -> Result<CombinationMode>;
}

/// Revocation/validity lookup for certificate-backed credentials.
#[async_trait]
pub trait CertificateStatusStore: Send + Sync {
    /// The recorded status of the certificate, or `None` when the
    /// certificate is unknown to the store.
    async fn status_of(&self, issuer: &str, serial: &str) -> Result<Option<CertificateStatus>>;
}

/// Holder of the secondary caches kept by remote nodes.
#[async_trait]
pub trait PeerCacheHolder: Send + Sync {
    /// Best-effort fan-out invalidation; no acknowledgement required.
    async fn clear(&self);
}

/// Event category of an audit record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditEvent {
    AccessControl,
    Authentication,
}

/// Outcome of the audited operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditOutcome {
    Success,
    Failure,
}

/// A structured record of an access-control or authentication outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub event: AuditEvent,
    pub outcome: AuditOutcome,
    /// Identity key of the subject the record concerns.
    pub subject: String,
    pub details: serde_json::Value,
}

/// Sink for audit records. Consulted by the access-check surface, never by
/// the cache itself.
pub trait AuditSink: Send + Sync {
    fn record(&self, record: AuditRecord);
}
