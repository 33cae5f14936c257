//! # Authorization Core (authz-core)
//!
//! Authorization decision engine with support for:
//! - Hierarchical resource rules with ancestor fallback
//! - Union and legacy priority role combination
//! - Delegation chains with a revocation short-circuit
//! - Versioned, TTL-bound caching with per-key single-flight resolution
//! - Self-re-arming background refresh
//! - Thread-safe concurrent access
//!
//! Resolution is fail-closed by construction: unmatched identities,
//! failed self checks and rejected credentials all degrade to deny,
//! never to allow.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use authz_core::{
//!     AccessRuleSet, AuthenticationToken, AuthorizationSession, CacheConfig,
//!     InMemoryCertificateStatusStore, InMemoryRoleStore, NoopPeerCache, Role, RoleMember,
//!     SimpleToken, TracingAuditSink,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let roles = Arc::new(InMemoryRoleStore::new());
//! roles.upsert_role(Role::new(
//!     "operators",
//!     [("/", false), ("/ca", true)].into_iter().collect::<AccessRuleSet>(),
//! ));
//! roles.add_member(RoleMember::new("cn:*", 100, "operators"));
//!
//! let session = AuthorizationSession::new(
//!     roles,
//!     Arc::new(InMemoryCertificateStatusStore::new()),
//!     Arc::new(NoopPeerCache),
//!     Arc::new(TracingAuditSink),
//!     Arc::new(CacheConfig::default()),
//! );
//! session.schedule_background_refresh();
//!
//! let alice = AuthenticationToken::simple(SimpleToken::new("cn:alice"));
//! assert!(session.is_authorized(&alice, &["/ca/issue"]).await?);
//! assert!(!session.is_authorized(&alice, &["/ra"]).await?);
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod error;
pub mod resolver;
pub mod rules;
pub mod scheduler;
pub mod session;
pub mod store;
pub mod token;

pub use cache::{AuthorizationCache, CacheConfig, CacheStats};
pub use error::{AuthzError, Result};
pub use resolver::{AuthorizationResult, ChainResolver, RoleResolver, RuleSetSource};
pub use rules::{has_access, intersection, union, AccessRuleSet};
pub use scheduler::RefreshScheduler;
pub use session::AuthorizationSession;
pub use store::{
    matches_pattern, AuditEvent, AuditOutcome, AuditRecord, AuditSink, CertificateStatus,
    CertificateStatusStore, CombinationMode, InMemoryCertificateStatusStore, InMemoryRoleStore,
    NoopPeerCache, PeerCacheHolder, Role, RoleMatch, RoleMember, RoleStore, TracingAuditSink,
};
pub use token::{AuthenticationToken, CertificateIdentifier, SimpleToken};
