//! Versioned, TTL-bound authorization cache.
//!
//! Maps identity keys to resolved rule sets with:
//! - Version-tagged entries, recomputed when the policy version moves on
//! - At most one concurrent computation per identity key
//! - Opportunistic eviction of entries unused past the refresh interval
//! - Hit/miss statistics for monitoring

mod store;
mod types;

pub use store::AuthorizationCache;
pub use types::{CacheConfig, CacheStats};
