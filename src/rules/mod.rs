//! Access rules over a hierarchical resource namespace.
//!
//! This module provides:
//! - `AccessRuleSet`, a path → allow/deny map with normalized keys
//! - Ancestor-based decision lookup (most specific explicit rule wins)
//! - Pure union/intersection algebra used to merge rule sets

mod combine;
mod matcher;
mod types;

pub use combine::{intersection, union};
pub use matcher::has_access;
pub use types::AccessRuleSet;
