//! Error types for the authorization engine

use thiserror::Error;

/// Result type alias for authorization operations
pub type Result<T> = std::result::Result<T, AuthzError>;

/// Errors surfaced by authorization resolution.
///
/// A denied decision is never an error: denial is a normal `false` outcome.
/// Errors are `Clone` because a single in-flight cache computation may have
/// to deliver its failure to several concurrent waiters.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthzError {
    /// The identity itself could not be validated (bad signature, untrusted
    /// issuer, malformed criteria). Never cached.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The role store or certificate-status store is unreachable. Not
    /// retried here; callers are expected to fail closed.
    #[error("policy lookup unavailable: {0}")]
    PolicyLookupUnavailable(String),

    /// Generic internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for AuthzError {
    fn from(err: anyhow::Error) -> Self {
        AuthzError::Internal(err.to_string())
    }
}
