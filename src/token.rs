//! Authentication token model
//!
//! Identities are presented to the engine as immutable tokens. A token is
//! either a plain credential or a composite one wrapping an ordered
//! delegation chain of further credentials, outermost first. Resolution
//! pattern-matches on the variant instead of downcasting.

use serde::{Deserialize, Serialize};

/// Issuer and serial number identifying a certificate in the status store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CertificateIdentifier {
    pub issuer: String,
    pub serial: String,
}

impl CertificateIdentifier {
    pub fn new(issuer: impl Into<String>, serial: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            serial: serial.into(),
        }
    }
}

/// A single, non-composite credential.
///
/// The `key` is the stable identity key used for cache lookup and equality.
/// A token with `universal_access` grants everything, but only while its
/// self match still succeeds; a token backed by a certificate carries the
/// issuer/serial pair used for revocation lookups.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SimpleToken {
    key: String,
    universal_access: bool,
    certificate: Option<CertificateIdentifier>,
    valid: bool,
}

impl SimpleToken {
    /// Creates an ordinary credential with the given identity key.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            universal_access: false,
            certificate: None,
            valid: true,
        }
    }

    /// Creates a universal-access marker credential.
    ///
    /// Such tokens bypass role matching entirely and resolve to a single
    /// root-level allow, provided their self match succeeds.
    pub fn universal(key: impl Into<String>) -> Self {
        Self {
            universal_access: true,
            ..Self::new(key)
        }
    }

    /// Attaches the certificate identifier backing this credential.
    pub fn with_certificate(mut self, certificate: CertificateIdentifier) -> Self {
        self.certificate = Some(certificate);
        self
    }

    /// Marks the credential as no longer matching the criteria it was
    /// issued under. Resolution treats such a token as unverifiable.
    pub fn invalidated(mut self) -> Self {
        self.valid = false;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_universal_access(&self) -> bool {
        self.universal_access
    }

    pub fn certificate(&self) -> Option<&CertificateIdentifier> {
        self.certificate.as_ref()
    }

    /// No-argument match of the token against itself.
    pub fn matches_self(&self) -> bool {
        self.valid
    }
}

/// An identity presented for an access decision.
///
/// `Composite` models delegation/proxying: the outer credential acts on
/// behalf of the chained ones, and its effective rights can never exceed
/// any link in the chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthenticationToken {
    Simple(SimpleToken),
    Composite {
        outer: SimpleToken,
        chain: Vec<SimpleToken>,
    },
}

impl AuthenticationToken {
    pub fn simple(token: SimpleToken) -> Self {
        AuthenticationToken::Simple(token)
    }

    /// Wraps `outer` around a delegation chain, outermost first.
    ///
    /// An empty chain degrades to a plain `Simple` token, keeping the
    /// invariant that a composite identity always has nested links.
    pub fn delegated(outer: SimpleToken, chain: Vec<SimpleToken>) -> Self {
        if chain.is_empty() {
            AuthenticationToken::Simple(outer)
        } else {
            AuthenticationToken::Composite { outer, chain }
        }
    }

    /// The outermost credential.
    pub fn outer(&self) -> &SimpleToken {
        match self {
            AuthenticationToken::Simple(token) => token,
            AuthenticationToken::Composite { outer, .. } => outer,
        }
    }

    /// The delegation chain, empty for plain tokens.
    pub fn nested(&self) -> &[SimpleToken] {
        match self {
            AuthenticationToken::Simple(_) => &[],
            AuthenticationToken::Composite { chain, .. } => chain,
        }
    }

    pub fn is_composite(&self) -> bool {
        matches!(self, AuthenticationToken::Composite { .. })
    }

    /// Stable key identifying the whole identity, chain included.
    ///
    /// Two delegations that differ anywhere in the chain must occupy
    /// distinct cache slots, so the chain keys are joined in order.
    pub fn cache_key(&self) -> String {
        match self {
            AuthenticationToken::Simple(token) => token.key.clone(),
            AuthenticationToken::Composite { outer, chain } => {
                let mut key = outer.key.clone();
                for link in chain {
                    key.push('|');
                    key.push_str(&link.key);
                }
                key
            }
        }
    }
}

impl From<SimpleToken> for AuthenticationToken {
    fn from(token: SimpleToken) -> Self {
        AuthenticationToken::Simple(token)
    }
}
